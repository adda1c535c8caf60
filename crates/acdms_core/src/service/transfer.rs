//! Bulk import/export of Agniveer records.
//!
//! # Responsibility
//! - Convert tabular rows (header -> cell) into records and insert them
//!   through the validated Add flow.
//! - Serialize the stored record set for download/backup as `.xlsx`,
//!   `.csv` or JSON.
//!
//! # Invariants
//! - Every imported row is validated before insertion.
//! - One failing row never aborts the remaining rows; it is logged and
//!   reported in `ImportReport::failures`.
//! - Headers outside the field whitelist are ignored.

use crate::model::agniveer::AgniveerRecord;
use crate::repo::agniveer_repo::AgniveerRepository;
use crate::service::agniveer_service::{AgniveerService, ServiceError};
use crate::service::sheet::{read_rows_csv, read_rows_xlsx, write_csv, write_xlsx};
use log::{info, warn};
use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::{Read, Write};
use std::path::Path;

/// One spreadsheet-style row keyed by column header.
pub type ImportRow = BTreeMap<String, String>;

/// Bulk transfer error.
#[derive(Debug)]
pub enum TransferError {
    /// Import input contains no data rows.
    NoRows,
    /// Export requested while the store holds no records.
    NoRecords,
    /// Input row is not a flat object of scalar cells.
    InvalidRow { row: usize, message: String },
    /// Format name or file extension is not `xlsx`, `csv` or `json`.
    UnsupportedFormat(String),
    Json(serde_json::Error),
    Csv(csv::Error),
    /// Upload is not a readable `.xlsx` workbook.
    SheetRead(calamine::XlsxError),
    SheetWrite(rust_xlsxwriter::XlsxError),
    Io(std::io::Error),
    Service(ServiceError),
}

impl Display for TransferError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoRows => write!(f, "No data found in the file"),
            Self::NoRecords => write!(f, "No data to export"),
            Self::InvalidRow { row, message } => write!(f, "invalid row {row}: {message}"),
            Self::UnsupportedFormat(format) => {
                write!(f, "Unsupported format `{format}`. Use xlsx, csv or json.")
            }
            Self::Json(err) => write!(f, "invalid JSON: {err}"),
            Self::Csv(err) => write!(f, "invalid CSV: {err}"),
            Self::SheetRead(err) => write!(
                f,
                "Could not read file. Please ensure it is a valid Excel or CSV file. ({err})"
            ),
            Self::SheetWrite(err) => write!(f, "failed to build workbook: {err}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::Service(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::Csv(err) => Some(err),
            Self::SheetRead(err) => Some(err),
            Self::SheetWrite(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Service(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for TransferError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<csv::Error> for TransferError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<calamine::XlsxError> for TransferError {
    fn from(value: calamine::XlsxError) -> Self {
        Self::SheetRead(value)
    }
}

impl From<rust_xlsxwriter::XlsxError> for TransferError {
    fn from(value: rust_xlsxwriter::XlsxError) -> Self {
        Self::SheetWrite(value)
    }
}

impl From<std::io::Error> for TransferError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ServiceError> for TransferError {
    fn from(value: ServiceError) -> Self {
        Self::Service(value)
    }
}

/// File format for bulk transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferFormat {
    Xlsx,
    Csv,
    Json,
}

impl TransferFormat {
    /// Parses a format name such as `xlsx` or `.CSV`.
    pub fn parse(value: &str) -> Result<Self, TransferError> {
        match value.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "xlsx" => Ok(Self::Xlsx),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(TransferError::UnsupportedFormat(value.to_string())),
        }
    }

    /// Picks the format from a file name's extension.
    pub fn from_path(path: &Path) -> Result<Self, TransferError> {
        let extension = path
            .extension()
            .and_then(|extension| extension.to_str())
            .unwrap_or_default();
        Self::parse(extension)
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Csv => "text/csv; charset=utf-8",
            Self::Json => "application/json",
        }
    }
}

/// One rejected import row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportFailure {
    /// 1-based data row number.
    pub row: usize,
    pub message: String,
}

/// Outcome of a bulk import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub total: usize,
    pub imported: usize,
    pub failures: Vec<ImportFailure>,
}

impl ImportReport {
    /// User-facing summary line.
    pub fn summary(&self) -> String {
        format!(
            "Imported {} out of {} records successfully.",
            self.imported, self.total
        )
    }
}

/// Decodes an uploaded file into import rows.
pub fn read_rows(format: TransferFormat, bytes: &[u8]) -> Result<Vec<ImportRow>, TransferError> {
    match format {
        TransferFormat::Xlsx => read_rows_xlsx(bytes),
        TransferFormat::Csv => read_rows_csv(bytes),
        TransferFormat::Json => read_rows_json(bytes),
    }
}

/// Parses a JSON array of flat objects into import rows.
///
/// String cells are kept verbatim; numbers and booleans are stringified;
/// `null` cells are dropped.
pub fn read_rows_json(reader: impl Read) -> Result<Vec<ImportRow>, TransferError> {
    let document: Value = serde_json::from_reader(reader)?;
    let Value::Array(items) = document else {
        return Err(TransferError::InvalidRow {
            row: 0,
            message: "expected a JSON array of rows".to_string(),
        });
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| parse_row(index + 1, item))
        .collect()
}

fn parse_row(row: usize, item: Value) -> Result<ImportRow, TransferError> {
    let Value::Object(cells) = item else {
        return Err(TransferError::InvalidRow {
            row,
            message: "expected an object of column -> cell".to_string(),
        });
    };

    let mut parsed = ImportRow::new();
    for (header, cell) in cells {
        let text = match cell {
            Value::Null => continue,
            Value::String(text) => text,
            Value::Number(number) => number.to_string(),
            Value::Bool(flag) => flag.to_string(),
            Value::Array(_) | Value::Object(_) => {
                return Err(TransferError::InvalidRow {
                    row,
                    message: format!("column `{header}` holds a nested value"),
                });
            }
        };
        parsed.insert(header, text);
    }
    Ok(parsed)
}

/// Imports rows through the validated Add flow.
///
/// # Errors
/// - `TransferError::NoRows` when `rows` is empty. Per-row failures are
///   reported in the returned `ImportReport` instead.
pub fn import_rows<R: AgniveerRepository>(
    service: &AgniveerService<R>,
    rows: &[ImportRow],
) -> Result<ImportReport, TransferError> {
    if rows.is_empty() {
        return Err(TransferError::NoRows);
    }

    let mut report = ImportReport {
        total: rows.len(),
        ..ImportReport::default()
    };

    for (index, row) in rows.iter().enumerate() {
        let row_number = index + 1;
        let (record, ignored) =
            AgniveerRecord::from_fields(row.iter().map(|(key, value)| (key, value.clone())));
        if !ignored.is_empty() {
            info!(
                "event=agniveer_import_row module=transfer status=ok row={} ignored_columns={}",
                row_number,
                ignored.len()
            );
        }

        match service.add(&record) {
            Ok(_) => report.imported += 1,
            Err(err) => {
                warn!(
                    "event=agniveer_import_row module=transfer status=error row={} error={}",
                    row_number, err
                );
                report.failures.push(ImportFailure {
                    row: row_number,
                    message: err.to_string(),
                });
            }
        }
    }

    info!(
        "event=agniveer_import module=transfer status=ok total={} imported={}",
        report.total, report.imported
    );
    Ok(report)
}

/// Writes `records` as a pretty-printed JSON array. Returns the record count.
pub fn export_json(
    mut writer: impl Write,
    records: &[AgniveerRecord],
) -> Result<usize, TransferError> {
    if records.is_empty() {
        return Err(TransferError::NoRecords);
    }

    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(records.len())
}

/// Writes `records` in `format`. Returns the record count.
pub fn export_records(
    format: TransferFormat,
    mut writer: impl Write,
    records: &[AgniveerRecord],
) -> Result<usize, TransferError> {
    match format {
        TransferFormat::Json => export_json(writer, records),
        TransferFormat::Csv => write_csv(writer, records),
        TransferFormat::Xlsx => {
            let workbook = write_xlsx(records)?;
            writer.write_all(&workbook)?;
            writer.flush()?;
            Ok(records.len())
        }
    }
}

/// Exports every stored record in `format`.
pub fn export_all<R: AgniveerRepository>(
    service: &AgniveerService<R>,
    format: TransferFormat,
    writer: impl Write,
) -> Result<usize, TransferError> {
    let records = service.list()?;
    let exported = export_records(format, writer, &records)?;
    info!(
        "event=agniveer_export module=transfer status=ok format={} exported={exported}",
        format.extension()
    );
    Ok(exported)
}

/// Download name such as `agniveers_2024-06-01T10-15-00.xlsx`.
pub fn export_file_name(format: TransferFormat, at: DateTime<Local>) -> String {
    format!(
        "agniveers_{}.{}",
        at.format("%Y-%m-%dT%H-%M-%S"),
        format.extension()
    )
}
