//! Spreadsheet codecs for bulk transfer.
//!
//! # Responsibility
//! - Read the first worksheet of an `.xlsx` workbook, or a `.csv` file,
//!   into header-keyed `ImportRow`s.
//! - Write records as a sheet whose header row is `id` plus the
//!   whitelisted column names, so an export imports back unchanged.
//!
//! # Invariants
//! - The first row is the header row; headers are trimmed.
//! - Empty cells are dropped and fully empty rows are skipped.
//! - Numeric cells are stringified without a trailing `.0`, so PIN and
//!   Aadhar numbers typed as numbers keep their digits.

use crate::model::agniveer::{AgniveerField, AgniveerRecord};
use crate::service::transfer::{ImportRow, TransferError};
use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use log::warn;
use rust_xlsxwriter::{Format, Workbook};
use std::io::{Cursor, Read, Write};

/// Worksheet name used for exports.
pub const SHEET_NAME: &str = "Agniveers";

const ID_HEADER: &str = "id";

/// Header row written by exports.
pub fn export_headers() -> impl Iterator<Item = &'static str> {
    std::iter::once(ID_HEADER).chain(AgniveerField::ALL.iter().map(|field| field.as_str()))
}

/// Reads a CSV document with a header row.
pub fn read_rows_csv(reader: impl Read) -> Result<Vec<ImportRow>, TransferError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);
    let headers = reader
        .headers()?
        .iter()
        .map(|header| header.trim_start_matches('\u{feff}').trim().to_string())
        .collect::<Vec<_>>();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row = collect_row(
            headers
                .iter()
                .zip(record.iter())
                .map(|(header, cell)| (header.as_str(), Some(cell.to_string()))),
        );
        if !row.is_empty() {
            rows.push(row);
        }
    }
    Ok(rows)
}

/// Reads the first worksheet of an `.xlsx` workbook.
///
/// A workbook without worksheets yields no rows.
pub fn read_rows_xlsx(bytes: &[u8]) -> Result<Vec<ImportRow>, TransferError> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes.to_vec()))?;
    let Some(range) = workbook.worksheet_range_at(0) else {
        return Ok(Vec::new());
    };
    let range = range?;

    let mut sheet_rows = range.rows();
    let Some(header_cells) = sheet_rows.next() else {
        return Ok(Vec::new());
    };
    let headers = header_cells
        .iter()
        .map(|cell| cell_text(cell).map(|text| text.trim().to_string()).unwrap_or_default())
        .collect::<Vec<_>>();

    let mut rows = Vec::new();
    for cells in sheet_rows {
        let row = collect_row(
            headers
                .iter()
                .zip(cells.iter())
                .map(|(header, cell)| (header.as_str(), cell_text(cell))),
        );
        if !row.is_empty() {
            rows.push(row);
        }
    }
    Ok(rows)
}

/// Writes `records` as CSV. Returns the record count.
pub fn write_csv(writer: impl Write, records: &[AgniveerRecord]) -> Result<usize, TransferError> {
    if records.is_empty() {
        return Err(TransferError::NoRecords);
    }

    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(export_headers())?;
    for record in records {
        let id = record.id.map(|id| id.to_string()).unwrap_or_default();
        let cells = std::iter::once(id.as_str()).chain(
            AgniveerField::ALL
                .iter()
                .map(|field| record.get(*field).unwrap_or_default()),
        );
        writer.write_record(cells)?;
    }
    writer.flush()?;
    Ok(records.len())
}

/// Builds an `.xlsx` workbook with one `Agniveers` sheet.
pub fn write_xlsx(records: &[AgniveerRecord]) -> Result<Vec<u8>, TransferError> {
    if records.is_empty() {
        return Err(TransferError::NoRecords);
    }

    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, header) in (0u16..).zip(export_headers()) {
        worksheet.write_string_with_format(0, col, header, &bold)?;
    }
    for (row, record) in (1u32..).zip(records) {
        if let Some(id) = record.id {
            worksheet.write_string(row, 0, &id.to_string())?;
        }
        for (col, field) in (1u16..).zip(AgniveerField::ALL.iter()) {
            if let Some(value) = record.get(*field) {
                worksheet.write_string(row, col, value)?;
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

fn collect_row<'a>(cells: impl Iterator<Item = (&'a str, Option<String>)>) -> ImportRow {
    cells
        .filter(|(header, _)| !header.is_empty())
        .filter_map(|(header, cell)| {
            cell.filter(|text| !text.trim().is_empty())
                .map(|text| (header.to_string(), text))
        })
        .collect()
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(text) => Some(text.clone()),
        Data::Int(value) => Some(value.to_string()),
        Data::Float(value) => Some(value.to_string()),
        Data::Bool(flag) => Some(flag.to_string()),
        Data::DateTime(value) => Some(
            value
                .as_datetime()
                .map(|timestamp| timestamp.date().format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| value.as_f64().to_string()),
        ),
        Data::DateTimeIso(text) => Some(text.split('T').next().unwrap_or(text).to_string()),
        Data::DurationIso(text) => Some(text.clone()),
        Data::Error(err) => {
            warn!("event=agniveer_import_cell module=transfer status=error error={err}");
            None
        }
    }
}
