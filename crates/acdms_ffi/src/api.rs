//! FFI use-case API for the desktop shell.
//!
//! # Responsibility
//! - Expose stable, use-case-level record functions to Dart via FRB.
//! - Translate core errors into flat response envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every write goes through `AgniveerService`, so validation always runs.
//! - Record attributes cross the boundary as `field name -> text` maps
//!   keyed by the whitelist names.

use acdms_core::config::{CONFIG_PATH_ENV, DB_PATH_ENV};
use acdms_core::db::open_db;
use acdms_core::model::validation::REQUIRED_FIELDS;
use acdms_core::{
    core_version as core_version_inner, export_file_name, export_json, export_records,
    import_rows, init_logging as init_logging_inner, page_suggestion, ping as ping_inner,
    read_rows, read_rows_json, AgniveerField, AgniveerId, AgniveerRecord, AgniveerService,
    AppConfig, Authenticator, ChatAssistant, ImportRow, Page, SearchFilter, ServiceError,
    SqliteAgniveerRepository, TransferFormat, ValidationErrors,
};
use chrono::Local;
use log::warn;
use rusqlite::Connection;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

const DESKTOP_DB_FILE_NAME: &str = "acdms_agniveers.sqlite3";
static DESKTOP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Idempotent for the same `level + log_dir`; a different pair is an error.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// One field-level problem reported to the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMessage {
    /// Whitelisted field name.
    pub field: String,
    pub message: String,
}

/// Static description of one form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub label: String,
    /// Section heading the field is rendered under.
    pub section: String,
    pub required: bool,
}

/// Stored record as seen by the desktop shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgniveerRow {
    pub id: i64,
    /// Populated attributes only.
    pub fields: HashMap<String, String>,
}

/// Result of a write or validation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordActionResponse {
    pub ok: bool,
    /// Affected record identity, when known.
    pub id: Option<i64>,
    pub message: String,
    /// Per-field validation failures, in column order.
    pub errors: Vec<FieldMessage>,
}

impl RecordActionResponse {
    fn success(message: impl Into<String>, id: Option<AgniveerId>) -> Self {
        Self {
            ok: true,
            id,
            message: message.into(),
            errors: Vec::new(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: None,
            message: message.into(),
            errors: Vec::new(),
        }
    }

    fn invalid(errors: ValidationErrors) -> Self {
        Self {
            ok: false,
            id: None,
            message: "Please correct the errors in the form".to_string(),
            errors: field_messages(&errors),
        }
    }
}

/// Result of a read call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordListResponse {
    pub ok: bool,
    pub rows: Vec<AgniveerRow>,
    pub message: String,
}

impl RecordListResponse {
    fn from_records(records: Vec<AgniveerRecord>) -> Self {
        let rows = records.iter().filter_map(to_row).collect::<Vec<_>>();
        let message = if rows.is_empty() {
            "No records found.".to_string()
        } else {
            format!("Found {} record(s).", rows.len())
        };
        Self {
            ok: true,
            rows,
            message,
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            rows: Vec::new(),
            message: message.into(),
        }
    }
}

/// Result of a bulk import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportResponse {
    pub ok: bool,
    pub total: u32,
    pub imported: u32,
    pub message: String,
    /// One line per rejected row: `row N: reason`.
    pub failures: Vec<String>,
}

/// Result of a bulk export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResponse {
    pub ok: bool,
    /// Pretty-printed JSON array; empty on failure.
    pub json: String,
    pub message: String,
}

/// Result of a spreadsheet export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFileResponse {
    pub ok: bool,
    /// File content; empty on failure.
    pub bytes: Vec<u8>,
    /// Suggested download name, e.g. `agniveers_2024-06-01T10-15-00.xlsx`.
    pub file_name: String,
    pub message: String,
}

/// Lists every form field in column order.
#[flutter_rust_bridge::frb(sync)]
pub fn agniveer_fields() -> Vec<FieldDescriptor> {
    AgniveerField::ALL
        .iter()
        .map(|field| FieldDescriptor {
            name: field.as_str().to_string(),
            label: field.label().to_string(),
            section: field.section().title().to_string(),
            required: REQUIRED_FIELDS.contains(field),
        })
        .collect()
}

/// Runs the field validator without writing.
///
/// # FFI contract
/// - Sync call, pure.
/// - `ok=false` with per-field `errors` when any rule fails.
#[flutter_rust_bridge::frb(sync)]
pub fn agniveer_validate(fields: HashMap<String, String>) -> RecordActionResponse {
    let record = to_record(fields);
    match acdms_core::validate_agniveer(&record).into_result() {
        Ok(()) => RecordActionResponse::success("Record is valid.", None),
        Err(errors) => RecordActionResponse::invalid(errors),
    }
}

/// Adds a record through the validated Add flow.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
/// - Returns the created identity on success.
#[flutter_rust_bridge::frb(sync)]
pub fn agniveer_add(fields: HashMap<String, String>) -> RecordActionResponse {
    let record = to_record(fields);
    match with_service(|service| service.add(&record)) {
        Ok(id) => RecordActionResponse::success("Agniveer data submitted successfully!", Some(id)),
        Err(err) => action_failure("agniveer_add", err),
    }
}

/// Applies a partial update; fields absent from `fields` keep their value.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - The merged record must pass validation.
#[flutter_rust_bridge::frb(sync)]
pub fn agniveer_update(id: i64, fields: HashMap<String, String>) -> RecordActionResponse {
    let patch = to_record(fields);
    match with_service(|service| service.edit(id, &patch)) {
        Ok(_) => RecordActionResponse::success("Agniveer updated successfully", Some(id)),
        Err(err) => action_failure("agniveer_update", err),
    }
}

/// Permanently deletes one record.
#[flutter_rust_bridge::frb(sync)]
pub fn agniveer_delete(id: i64) -> RecordActionResponse {
    match with_service(|service| service.remove(id)) {
        Ok(()) => RecordActionResponse::success("Agniveer deleted successfully", Some(id)),
        Err(err) => action_failure("agniveer_delete", err),
    }
}

/// Loads one record; `rows` is empty when the identity is unknown.
#[flutter_rust_bridge::frb(sync)]
pub fn agniveer_get(id: i64) -> RecordListResponse {
    match with_service(|service| service.get(id)) {
        Ok(record) => RecordListResponse::from_records(record.into_iter().collect()),
        Err(err) => list_failure("agniveer_get", err),
    }
}

/// Lists every stored record ordered by identity.
#[flutter_rust_bridge::frb(sync)]
pub fn agniveer_list() -> RecordListResponse {
    match with_service(|service| service.list()) {
        Ok(records) => RecordListResponse::from_records(records),
        Err(err) => list_failure("agniveer_list", err),
    }
}

/// Store-backed substring search.
///
/// # FFI contract
/// - Blank values are ignored; an all-blank filter lists everything.
/// - Unknown field names fail the call without querying.
#[flutter_rust_bridge::frb(sync)]
pub fn agniveer_search(filter: HashMap<String, String>) -> RecordListResponse {
    let filter = match SearchFilter::from_pairs(&filter) {
        Ok(filter) => filter,
        Err(err) => return RecordListResponse::failure(err.to_string()),
    };
    match with_service(|service| service.search(&filter)) {
        Ok(records) => RecordListResponse::from_records(records),
        Err(err) => list_failure("agniveer_search", err),
    }
}

/// Imports a JSON array of `header -> cell` objects.
///
/// # FFI contract
/// - Rows failing validation are skipped and listed in `failures`.
#[flutter_rust_bridge::frb(sync)]
pub fn agniveer_import_json(json: String) -> ImportResponse {
    import_response(read_rows_json(json.as_bytes()).map_err(|err| err.to_string()))
}

/// Imports an uploaded `.xlsx`, `.csv` or `.json` file.
///
/// `format` is the file extension, with or without the leading dot.
#[flutter_rust_bridge::frb(sync)]
pub fn agniveer_import_file(bytes: Vec<u8>, format: String) -> ImportResponse {
    import_response(
        TransferFormat::parse(&format)
            .and_then(|format| read_rows(format, &bytes))
            .map_err(|err| err.to_string()),
    )
}

fn import_response(rows: Result<Vec<ImportRow>, String>) -> ImportResponse {
    let outcome = rows.and_then(|rows| {
        with_connection(|conn| {
            let service = AgniveerService::new(SqliteAgniveerRepository::new(conn));
            import_rows(&service, &rows).map_err(|err| err.to_string())
        })
    });

    match outcome {
        Ok(report) => ImportResponse {
            ok: true,
            total: saturating_u32(report.total),
            imported: saturating_u32(report.imported),
            message: report.summary(),
            failures: report
                .failures
                .iter()
                .map(|failure| format!("row {}: {}", failure.row, failure.message))
                .collect(),
        },
        Err(message) => ImportResponse {
            ok: false,
            total: 0,
            imported: 0,
            message,
            failures: Vec::new(),
        },
    }
}

/// Exports every stored record as a JSON document.
#[flutter_rust_bridge::frb(sync)]
pub fn agniveer_export_json() -> ExportResponse {
    let outcome = with_service(|service| service.list())
        .map_err(|err| err.to_string())
        .and_then(|records| {
            let mut buffer = Vec::new();
            let count = export_json(&mut buffer, &records).map_err(|err| err.to_string())?;
            let json = String::from_utf8(buffer).map_err(|err| err.to_string())?;
            Ok((count, json))
        });

    match outcome {
        Ok((count, json)) => ExportResponse {
            ok: true,
            json,
            message: format!("Exported {count} record(s)."),
        },
        Err(message) => ExportResponse {
            ok: false,
            json: String::new(),
            message,
        },
    }
}

/// Exports every stored record as `.xlsx`, `.csv` or `.json`.
#[flutter_rust_bridge::frb(sync)]
pub fn agniveer_export_file(format: String) -> ExportFileResponse {
    let outcome = TransferFormat::parse(&format)
        .map_err(|err| err.to_string())
        .and_then(|format| {
            let records = with_service(|service| service.list()).map_err(|err| err.to_string())?;
            let mut bytes = Vec::new();
            let count =
                export_records(format, &mut bytes, &records).map_err(|err| err.to_string())?;
            Ok((count, bytes, export_file_name(format, Local::now())))
        });

    match outcome {
        Ok((count, bytes, file_name)) => ExportFileResponse {
            ok: true,
            bytes,
            file_name,
            message: format!("Exported {count} record(s)."),
        },
        Err(message) => ExportFileResponse {
            ok: false,
            bytes: Vec::new(),
            file_name: String::new(),
            message,
        },
    }
}

/// Checks the administrator credentials.
///
/// Returns empty string when granted and a user-facing message otherwise.
#[flutter_rust_bridge::frb(sync)]
pub fn authenticate(username: String, password: String) -> String {
    check_credentials(&desktop_config().auth.authenticator(), &username, &password)
}

fn check_credentials(authenticator: &dyn Authenticator, username: &str, password: &str) -> String {
    if authenticator.authenticate(username, password).is_granted() {
        String::new()
    } else {
        "Invalid credentials. Please try again.".to_string()
    }
}

/// Offline assistant reply.
#[flutter_rust_bridge::frb(sync)]
pub fn chat_reply(message: String) -> String {
    ChatAssistant::new().reply(&message).to_string()
}

/// Assistant hint for one page (`home|add|search|manage|login`).
///
/// Unknown page names fall back to the login hint.
#[flutter_rust_bridge::frb(sync)]
pub fn chat_page_hint(page: String) -> String {
    page_suggestion(Page::parse(&page).unwrap_or(Page::Login)).to_string()
}

fn to_record(fields: HashMap<String, String>) -> AgniveerRecord {
    let (record, ignored) = AgniveerRecord::from_fields(fields);
    if !ignored.is_empty() {
        warn!(
            "event=ffi_unknown_fields module=ffi status=ok ignored={}",
            ignored.len()
        );
    }
    record
}

fn to_row(record: &AgniveerRecord) -> Option<AgniveerRow> {
    Some(AgniveerRow {
        id: record.id?,
        fields: record
            .fields()
            .map(|(field, value)| (field.as_str().to_string(), value.to_string()))
            .collect(),
    })
}

fn field_messages(errors: &ValidationErrors) -> Vec<FieldMessage> {
    errors
        .iter()
        .map(|(field, message)| FieldMessage {
            field: field.as_str().to_string(),
            message: message.to_string(),
        })
        .collect()
}

fn action_failure(operation: &str, err: CallError) -> RecordActionResponse {
    match err {
        CallError::Service(ServiceError::Validation(errors)) => {
            RecordActionResponse::invalid(errors)
        }
        CallError::Service(ServiceError::NotFound(id)) => {
            RecordActionResponse::failure(format!("Agniveer not found: {id}"))
        }
        other => RecordActionResponse::failure(format!("{operation} failed: {other}")),
    }
}

fn list_failure(operation: &str, err: CallError) -> RecordListResponse {
    RecordListResponse::failure(format!("{operation} failed: {err}"))
}

fn saturating_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Failure opening the desktop store or running a use case.
enum CallError {
    Open(String),
    Service(ServiceError),
}

impl std::fmt::Display for CallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open(message) => f.write_str(message),
            Self::Service(err) => write!(f, "{err}"),
        }
    }
}

fn desktop_config() -> &'static AppConfig {
    DESKTOP_CONFIG.get_or_init(|| {
        let config_path = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        load_desktop_config(config_path.as_deref())
    })
}

/// Loads `config_path`, falling back to defaults with a warning.
///
/// Without a config file or `ACDMS_DB_PATH` the store lives in the temp dir.
fn load_desktop_config(config_path: Option<&Path>) -> AppConfig {
    let db_overridden = std::env::var(DB_PATH_ENV).is_ok_and(|raw| !raw.trim().is_empty());
    let mut config = AppConfig::load(config_path).unwrap_or_else(|err| {
        warn!("event=ffi_config_load module=ffi status=error error={err}");
        AppConfig::load(None).unwrap_or_default()
    });
    if config_path.is_none() && !db_overridden {
        config.db.path = std::env::temp_dir().join(DESKTOP_DB_FILE_NAME);
    }
    config
}

fn resolve_desktop_db_path() -> &'static Path {
    desktop_config().db.path.as_path()
}

fn with_connection<T>(
    f: impl FnOnce(&Connection) -> Result<T, String>,
) -> Result<T, String> {
    let conn = open_db(resolve_desktop_db_path())
        .map_err(|err| format!("desktop DB open failed: {err}"))?;
    f(&conn)
}

fn with_service<T>(
    f: impl FnOnce(&AgniveerService<SqliteAgniveerRepository<'_>>) -> Result<T, ServiceError>,
) -> Result<T, CallError> {
    let conn = open_db(resolve_desktop_db_path())
        .map_err(|err| CallError::Open(format!("desktop DB open failed: {err}")))?;
    let service = AgniveerService::new(SqliteAgniveerRepository::new(&conn));
    f(&service).map_err(CallError::Service)
}
