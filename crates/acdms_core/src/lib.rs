//! Core domain logic for the Agniveer Centralised Data Management System.
//! This crate is the single source of truth for record invariants shared by
//! the desktop bridge and the local web server.

pub mod auth;
pub mod chat;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;
pub mod session;

pub use auth::{AuthOutcome, Authenticator, FixedCredentialAuthenticator};
pub use chat::{page_suggestion, ChatAssistant};
pub use config::{AppConfig, ConfigError};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::agniveer::{AgniveerField, AgniveerId, AgniveerRecord, FieldSection};
pub use model::validation::{validate_agniveer, validate_agniveer_at, ValidationErrors};
pub use repo::agniveer_repo::{
    AgniveerRepository, RepoError, RepoResult, SqliteAgniveerRepository,
};
pub use search::filter::{filter_records, FilterError, SearchFilter};
pub use service::agniveer_service::{AgniveerService, ServiceError, ServiceResult};
pub use service::sheet::{read_rows_csv, read_rows_xlsx, write_csv, write_xlsx};
pub use service::transfer::{
    export_all, export_file_name, export_json, export_records, import_rows, read_rows,
    read_rows_json, ImportFailure, ImportReport, ImportRow, TransferError, TransferFormat,
};
pub use session::{AppSession, Page, SessionError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
