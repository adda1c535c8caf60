//! `acdms` command-line entry point.
//!
//! # Responsibility
//! - Run the local web server for the browser UI.
//! - Offer administrative record commands against the same database.

mod server;

use acdms_core::db::open_db;
use acdms_core::{
    export_all, import_rows, init_logging_from_config, read_rows, validate_agniveer,
    AgniveerRecord, AgniveerService, AppConfig, ImportRow, SearchFilter,
    SqliteAgniveerRepository, TransferFormat,
};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Agniveer Centralised Data Management System
#[derive(Parser, Debug)]
#[command(name = "acdms")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the web server
    Serve {
        /// Override `[server].bind`
        #[arg(long)]
        bind: Option<String>,
        /// Override `[server].static_dir`
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Import records from a spreadsheet (.xlsx, .csv or .json)
    Import {
        /// Input file; the extension selects the format
        file: PathBuf,
    },

    /// Export every record (.xlsx, .csv or .json)
    Export {
        /// Output file; the extension selects the format
        file: PathBuf,
    },

    /// Validate rows in a spreadsheet without writing them
    Validate {
        /// Input file; the extension selects the format
        file: PathBuf,
    },

    /// Search records with `field=value` substring filters
    Search {
        /// Filters such as `district=Shillong`
        filters: Vec<String>,
    },

    /// Print core linkage details
    Ping,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;
    init_logging_from_config(&config.logging).map_err(anyhow::Error::msg)?;

    match cli.command {
        Command::Serve { bind, static_dir } => {
            let conn = open_db(&config.db.path).with_context(|| {
                format!("failed to open database `{}`", config.db.path.display())
            })?;
            let state = server::AppState::new(conn, Arc::new(config.auth.authenticator()));
            let app = server::router(state, static_dir.or(config.server.static_dir));
            let addr = bind.unwrap_or(config.server.bind);
            server::serve(&addr, app).await
        }
        Command::Import { file } => run_import(&config, &file),
        Command::Export { file } => run_export(&config, &file),
        Command::Validate { file } => run_validate(&file),
        Command::Search { filters } => run_search(&config, &filters),
        Command::Ping => {
            println!("acdms_core ping={}", acdms_core::ping());
            println!("acdms_core version={}", acdms_core::core_version());
            Ok(())
        }
    }
}

fn load_rows(file: &Path) -> anyhow::Result<Vec<ImportRow>> {
    let format = TransferFormat::from_path(file)?;
    let bytes =
        std::fs::read(file).with_context(|| format!("failed to read `{}`", file.display()))?;
    Ok(read_rows(format, &bytes)?)
}

fn run_import(config: &AppConfig, file: &Path) -> anyhow::Result<()> {
    let rows = load_rows(file)?;

    let conn = open_db(&config.db.path)?;
    let service = AgniveerService::new(SqliteAgniveerRepository::new(&conn));
    let report = import_rows(&service, &rows)?;

    for failure in &report.failures {
        eprintln!("row {}: {}", failure.row, failure.message);
    }
    println!("{}", report.summary());
    Ok(())
}

fn run_export(config: &AppConfig, file: &Path) -> anyhow::Result<()> {
    let format = TransferFormat::from_path(file)?;
    let conn = open_db(&config.db.path)?;
    let service = AgniveerService::new(SqliteAgniveerRepository::new(&conn));

    let writer =
        File::create(file).with_context(|| format!("failed to create `{}`", file.display()))?;
    let exported = export_all(&service, format, BufWriter::new(writer))?;
    println!("Exported {exported} record(s) to {}", file.display());
    Ok(())
}

fn run_validate(file: &Path) -> anyhow::Result<()> {
    let rows = load_rows(file)?;

    let mut invalid = 0usize;
    for (index, row) in rows.iter().enumerate() {
        let (record, _) =
            AgniveerRecord::from_fields(row.iter().map(|(key, value)| (key, value.clone())));
        let errors = validate_agniveer(&record);
        if !errors.is_empty() {
            invalid += 1;
            println!("row {}: {errors}", index + 1);
        }
    }
    println!("{} of {} row(s) valid", rows.len() - invalid, rows.len());
    if invalid > 0 {
        anyhow::bail!("{invalid} row(s) failed validation");
    }
    Ok(())
}

fn run_search(config: &AppConfig, filters: &[String]) -> anyhow::Result<()> {
    let pairs = filters
        .iter()
        .map(|raw| {
            raw.split_once('=')
                .with_context(|| format!("filter `{raw}` must look like field=value"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    let filter = SearchFilter::from_pairs(pairs)?;

    let conn = open_db(&config.db.path)?;
    let service = AgniveerService::new(SqliteAgniveerRepository::new(&conn));
    let records = service.search(&filter)?;
    for record in &records {
        println!(
            "{}\t{}\t{}",
            record.id.unwrap_or_default(),
            record.display_name(),
            record.district.as_deref().unwrap_or("-")
        );
    }
    println!("{} record(s) found", records.len());
    Ok(())
}
