//! Schema migrations for the record store.
//!
//! # Responsibility
//! - List schema steps in strictly increasing version order.
//! - Bring a database up to `latest_version()` one step at a time.
//! - Check that the `agniveers` table still carries every whitelisted column.
//!
//! # Invariants
//! - Each step runs in its own transaction together with its
//!   `PRAGMA user_version` bump; a failed step leaves the prior version.
//! - A database newer than this binary is refused, never downgraded.

use crate::db::{DbError, DbResult};
use crate::model::agniveer::AgniveerField;
use log::info;
use rusqlite::Connection;
use std::cmp::Ordering;
use std::collections::HashSet;

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "create_agniveers",
    sql: include_str!("0001_init.sql"),
}];

/// Latest schema version this binary can produce.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Current `PRAGMA user_version` of `conn`.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?)
}

/// Applies pending steps, then verifies the record table layout.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let found = schema_version(conn)?;
    let latest = latest_version();

    match found.cmp(&latest) {
        Ordering::Greater => {
            return Err(DbError::UnsupportedSchemaVersion {
                db_version: found,
                latest_supported: latest,
            })
        }
        Ordering::Equal => {}
        Ordering::Less => {
            for migration in MIGRATIONS.iter().filter(|step| step.version > found) {
                let tx = conn.transaction()?;
                tx.execute_batch(migration.sql)?;
                tx.pragma_update(None, "user_version", migration.version)?;
                tx.commit()?;
                info!(
                    "event=db_migrate module=db status=ok version={} name={}",
                    migration.version, migration.name
                );
            }
        }
    }

    verify_record_columns(conn)
}

fn verify_record_columns(conn: &Connection) -> DbResult<()> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('agniveers');")?;
    let present = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<HashSet<_>, _>>()?;

    let missing = std::iter::once("id")
        .chain(AgniveerField::ALL.iter().map(|field| field.as_str()))
        .filter(|column| !present.contains(*column))
        .map(str::to_string)
        .collect::<Vec<_>>();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(DbError::SchemaMismatch { missing })
    }
}
