//! Agniveer repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide single-statement CRUD and search over the `agniveers` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Column names are taken from `AgniveerField::as_str()` only; values are
//!   always bound parameters.
//! - Each call is one SQL statement; no multi-statement transactions.
//! - Store failures surface as `RepoError`, never as empty results.
//! - The repository does not validate; callers run `validate_agniveer`.

use crate::db::DbError;
use crate::model::agniveer::{AgniveerField, AgniveerId, AgniveerRecord};
use crate::search::filter::{build_where_clause, SearchFilter};
use once_cell::sync::Lazy;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

static AGNIVEER_SELECT_SQL: Lazy<String> = Lazy::new(|| {
    let columns = AgniveerField::ALL
        .iter()
        .map(|field| format!("\"{}\"", field.as_str()))
        .collect::<Vec<_>>()
        .join(", ");
    format!("SELECT id, {columns} FROM agniveers")
});

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for record persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(AgniveerId),
    /// Write request carries no whitelisted attribute.
    EmptyRecord,
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "agniveer not found: {id}"),
            Self::EmptyRecord => write!(f, "no valid fields provided"),
            Self::InvalidData(message) => write!(f, "invalid persisted agniveer data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::EmptyRecord | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for the single-table record store.
pub trait AgniveerRepository {
    /// Inserts a record, ignoring its `id`, and returns the assigned identity.
    fn insert(&self, record: &AgniveerRecord) -> RepoResult<AgniveerId>;
    /// Writes every populated attribute of `patch`; returns changed row count.
    fn update(&self, id: AgniveerId, patch: &AgniveerRecord) -> RepoResult<usize>;
    /// Hard-deletes by identity; returns changed row count.
    fn delete(&self, id: AgniveerId) -> RepoResult<usize>;
    fn get(&self, id: AgniveerId) -> RepoResult<Option<AgniveerRecord>>;
    /// All records ordered by identity.
    fn list_all(&self) -> RepoResult<Vec<AgniveerRecord>>;
    /// Records matching every filter term, ordered by identity.
    fn search(&self, filter: &SearchFilter) -> RepoResult<Vec<AgniveerRecord>>;
    fn count(&self) -> RepoResult<u64>;
}

/// SQLite-backed Agniveer repository.
pub struct SqliteAgniveerRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAgniveerRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query_records(&self, sql: &str, params: Vec<Value>) -> RepoResult<Vec<AgniveerRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(params))?;
        let mut records = Vec::new();

        while let Some(row) = rows.next()? {
            records.push(parse_agniveer_row(row)?);
        }

        Ok(records)
    }
}

impl AgniveerRepository for SqliteAgniveerRepository<'_> {
    fn insert(&self, record: &AgniveerRecord) -> RepoResult<AgniveerId> {
        let populated = record.fields().collect::<Vec<_>>();
        if populated.is_empty() {
            return Err(RepoError::EmptyRecord);
        }

        let columns = populated
            .iter()
            .map(|(field, _)| format!("\"{}\"", field.as_str()))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; populated.len()].join(", ");
        let sql = format!("INSERT INTO agniveers ({columns}) VALUES ({placeholders});");

        self.conn.execute(
            &sql,
            params_from_iter(populated.iter().map(|(_, value)| *value)),
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn update(&self, id: AgniveerId, patch: &AgniveerRecord) -> RepoResult<usize> {
        let populated = patch.fields().collect::<Vec<_>>();
        if populated.is_empty() {
            return Err(RepoError::EmptyRecord);
        }

        let assignments = populated
            .iter()
            .map(|(field, _)| format!("\"{}\" = ?", field.as_str()))
            .collect::<Vec<_>>()
            .join(", ");
        let mut bind_values = populated
            .iter()
            .map(|(_, value)| Value::Text((*value).to_string()))
            .collect::<Vec<_>>();
        bind_values.push(Value::Integer(id));

        let changed = self.conn.execute(
            &format!("UPDATE agniveers SET {assignments} WHERE id = ?;"),
            params_from_iter(bind_values),
        )?;

        Ok(changed)
    }

    fn delete(&self, id: AgniveerId) -> RepoResult<usize> {
        let changed = self
            .conn
            .execute("DELETE FROM agniveers WHERE id = ?1;", [id])?;
        Ok(changed)
    }

    fn get(&self, id: AgniveerId) -> RepoResult<Option<AgniveerRecord>> {
        let sql = format!("{} WHERE id = ?;", AGNIVEER_SELECT_SQL.as_str());
        let mut records = self.query_records(&sql, vec![Value::Integer(id)])?;
        Ok(records.pop())
    }

    fn list_all(&self) -> RepoResult<Vec<AgniveerRecord>> {
        let sql = format!("{} ORDER BY id ASC;", AGNIVEER_SELECT_SQL.as_str());
        self.query_records(&sql, Vec::new())
    }

    fn search(&self, filter: &SearchFilter) -> RepoResult<Vec<AgniveerRecord>> {
        let condition = build_where_clause(filter);
        let sql = format!(
            "{}{} ORDER BY id ASC;",
            AGNIVEER_SELECT_SQL.as_str(),
            condition.clause
        );
        self.query_records(&sql, condition.params)
    }

    fn count(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM agniveers;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative row count `{count}`")))
    }
}

fn parse_agniveer_row(row: &Row<'_>) -> RepoResult<AgniveerRecord> {
    let mut record = AgniveerRecord::new();
    record.id = Some(row.get("id")?);
    for field in AgniveerField::ALL {
        let value: Option<String> = row.get(field.as_str()).map_err(|err| match err {
            rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::InvalidColumnType(..) => RepoError::InvalidData(format!(
                "non-text value in agniveers.{}",
                field.as_str()
            )),
            other => other.into(),
        })?;
        record.set(*field, value);
    }
    Ok(record)
}
