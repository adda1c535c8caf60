//! Substring filter engine over Agniveer records.
//!
//! # Responsibility
//! - Turn sparse user filter input into a whitelisted, typed `SearchFilter`.
//! - Evaluate a filter in memory over already-loaded records.
//! - Build the parameterized SQL condition for store-backed search.
//!
//! # Invariants
//! - Field names outside the whitelist are rejected, never ignored.
//! - Blank filter values constrain nothing; an empty filter matches all.
//! - User text is only ever bound as a parameter and matched literally
//!   through `instr`, so no character in it has pattern meaning and its
//!   length is bounded only by the store's value limit.
//! - In-memory matching folds ASCII case only, the same rule SQLite's
//!   built-in `lower()` applies, so both modes accept exactly the same
//!   records.
//! - A `NULL`/absent value never matches a constrained field.

use crate::model::agniveer::{AgniveerField, AgniveerRecord};
use rusqlite::types::Value;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Filter construction error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// Filter key is not one of the whitelisted record fields.
    UnknownField(String),
}

impl Display for FilterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownField(name) => write!(f, "unknown search field `{name}`"),
        }
    }
}

impl Error for FilterError {}

/// Sparse field -> substring filter. Values are trimmed and non-blank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    terms: BTreeMap<AgniveerField, String>,
}

impl SearchFilter {
    /// Creates a filter that matches every record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a filter from loosely keyed input such as a JSON body.
    ///
    /// Blank values are dropped. Any key outside the whitelist fails the
    /// whole filter, even when its value is blank.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut filter = Self::new();
        for (key, value) in pairs {
            let field = AgniveerField::parse(key.as_ref())
                .ok_or_else(|| FilterError::UnknownField(key.as_ref().to_string()))?;
            filter.set(field, value.as_ref());
        }
        Ok(filter)
    }

    /// Constrains `field`; a blank `value` removes the constraint.
    pub fn set(&mut self, field: AgniveerField, value: &str) {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.terms.remove(&field);
        } else {
            self.terms.insert(field, trimmed.to_string());
        }
    }

    /// Builder-style variant of [`SearchFilter::set`].
    pub fn with(mut self, field: AgniveerField, value: &str) -> Self {
        self.set(field, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn get(&self, field: AgniveerField) -> Option<&str> {
        self.terms.get(&field).map(String::as_str)
    }

    /// Constrained fields and their substrings, in column order.
    pub fn terms(&self) -> impl Iterator<Item = (AgniveerField, &str)> {
        self.terms
            .iter()
            .map(|(field, value)| (*field, value.as_str()))
    }

    /// Returns whether `record` satisfies every constraint.
    pub fn matches(&self, record: &AgniveerRecord) -> bool {
        self.terms().all(|(field, needle)| {
            record
                .get(field)
                .is_some_and(|value| contains_ignore_ascii_case(value, needle))
        })
    }
}

/// Parameterized SQL condition produced from a filter.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlCondition {
    /// Either empty or ` WHERE ...` with one `?` per bound value.
    pub clause: String,
    pub params: Vec<Value>,
}

/// In-memory mode: keeps records matching `filter`, preserving order.
pub fn filter_records<'a>(
    records: &'a [AgniveerRecord],
    filter: &SearchFilter,
) -> Vec<&'a AgniveerRecord> {
    records
        .iter()
        .filter(|record| filter.matches(record))
        .collect()
}

/// Store mode: builds the `WHERE` fragment for `filter`.
///
/// Column names come from the whitelist; user text goes into `params`.
pub fn build_where_clause(filter: &SearchFilter) -> SqlCondition {
    if filter.is_empty() {
        return SqlCondition {
            clause: String::new(),
            params: Vec::new(),
        };
    }

    let mut conditions = Vec::with_capacity(filter.len());
    let mut params = Vec::with_capacity(filter.len());
    for (field, needle) in filter.terms() {
        conditions.push(format!("instr(lower(\"{}\"), lower(?)) > 0", field.as_str()));
        params.push(Value::Text(needle.to_string()));
    }

    SqlCondition {
        clause: format!(" WHERE {}", conditions.join(" AND ")),
        params,
    }
}

fn contains_ignore_ascii_case(haystack: &str, needle: &str) -> bool {
    haystack
        .to_ascii_lowercase()
        .contains(&needle.to_ascii_lowercase())
}
