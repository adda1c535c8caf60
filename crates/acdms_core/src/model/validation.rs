//! Field-level validation for Agniveer records.
//!
//! # Responsibility
//! - Map a candidate record to per-field, human-readable error messages.
//! - Keep all semantic typing (dates, numeric identifiers) out of the store.
//!
//! # Invariants
//! - Validation is a pure function of the record and the reference date.
//! - Every rule runs independently; all failing fields are reported at once.
//! - A blank value never reports a format error, only "is required" when
//!   the field is mandatory.
//! - A non-blank date that cannot be parsed is reported as invalid and is
//!   excluded from bounds and cross-field checks.

use crate::model::agniveer::{AgniveerField, AgniveerRecord};
use chrono::{DateTime, Datelike, Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Fields that must be present and non-blank.
pub const REQUIRED_FIELDS: &[AgniveerField] = &[
    AgniveerField::BatchNo,
    AgniveerField::Number,
    AgniveerField::Rank,
    AgniveerField::Name,
    AgniveerField::DateOfBirth,
    AgniveerField::DateOfEnrolment,
    AgniveerField::MedicalCategory,
    AgniveerField::Village,
    AgniveerField::District,
    AgniveerField::State,
    AgniveerField::PinCode,
    AgniveerField::NokName,
    AgniveerField::NokRelationship,
];

/// Minimum age, in calendar years, at the date of enrolment.
pub const MIN_ENROLMENT_AGE_YEARS: i32 = 17;
/// Maximum plausible age, in calendar years, implied by the date of birth.
pub const MAX_AGE_YEARS: i32 = 100;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"];

static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z\s.'-]+$").expect("valid name regex"));
static PIN_CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{6}$").expect("valid pin regex"));
static AADHAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{12}$").expect("valid aadhar regex"));
static PAN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z0-9]{10}$").expect("valid pan regex"));

/// Per-field validation messages. Empty means the record is acceptable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: BTreeMap<AgniveerField, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a message for `field`, replacing any earlier one.
    pub fn insert(&mut self, field: AgniveerField, message: impl Into<String>) {
        self.errors.insert(field, message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn get(&self, field: AgniveerField) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: AgniveerField) -> bool {
        self.errors.contains_key(&field)
    }

    /// Failing fields in column order.
    pub fn fields(&self) -> impl Iterator<Item = AgniveerField> + '_ {
        self.errors.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AgniveerField, &str)> {
        self.errors
            .iter()
            .map(|(field, message)| (*field, message.as_str()))
    }

    /// Converts into a plain name-keyed map for UI layers.
    pub fn into_map(self) -> BTreeMap<String, String> {
        self.errors
            .into_iter()
            .map(|(field, message)| (field.as_str().to_string(), message))
            .collect()
    }

    /// Returns `Ok(())` when empty, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let messages = self.errors.values().map(String::as_str).collect::<Vec<_>>();
        write!(f, "{}", messages.join(", "))
    }
}

impl Error for ValidationErrors {}

/// Validates a record against today's local date.
pub fn validate_agniveer(record: &AgniveerRecord) -> ValidationErrors {
    validate_agniveer_at(record, Local::now().date_naive())
}

/// Validates a record against an explicit reference date.
pub fn validate_agniveer_at(record: &AgniveerRecord, today: NaiveDate) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    for field in REQUIRED_FIELDS {
        if non_blank(record, *field).is_none() {
            errors.insert(*field, format!("{} is required", field.label()));
        }
    }

    // The name pattern runs on the raw value; whitespace is part of the class.
    if let Some(name) = record.name.as_deref() {
        if !name.trim().is_empty() && !NAME_RE.is_match(name) {
            errors.insert(
                AgniveerField::Name,
                "Name should contain only alphabets, spaces, and common name characters",
            );
        }
    }

    check_format(
        record,
        &mut errors,
        AgniveerField::PinCode,
        &PIN_CODE_RE,
        "PIN Code must be 6 digits",
    );
    check_format(
        record,
        &mut errors,
        AgniveerField::AadharCardNumber,
        &AADHAR_RE,
        "Aadhar Card Number must be 12 digits",
    );
    check_format(
        record,
        &mut errors,
        AgniveerField::PanCardNumber,
        &PAN_RE,
        "PAN Card Number must be 10 alphanumeric characters",
    );

    let date_of_birth = checked_date(record, &mut errors, AgniveerField::DateOfBirth, today);
    if let Some(dob) = date_of_birth {
        if dob <= today && today.year() - dob.year() > MAX_AGE_YEARS {
            errors.insert(AgniveerField::DateOfBirth, "Date of Birth seems too old");
        }
    }

    let date_of_enrolment =
        checked_date(record, &mut errors, AgniveerField::DateOfEnrolment, today);
    checked_date(
        record,
        &mut errors,
        AgniveerField::DateOfTrainingCommenced,
        today,
    );

    if let (Some(dob), Some(doe)) = (date_of_birth, date_of_enrolment) {
        if doe.year() - dob.year() < MIN_ENROLMENT_AGE_YEARS {
            errors.insert(
                AgniveerField::DateOfEnrolment,
                "Recruit must be at least 17 years old at enrolment",
            );
        }
    }

    errors
}

/// Parses a date in any accepted input format.
///
/// Accepts `YYYY-MM-DD`, `DD-MM-YYYY`, `DD/MM/YYYY` and RFC 3339 timestamps.
/// The year must have four digits, so `DD-MM-YY` is rejected.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| {
            NaiveDate::parse_from_str(trimmed, format)
                .ok()
                .filter(|date| (1000..=9999).contains(&date.year()))
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(trimmed)
                .ok()
                .map(|timestamp| timestamp.date_naive())
        })
}

fn non_blank(record: &AgniveerRecord, field: AgniveerField) -> Option<&str> {
    record
        .get(field)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn check_format(
    record: &AgniveerRecord,
    errors: &mut ValidationErrors,
    field: AgniveerField,
    pattern: &Regex,
    message: &str,
) {
    if let Some(value) = non_blank(record, field) {
        if !pattern.is_match(value) {
            errors.insert(field, message);
        }
    }
}

/// Parses a date field and applies the not-in-the-future rule.
///
/// Returns the parsed date only when it can take part in further checks.
fn checked_date(
    record: &AgniveerRecord,
    errors: &mut ValidationErrors,
    field: AgniveerField,
    today: NaiveDate,
) -> Option<NaiveDate> {
    let raw = non_blank(record, field)?;
    let Some(date) = parse_date(raw) else {
        errors.insert(field, format!("{} is not a valid date", field.label()));
        return None;
    };

    if date > today {
        errors.insert(field, format!("{} cannot be in the future", field.label()));
    }
    Some(date)
}

#[cfg(test)]
mod tests {
    use super::{parse_date, validate_agniveer_at};
    use crate::model::agniveer::{AgniveerField, AgniveerRecord};
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date")
    }

    #[test]
    fn parse_date_accepts_form_and_sheet_formats() {
        let expected = NaiveDate::from_ymd_opt(2003, 2, 14);
        assert_eq!(parse_date("2003-02-14"), expected);
        assert_eq!(parse_date("14-02-2003"), expected);
        assert_eq!(parse_date(" 14/02/2003 "), expected);
        assert_eq!(parse_date("2003-02-14T08:30:00+05:30"), expected);
        assert_eq!(parse_date("14th Feb"), None);
        assert_eq!(parse_date("09-01-23"), None);
        assert_eq!(parse_date("0023-01-09"), None);
        assert_eq!(parse_date("   "), None);
    }

    #[test]
    fn blank_name_reports_required_not_format() {
        let record = AgniveerRecord::new().with(AgniveerField::Name, "   ");
        let errors = validate_agniveer_at(&record, today());
        assert_eq!(errors.get(AgniveerField::Name), Some("Name is required"));
    }

    #[test]
    fn future_dob_skips_too_old_check() {
        let record = AgniveerRecord::new().with(AgniveerField::DateOfBirth, "2030-01-01");
        let errors = validate_agniveer_at(&record, today());
        assert_eq!(
            errors.get(AgniveerField::DateOfBirth),
            Some("Date of Birth cannot be in the future")
        );
    }

    #[test]
    fn display_joins_messages() {
        let record = AgniveerRecord::new()
            .with(AgniveerField::PinCode, "12")
            .with(AgniveerField::BatchNo, "B1");
        let errors = validate_agniveer_at(&record, today());
        let rendered = errors.to_string();
        assert!(rendered.contains("PIN Code must be 6 digits"));
        assert!(rendered.contains(", "));
    }
}
