//! Agniveer personnel record and field whitelist.
//!
//! # Responsibility
//! - Define the canonical record stored in the `agniveers` table.
//! - Own the fixed attribute whitelist shared by validator, filter engine
//!   and store.
//!
//! # Invariants
//! - `id` is assigned by the store on insert and never changes afterwards.
//! - Every attribute is optional free text; semantic typing lives in
//!   `model::validation`.
//! - `AgniveerField::as_str()` is the only source of SQL column names.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Store-assigned identity of one record.
pub type AgniveerId = i64;

/// Logical form section an attribute belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSection {
    PersonalInformation,
    Identification,
    HomeAddress,
    NextOfKin,
    Miscellaneous,
}

impl FieldSection {
    /// Heading shown above the section in both UIs.
    pub fn title(self) -> &'static str {
        match self {
            Self::PersonalInformation => "Personal Information",
            Self::Identification => "Identification",
            Self::HomeAddress => "Home Address",
            Self::NextOfKin => "Next of Kin Details",
            Self::Miscellaneous => "Miscellaneous",
        }
    }
}

macro_rules! agniveer_fields {
    ($($variant:ident => $column:ident, $label:literal, $section:ident;)+) => {
        /// Whitelisted attribute of an Agniveer record.
        ///
        /// Declaration order is the canonical column order.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum AgniveerField {
            $($variant,)+
        }

        impl AgniveerField {
            /// All whitelisted fields in column order.
            pub const ALL: &'static [AgniveerField] = &[$(AgniveerField::$variant,)+];

            /// Exact column/key name.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($column),)+
                }
            }

            /// Human-readable label used in messages and form captions.
            pub fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }

            pub fn section(self) -> FieldSection {
                match self {
                    $(Self::$variant => FieldSection::$section,)+
                }
            }
        }

        /// Canonical Agniveer recruit record.
        ///
        /// Absent attributes are `None`; the store keeps them as SQL `NULL`.
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        pub struct AgniveerRecord {
            /// Store-assigned identity. `None` until inserted.
            #[serde(default)]
            pub id: Option<AgniveerId>,
            $(
                #[serde(default)]
                pub $column: Option<String>,
            )+
        }

        impl AgniveerRecord {
            /// Returns the raw value of one attribute.
            pub fn get(&self, field: AgniveerField) -> Option<&str> {
                match field {
                    $(AgniveerField::$variant => self.$column.as_deref(),)+
                }
            }

            fn slot_mut(&mut self, field: AgniveerField) -> &mut Option<String> {
                match field {
                    $(AgniveerField::$variant => &mut self.$column,)+
                }
            }
        }
    };
}

agniveer_fields! {
    BatchNo => batch_no, "Batch No.", PersonalInformation;
    Number => number, "No.", PersonalInformation;
    Rank => rank, "Rank", PersonalInformation;
    Name => name, "Name", PersonalInformation;
    CivilEducation => civil_education, "Civil Education", PersonalInformation;
    DateOfBirth => date_of_birth, "Date of Birth", PersonalInformation;
    DateOfEnrolment => date_of_enrolment, "Date of Enrolment", PersonalInformation;
    MedicalCategory => medical_category, "Medical Category", PersonalInformation;
    DateOfTrainingCommenced => date_of_training_commenced, "Date of Training Commenced", PersonalInformation;
    AccountNumber => account_number, "Account Number", Identification;
    PanCardNumber => pan_card_number, "PAN Card Number", Identification;
    AadharCardNumber => aadhar_card_number, "Aadhar Card Number", Identification;
    IdentificationMark1 => identification_mark_1, "Identification Mark 1", Identification;
    IdentificationMark2 => identification_mark_2, "Identification Mark 2", Identification;
    Village => village, "Village", HomeAddress;
    Street => street, "Street", HomeAddress;
    Tehsil => tehsil, "Tehsil", HomeAddress;
    PostOffice => post_office, "Post Office", HomeAddress;
    PoliceStation => police_station, "Police Station", HomeAddress;
    District => district, "District", HomeAddress;
    State => state, "State", HomeAddress;
    PinCode => pin_code, "PIN Code", HomeAddress;
    NearestRailwayStation => nearest_railway_station, "Nearest Railway Station", HomeAddress;
    NokName => nok_name, "Next of Kin Name", NextOfKin;
    NokRelationship => nok_relationship, "Next of Kin Relationship", NextOfKin;
    NokVillage => nok_village, "NOK Village", NextOfKin;
    NokTehsil => nok_tehsil, "NOK Tehsil", NextOfKin;
    NokPostOffice => nok_post_office, "NOK Post Office", NextOfKin;
    NokPoliceStation => nok_police_station, "NOK Police Station", NextOfKin;
    NokDistrict => nok_district, "NOK District", NextOfKin;
    NokState => nok_state, "NOK State", NextOfKin;
    SportsPlayed => sports_played, "Sports Played", Miscellaneous;
    Hobbies => hobbies, "Hobbies", Miscellaneous;
    Ncc => ncc, "NCC", Miscellaneous;
    PoliceVerificationStatus => police_verification_status, "Police Verification Status", Miscellaneous;
}

impl AgniveerField {
    /// Parses an exact whitelisted name. Surrounding whitespace is ignored.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|field| field.as_str() == normalized)
    }

    /// Fields belonging to one form section, in column order.
    pub fn in_section(section: FieldSection) -> impl Iterator<Item = AgniveerField> {
        Self::ALL
            .iter()
            .copied()
            .filter(move |field| field.section() == section)
    }
}

impl Display for AgniveerField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AgniveerField {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AgniveerField {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown agniveer field `{raw}`")))
    }
}

impl AgniveerRecord {
    /// Creates an empty, not-yet-stored record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces one attribute value.
    pub fn set(&mut self, field: AgniveerField, value: Option<String>) {
        *self.slot_mut(field) = value;
    }

    /// Builder-style variant of [`AgniveerRecord::set`].
    pub fn with(mut self, field: AgniveerField, value: impl Into<String>) -> Self {
        self.set(field, Some(value.into()));
        self
    }

    /// Builds a record from loosely keyed input (form payloads, spreadsheet rows).
    ///
    /// Returns the record and the names that are not whitelisted, in input
    /// order. Those names are dropped, never stored.
    pub fn from_fields<I, K, V>(entries: I) -> (Self, Vec<String>)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut record = Self::new();
        let mut ignored = Vec::new();
        for (key, value) in entries {
            match AgniveerField::parse(key.as_ref()) {
                Some(field) => record.set(field, Some(value.into())),
                None => ignored.push(key.as_ref().to_string()),
            }
        }
        (record, ignored)
    }

    /// Iterates populated attributes in column order.
    pub fn fields(&self) -> impl Iterator<Item = (AgniveerField, &str)> {
        AgniveerField::ALL
            .iter()
            .copied()
            .filter_map(move |field| self.get(field).map(|value| (field, value)))
    }

    /// Copies every populated attribute of `patch` onto `self`.
    ///
    /// `id` is left untouched.
    pub fn merge_from(&mut self, patch: &AgniveerRecord) {
        for (field, value) in patch.fields() {
            self.set(field, Some(value.to_string()));
        }
    }

    /// Short label for lists and log lines: `<rank> <name> (<number>)`.
    pub fn display_name(&self) -> String {
        let name = self.name.as_deref().map(str::trim).unwrap_or_default();
        let rank = self.rank.as_deref().map(str::trim).unwrap_or_default();
        let number = self.number.as_deref().map(str::trim).unwrap_or_default();

        let mut label = [rank, name]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ");
        if !number.is_empty() {
            if label.is_empty() {
                label = number.to_string();
            } else {
                label = format!("{label} ({number})");
            }
        }
        label
    }
}
