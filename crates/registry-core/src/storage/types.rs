//! Core data types for the storage layer.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RegistryError;

/// Coded value meaning "the real value is in the parallel free-text field".
pub const OTHER_SENTINEL: &str = "other";

/// Metadata for a registry database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerMetadata {
    /// Format version (e.g., "1")
    pub format_version: String,

    /// Identifier generated when the ledger was created
    pub ledger_id: Uuid,

    /// When this ledger was created
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp (informational)
    pub last_modified: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            other => Err(RegistryError::InvalidInput(format!(
                "Invalid gender: {} (use male or female)",
                other
            ))),
        }
    }
}

/// Sequence numbers assigned to an entry at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    /// Position within the business-calendar year, starting at 1
    pub yearly_count: i64,

    /// Film stock number in [1, 1000], wrapping
    pub film_number: i64,

    /// Position within the business-calendar day, starting at 1
    pub daily_count: i64,
}

impl Counters {
    /// Counters of the first entry ever recorded.
    pub const FIRST: Counters = Counters {
        yearly_count: 1,
        film_number: 1,
        daily_count: 1,
    };

    pub fn new(yearly_count: i64, film_number: i64, daily_count: i64) -> Self {
        Self {
            yearly_count,
            film_number,
            daily_count,
        }
    }
}

/// A coded value with a free-text overlay used when the code is `"other"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodedField {
    pub code: Option<String>,
    pub other: Option<String>,
}

impl CodedField {
    pub fn new(code: Option<String>, other: Option<String>) -> Self {
        Self { code, other }
    }

    pub fn coded(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            other: None,
        }
    }

    /// A value held entirely in the free-text overlay.
    pub fn other(text: impl Into<String>) -> Self {
        Self {
            code: Some(OTHER_SENTINEL.to_string()),
            other: Some(text.into()),
        }
    }

    pub fn is_other(&self) -> bool {
        self.code.as_deref() == Some(OTHER_SENTINEL)
    }

    /// Trim both parts, drop blanks, and clear the overlay unless the code is
    /// the sentinel.
    pub fn normalized(&self) -> Self {
        let code = non_blank(self.code.as_deref());
        let other = if code.as_deref() == Some(OTHER_SENTINEL) {
            non_blank(self.other.as_deref())
        } else {
            None
        };
        Self { code, other }
    }
}

/// Partial update of a [`CodedField`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodedPatch {
    pub code: Option<String>,
    pub other: Option<String>,
}

impl CodedPatch {
    pub fn is_empty(&self) -> bool {
        self.code.is_none() && self.other.is_none()
    }

    pub fn apply(&self, field: &CodedField) -> CodedField {
        CodedField {
            code: self.code.clone().or_else(|| field.code.clone()),
            other: self.other.clone().or_else(|| field.other.clone()),
        }
        .normalized()
    }
}

/// Descriptive fields of a clinical visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitDetails {
    pub full_name: String,
    pub address: CodedField,
    pub job: CodedField,
    pub visit_reason: CodedField,
    pub radiology_report: CodedField,
    pub birth_year: i32,
    pub gender: Gender,
    pub phone: Option<String>,

    /// Free-text radiation dose note
    pub radiation_dose: String,
}

impl VisitDetails {
    pub fn new(
        full_name: impl Into<String>,
        birth_year: i32,
        gender: Gender,
        radiation_dose: impl Into<String>,
    ) -> Self {
        Self {
            full_name: full_name.into(),
            address: CodedField::default(),
            job: CodedField::default(),
            visit_reason: CodedField::default(),
            radiology_report: CodedField::default(),
            birth_year,
            gender,
            phone: None,
            radiation_dose: radiation_dose.into(),
        }
    }

    pub fn with_address(mut self, address: CodedField) -> Self {
        self.address = address;
        self
    }

    pub fn with_job(mut self, job: CodedField) -> Self {
        self.job = job;
        self
    }

    pub fn with_visit_reason(mut self, visit_reason: CodedField) -> Self {
        self.visit_reason = visit_reason;
        self
    }

    pub fn with_radiology_report(mut self, radiology_report: CodedField) -> Self {
        self.radiology_report = radiology_report;
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }
}

/// A recorded visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Unique identifier, assigned by the store
    pub id: Uuid,

    /// Insert timestamp, assigned by the store
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,

    pub counters: Counters,

    /// Derived from `details.birth_year`
    pub age: i32,

    pub details: VisitDetails,
}

/// Builder for creating new entries.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub details: VisitDetails,

    /// Optional: pinned insert timestamp (defaults to now)
    pub created_at: Option<DateTime<Utc>>,
}

impl NewEntry {
    pub fn new(details: VisitDetails) -> Self {
        Self {
            details,
            created_at: None,
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }
}

/// Partial update of an entry's descriptive fields.
///
/// Counters are not part of the patch and can never be changed here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryPatch {
    pub full_name: Option<String>,
    pub address: CodedPatch,
    pub job: CodedPatch,
    pub visit_reason: CodedPatch,
    pub radiology_report: CodedPatch,
    pub birth_year: Option<i32>,
    pub gender: Option<Gender>,

    /// `Some("")` clears the phone number
    pub phone: Option<String>,
    pub radiation_dose: Option<String>,
}

impl EntryPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.address.is_empty()
            && self.job.is_empty()
            && self.visit_reason.is_empty()
            && self.radiology_report.is_empty()
            && self.birth_year.is_none()
            && self.gender.is_none()
            && self.phone.is_none()
            && self.radiation_dose.is_none()
    }

    pub fn full_name(mut self, value: impl Into<String>) -> Self {
        self.full_name = Some(value.into());
        self
    }

    pub fn birth_year(mut self, value: i32) -> Self {
        self.birth_year = Some(value);
        self
    }

    pub fn address(mut self, code: Option<String>, other: Option<String>) -> Self {
        self.address = CodedPatch { code, other };
        self
    }

    /// Merge the patch over existing details.
    pub fn apply(&self, details: &VisitDetails) -> VisitDetails {
        let phone = match self.phone.as_deref() {
            Some(value) => non_blank(Some(value)),
            None => details.phone.clone(),
        };
        VisitDetails {
            full_name: self
                .full_name
                .clone()
                .unwrap_or_else(|| details.full_name.clone()),
            address: self.address.apply(&details.address),
            job: self.job.apply(&details.job),
            visit_reason: self.visit_reason.apply(&details.visit_reason),
            radiology_report: self.radiology_report.apply(&details.radiology_report),
            birth_year: self.birth_year.unwrap_or(details.birth_year),
            gender: self.gender.unwrap_or(details.gender),
            phone,
            radiation_dose: self
                .radiation_dose
                .clone()
                .unwrap_or_else(|| details.radiation_dose.clone()),
        }
    }
}

/// Ordering of query results by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Oldest first
    Ascending,
    /// Newest first
    Descending,
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_cleared_without_sentinel() {
        let field = CodedField::new(Some("teacher".into()), Some("ignored".into()));
        let normalized = field.normalized();
        assert_eq!(normalized.code.as_deref(), Some("teacher"));
        assert_eq!(normalized.other, None);
    }

    #[test]
    fn test_overlay_kept_with_sentinel() {
        let field = CodedField::new(Some(" other ".into()), Some("  Riverside ".into()));
        let normalized = field.normalized();
        assert!(normalized.is_other());
        assert_eq!(normalized.other.as_deref(), Some("Riverside"));
    }

    #[test]
    fn test_coded_patch_switching_away_from_other_clears_overlay() {
        let existing = CodedField::other("Riverside");
        let patch = CodedPatch {
            code: Some("downtown".into()),
            other: None,
        };
        let merged = patch.apply(&existing);
        assert_eq!(merged, CodedField::coded("downtown"));
    }

    #[test]
    fn test_entry_patch_merges_and_clears_phone() {
        let details = VisitDetails::new("Ali Valiyev", 1990, Gender::Male, "0.03 mSv")
            .with_phone("+998901234567");
        let patch = EntryPatch {
            full_name: Some("Ali Valiev".into()),
            phone: Some(String::new()),
            ..EntryPatch::default()
        };

        let merged = patch.apply(&details);
        assert_eq!(merged.full_name, "Ali Valiev");
        assert_eq!(merged.phone, None);
        assert_eq!(merged.birth_year, 1990);
        assert_eq!(merged.radiation_dose, "0.03 mSv");
    }

    #[test]
    fn test_gender_parse() {
        assert_eq!("Female".parse::<Gender>().unwrap(), Gender::Female);
        assert!("unknown".parse::<Gender>().is_err());
    }

    #[test]
    fn test_empty_patch() {
        assert!(EntryPatch::new().is_empty());
        assert!(!EntryPatch::new().birth_year(1980).is_empty());
    }
}
