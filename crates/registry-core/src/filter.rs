//! Filter criteria and the predicate tree they compile to.
//!
//! [`build`] is pure: it turns [`FilterCriteria`] into a [`Predicate`] using
//! the static [`FILTER_FIELDS`] table. Storage backends render the predicate
//! to their own query language; [`Predicate::matches`] evaluates it in
//! memory with the same semantics.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::BusinessCalendar;
use crate::storage::types::{non_blank, Entry, Gender};

/// Optional criteria accepted by list and export.
///
/// Blank strings count as absent. Coded fields and their overlays are
/// matched independently and combine by AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub search: Option<String>,
    pub created_from: Option<NaiveDate>,
    pub created_to: Option<NaiveDate>,
    pub birth_year_from: Option<i32>,
    pub birth_year_to: Option<i32>,
    pub age_from: Option<i32>,
    pub age_to: Option<i32>,
    pub gender: Option<Gender>,
    pub address: Option<String>,
    pub other_address: Option<String>,
    pub job: Option<String>,
    pub other_job: Option<String>,
    pub visit_reason: Option<String>,
    pub other_visit_reason: Option<String>,
    pub radiology_report: Option<String>,
    pub other_radiology_report: Option<String>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        matches!(build(self, &BusinessCalendar::utc()), Predicate::All)
    }

    fn criterion(&self, field: FilterField) -> Option<Criterion<'_>> {
        let ints = |lower: Option<i32>, upper: Option<i32>| {
            (lower.is_some() || upper.is_some())
                .then(|| Criterion::IntRange(lower.map(i64::from), upper.map(i64::from)))
        };
        match field {
            FilterField::CreatedAt => (self.created_from.is_some() || self.created_to.is_some())
                .then_some(Criterion::DateRange(self.created_from, self.created_to)),
            FilterField::BirthYear => ints(self.birth_year_from, self.birth_year_to),
            FilterField::Age => ints(self.age_from, self.age_to),
            FilterField::Gender => self.gender.map(|gender| Criterion::Text(gender.as_str())),
            FilterField::Address => text_criterion(&self.address),
            FilterField::OtherAddress => text_criterion(&self.other_address),
            FilterField::Job => text_criterion(&self.job),
            FilterField::OtherJob => text_criterion(&self.other_job),
            FilterField::VisitReason => text_criterion(&self.visit_reason),
            FilterField::OtherVisitReason => text_criterion(&self.other_visit_reason),
            FilterField::RadiologyReport => text_criterion(&self.radiology_report),
            FilterField::OtherRadiologyReport => text_criterion(&self.other_radiology_report),
        }
    }
}

/// Stored entry attribute a predicate can test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    FullName,
    Phone,
    Address,
    OtherAddress,
    Job,
    OtherJob,
    VisitReason,
    OtherVisitReason,
    RadiologyReport,
    OtherRadiologyReport,
    Gender,
    CreatedAt,
    BirthYear,
    Age,
}

/// Value of a [`Column`] read from an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnValue<'a> {
    Text(Option<&'a str>),
    Int(i64),
    Instant(DateTime<Utc>),
}

impl Column {
    pub fn value_of<'a>(&self, entry: &'a Entry) -> ColumnValue<'a> {
        let details = &entry.details;
        match self {
            Column::FullName => ColumnValue::Text(Some(details.full_name.as_str())),
            Column::Phone => ColumnValue::Text(details.phone.as_deref()),
            Column::Address => ColumnValue::Text(details.address.code.as_deref()),
            Column::OtherAddress => ColumnValue::Text(details.address.other.as_deref()),
            Column::Job => ColumnValue::Text(details.job.code.as_deref()),
            Column::OtherJob => ColumnValue::Text(details.job.other.as_deref()),
            Column::VisitReason => ColumnValue::Text(details.visit_reason.code.as_deref()),
            Column::OtherVisitReason => ColumnValue::Text(details.visit_reason.other.as_deref()),
            Column::RadiologyReport => ColumnValue::Text(details.radiology_report.code.as_deref()),
            Column::OtherRadiologyReport => {
                ColumnValue::Text(details.radiology_report.other.as_deref())
            }
            Column::Gender => ColumnValue::Text(Some(details.gender.as_str())),
            Column::CreatedAt => ColumnValue::Instant(entry.created_at),
            Column::BirthYear => ColumnValue::Int(i64::from(details.birth_year)),
            Column::Age => ColumnValue::Int(i64::from(entry.age)),
        }
    }
}

/// Literal operand of a comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Text(String),
    Int(i64),
    Instant(DateTime<Utc>),
}

/// Boolean query over entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Matches every entry
    All,
    And(Vec<Predicate>),
    AnyOf(Vec<Predicate>),
    /// Case-insensitive literal substring match; NULL never matches
    Contains { column: Column, needle: String },
    Equals { column: Column, value: Operand },
    /// Inclusive on both ends; an absent bound is unbounded
    Range {
        column: Column,
        lower: Option<Operand>,
        upper: Option<Operand>,
    },
}

impl Predicate {
    pub fn matches(&self, entry: &Entry) -> bool {
        match self {
            Predicate::All => true,
            Predicate::And(parts) => parts.iter().all(|part| part.matches(entry)),
            Predicate::AnyOf(parts) => parts.iter().any(|part| part.matches(entry)),
            Predicate::Contains { column, needle } => match column.value_of(entry) {
                ColumnValue::Text(Some(haystack)) => contains_ignore_case(haystack, needle),
                _ => false,
            },
            Predicate::Equals { column, value } => compare(column.value_of(entry), value)
                .map(|ordering| ordering.is_eq())
                .unwrap_or(false),
            Predicate::Range {
                column,
                lower,
                upper,
            } => {
                let actual = column.value_of(entry);
                let above = lower
                    .as_ref()
                    .map(|bound| compare(actual, bound).is_some_and(|o| o.is_ge()))
                    .unwrap_or(true);
                let below = upper
                    .as_ref()
                    .map(|bound| compare(actual, bound).is_some_and(|o| o.is_le()))
                    .unwrap_or(true);
                above && below
            }
        }
    }
}

fn compare(actual: ColumnValue<'_>, operand: &Operand) -> Option<std::cmp::Ordering> {
    match (actual, operand) {
        (ColumnValue::Text(Some(value)), Operand::Text(expected)) => {
            Some(value.cmp(expected.as_str()))
        }
        (ColumnValue::Int(value), Operand::Int(expected)) => Some(value.cmp(expected)),
        (ColumnValue::Instant(value), Operand::Instant(expected)) => Some(value.cmp(expected)),
        _ => None,
    }
}

/// Case-insensitive substring test using Unicode lowercase folding.
///
/// The SQLite backend registers this as its `contains_ci` function.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Criterion names accepted by [`FilterCriteria`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
    CreatedAt,
    BirthYear,
    Age,
    Gender,
    Address,
    OtherAddress,
    Job,
    OtherJob,
    VisitReason,
    OtherVisitReason,
    RadiologyReport,
    OtherRadiologyReport,
}

/// How a criterion is matched against its column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Exact,
    Substring,
    IntRange,
    /// Local dates widened to whole business days
    InstantRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub field: FilterField,
    pub column: Column,
    pub kind: FieldKind,
}

const fn spec(field: FilterField, column: Column, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        field,
        column,
        kind,
    }
}

/// Every filterable criterion, in the order its predicate is emitted.
pub const FILTER_FIELDS: &[FieldSpec] = &[
    spec(FilterField::CreatedAt, Column::CreatedAt, FieldKind::InstantRange),
    spec(FilterField::BirthYear, Column::BirthYear, FieldKind::IntRange),
    spec(FilterField::Age, Column::Age, FieldKind::IntRange),
    spec(FilterField::Gender, Column::Gender, FieldKind::Exact),
    spec(FilterField::Address, Column::Address, FieldKind::Substring),
    spec(FilterField::OtherAddress, Column::OtherAddress, FieldKind::Substring),
    spec(FilterField::Job, Column::Job, FieldKind::Substring),
    spec(FilterField::OtherJob, Column::OtherJob, FieldKind::Substring),
    spec(FilterField::VisitReason, Column::VisitReason, FieldKind::Substring),
    spec(
        FilterField::OtherVisitReason,
        Column::OtherVisitReason,
        FieldKind::Substring,
    ),
    spec(
        FilterField::RadiologyReport,
        Column::RadiologyReport,
        FieldKind::Substring,
    ),
    spec(
        FilterField::OtherRadiologyReport,
        Column::OtherRadiologyReport,
        FieldKind::Substring,
    ),
];

/// Columns scanned by free-text search.
pub const SEARCH_COLUMNS: &[Column] = &[
    Column::FullName,
    Column::Phone,
    Column::Address,
    Column::OtherAddress,
    Column::Job,
    Column::OtherJob,
    Column::VisitReason,
    Column::OtherVisitReason,
    Column::RadiologyReport,
    Column::OtherRadiologyReport,
];

#[derive(Debug, Clone, Copy)]
enum Criterion<'a> {
    Text(&'a str),
    IntRange(Option<i64>, Option<i64>),
    DateRange(Option<NaiveDate>, Option<NaiveDate>),
}

fn text_criterion(value: &Option<String>) -> Option<Criterion<'_>> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(Criterion::Text)
}

/// Compile criteria into a predicate.
pub fn build(criteria: &FilterCriteria, calendar: &BusinessCalendar) -> Predicate {
    let mut clauses = Vec::new();

    if let Some(needle) = non_blank(criteria.search.as_deref()) {
        clauses.push(Predicate::AnyOf(
            SEARCH_COLUMNS
                .iter()
                .map(|column| Predicate::Contains {
                    column: *column,
                    needle: needle.clone(),
                })
                .collect(),
        ));
    }

    for field in FILTER_FIELDS {
        if let Some(criterion) = criteria.criterion(field.field) {
            if let Some(predicate) = field_predicate(field, criterion, calendar) {
                clauses.push(predicate);
            }
        }
    }

    match clauses.len() {
        0 => Predicate::All,
        1 => clauses.remove(0),
        _ => Predicate::And(clauses),
    }
}

fn field_predicate(
    field: &FieldSpec,
    criterion: Criterion<'_>,
    calendar: &BusinessCalendar,
) -> Option<Predicate> {
    let column = field.column;
    match (field.kind, criterion) {
        (FieldKind::Exact, Criterion::Text(value)) => Some(Predicate::Equals {
            column,
            value: Operand::Text(value.to_string()),
        }),
        (FieldKind::Substring, Criterion::Text(value)) => Some(Predicate::Contains {
            column,
            needle: value.to_string(),
        }),
        (FieldKind::IntRange, Criterion::IntRange(lower, upper)) => Some(Predicate::Range {
            column,
            lower: lower.map(Operand::Int),
            upper: upper.map(Operand::Int),
        }),
        (FieldKind::InstantRange, Criterion::DateRange(from, to)) => Some(Predicate::Range {
            column,
            lower: from.map(|date| Operand::Instant(calendar.start_of_day(date))),
            upper: to.map(|date| Operand::Instant(calendar.end_of_day(date))),
        }),
        (kind, _) => {
            tracing::warn!(?kind, field = ?field.field, "criterion does not fit field kind");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::types::{CodedField, Counters, VisitDetails};
    use uuid::Uuid;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn entry(name: &str, created_at: &str) -> Entry {
        let created_at = utc(created_at);
        Entry {
            id: Uuid::new_v4(),
            created_at,
            updated_at: created_at,
            counters: Counters::FIRST,
            age: 36,
            details: VisitDetails::new(name, 1990, Gender::Male, "0.02 mSv"),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_no_criteria_matches_everything() {
        let predicate = build(&FilterCriteria::new(), &BusinessCalendar::default());
        assert_eq!(predicate, Predicate::All);
        assert!(predicate.matches(&entry("Anyone", "2026-01-01T00:00:00Z")));
    }

    #[test]
    fn test_blank_values_are_absent() {
        let criteria = FilterCriteria {
            search: Some("   ".into()),
            address: Some(String::new()),
            ..FilterCriteria::default()
        };
        assert!(criteria.is_empty());
    }

    #[test]
    fn test_search_matches_any_text_column_case_insensitively() {
        let predicate = build(
            &FilterCriteria {
                search: Some("john".into()),
                ..FilterCriteria::default()
            },
            &BusinessCalendar::default(),
        );

        let by_name = entry("JOHNNY Smith", "2026-01-01T00:00:00Z");
        let mut by_job = entry("Aziz", "2026-01-01T00:00:00Z");
        by_job.details.job = CodedField::other("Johnston Farms driver");
        let unrelated = entry("Aziz", "2026-01-01T00:00:00Z");

        assert!(predicate.matches(&by_name));
        assert!(predicate.matches(&by_job));
        assert!(!predicate.matches(&unrelated));
    }

    #[test]
    fn test_search_needle_is_literal() {
        let predicate = build(
            &FilterCriteria {
                search: Some("a.*b".into()),
                ..FilterCriteria::default()
            },
            &BusinessCalendar::default(),
        );
        assert!(!predicate.matches(&entry("aXXb", "2026-01-01T00:00:00Z")));
        assert!(predicate.matches(&entry("Sana.*bek", "2026-01-01T00:00:00Z")));
    }

    #[test]
    fn test_created_range_is_inclusive_in_business_days() {
        let calendar = BusinessCalendar::default();
        let predicate = build(
            &FilterCriteria {
                created_from: Some(date(2026, 5, 10)),
                created_to: Some(date(2026, 5, 11)),
                ..FilterCriteria::default()
            },
            &calendar,
        );

        // 00:00 local on May 10 and 23:59:59.999 local on May 11.
        assert!(predicate.matches(&entry("a", "2026-05-09T19:00:00Z")));
        assert!(predicate.matches(&entry("b", "2026-05-11T18:59:59.999Z")));
        assert!(!predicate.matches(&entry("c", "2026-05-09T18:59:59.999Z")));
        assert!(!predicate.matches(&entry("d", "2026-05-11T19:00:00Z")));
    }

    #[test]
    fn test_open_ended_range() {
        let predicate = build(
            &FilterCriteria {
                age_from: Some(30),
                ..FilterCriteria::default()
            },
            &BusinessCalendar::default(),
        );
        assert_eq!(
            predicate,
            Predicate::Range {
                column: Column::Age,
                lower: Some(Operand::Int(30)),
                upper: None,
            }
        );
    }

    #[test]
    fn test_overlay_fields_combine_by_and() {
        let predicate = build(
            &FilterCriteria {
                address: Some("other".into()),
                other_address: Some("riverside".into()),
                ..FilterCriteria::default()
            },
            &BusinessCalendar::default(),
        );

        let mut riverside = entry("a", "2026-01-01T00:00:00Z");
        riverside.details.address = CodedField::other("Old Riverside Road");
        let mut elsewhere = entry("b", "2026-01-01T00:00:00Z");
        elsewhere.details.address = CodedField::other("Hillside");
        let mut coded = entry("c", "2026-01-01T00:00:00Z");
        coded.details.address = CodedField::coded("riverside-district");

        assert!(predicate.matches(&riverside));
        assert!(!predicate.matches(&elsewhere));
        assert!(!predicate.matches(&coded));
    }

    #[test]
    fn test_gender_is_exact() {
        let predicate = build(
            &FilterCriteria {
                gender: Some(Gender::Female),
                ..FilterCriteria::default()
            },
            &BusinessCalendar::default(),
        );
        let mut female = entry("a", "2026-01-01T00:00:00Z");
        female.details.gender = Gender::Female;
        assert!(predicate.matches(&female));
        assert!(!predicate.matches(&entry("b", "2026-01-01T00:00:00Z")));
    }

    #[test]
    fn test_every_field_kind_produces_its_predicate() {
        let calendar = BusinessCalendar::utc();
        for field in FILTER_FIELDS {
            let criterion = match field.kind {
                FieldKind::Exact | FieldKind::Substring => Criterion::Text("x"),
                FieldKind::IntRange => Criterion::IntRange(Some(1), None),
                FieldKind::InstantRange => Criterion::DateRange(None, Some(date(2026, 1, 1))),
            };
            let predicate = field_predicate(field, criterion, &calendar).unwrap();
            let column = match &predicate {
                Predicate::Equals { column, .. }
                | Predicate::Contains { column, .. }
                | Predicate::Range { column, .. } => *column,
                other => panic!("unexpected predicate {:?}", other),
            };
            assert_eq!(column, field.column);
        }
    }

    #[test]
    fn test_table_covers_each_field_once() {
        let mut seen = std::collections::HashSet::new();
        for field in FILTER_FIELDS {
            assert!(seen.insert(field.field), "duplicate {:?}", field.field);
        }
        assert_eq!(seen.len(), 12);
    }
}
