//! Whole-ledger verification of counter continuity and overlay hygiene.

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use crate::calendar::BusinessCalendar;
use crate::counters::next_film_number;
use crate::storage::types::{CodedField, Entry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterKind {
    Yearly,
    Film,
    Daily,
}

impl fmt::Display for CounterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CounterKind::Yearly => "yearly count",
            CounterKind::Film => "film number",
            CounterKind::Daily => "daily count",
        };
        f.write_str(name)
    }
}

/// A single broken invariant found in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    Counter {
        entry: Uuid,
        counter: CounterKind,
        expected: i64,
        found: i64,
    },
    StrayOverlay {
        entry: Uuid,
        field: &'static str,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Counter {
                entry,
                counter,
                expected,
                found,
            } => write!(
                f,
                "entry {}: {} is {}, expected {}",
                entry, counter, found, expected
            ),
            Violation::StrayOverlay { entry, field } => write!(
                f,
                "entry {}: other {} is set but {} is not \"other\"",
                entry, field, field
            ),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IntegrityReport {
    pub checked: usize,
    pub violations: Vec<Violation>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Walk entries in creation order and report every broken invariant.
pub fn verify(entries_ascending: &[Entry], calendar: &BusinessCalendar) -> IntegrityReport {
    let mut report = IntegrityReport {
        checked: entries_ascending.len(),
        violations: Vec::new(),
    };

    let mut previous: Option<&Entry> = None;
    for entry in entries_ascending {
        let (yearly, film, daily) = match previous {
            None => (1, 1, 1),
            Some(prev) => {
                let same_year = calendar.year_of(prev.created_at) == calendar.year_of(entry.created_at);
                let same_day =
                    calendar.local_date(prev.created_at) == calendar.local_date(entry.created_at);
                (
                    if same_year { prev.counters.yearly_count + 1 } else { 1 },
                    next_film_number(prev.counters.film_number),
                    if same_day { prev.counters.daily_count + 1 } else { 1 },
                )
            }
        };

        for (counter, expected, found) in [
            (CounterKind::Yearly, yearly, entry.counters.yearly_count),
            (CounterKind::Film, film, entry.counters.film_number),
            (CounterKind::Daily, daily, entry.counters.daily_count),
        ] {
            if expected != found {
                report.violations.push(Violation::Counter {
                    entry: entry.id,
                    counter,
                    expected,
                    found,
                });
            }
        }

        let details = &entry.details;
        for (field, value) in [
            ("address", &details.address),
            ("job", &details.job),
            ("visit reason", &details.visit_reason),
            ("radiology report", &details.radiology_report),
        ] {
            if has_stray_overlay(value) {
                report.violations.push(Violation::StrayOverlay {
                    entry: entry.id,
                    field,
                });
            }
        }

        previous = Some(entry);
    }

    for violation in &report.violations {
        tracing::warn!(%violation, "integrity violation");
    }
    report
}

fn has_stray_overlay(field: &CodedField) -> bool {
    field.other.is_some() && !field.is_other()
}
