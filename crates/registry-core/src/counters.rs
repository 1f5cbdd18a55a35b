//! Counter assignment for new entries.
//!
//! Every entry carries three sequence numbers: a yearly count, a film stock
//! number that wraps at [`FILM_STOCK_SIZE`], and a daily count. They are a
//! function of ledger state at the moment of insertion and are never
//! recomputed afterwards.
//!
//! The store reads a [`CounterSnapshot`] and inserts the new entry inside the
//! same write transaction, so two concurrent creates can never observe the
//! same tail.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::calendar::BusinessCalendar;
use crate::error::{RegistryError, Result};
use crate::storage::types::Counters;

/// Number of frames on a film stock; film numbers cycle through `1..=1000`.
pub const FILM_STOCK_SIZE: i64 = 1000;

/// Counter state of the current tail entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TailCounters {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub counters: Counters,
}

/// Ledger state needed to assign counters to the next entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CounterSnapshot {
    /// Total number of entries in the ledger
    pub ledger_count: u64,

    /// Entry with the greatest creation timestamp
    pub tail: Option<TailCounters>,

    /// Highest daily count among entries created on the insert's local day
    pub todays_max_daily: Option<i64>,
}

/// Compute counters for an entry created at `now`.
pub fn assign_counters(
    snapshot: &CounterSnapshot,
    now: DateTime<Utc>,
    calendar: &BusinessCalendar,
) -> Result<Counters> {
    if snapshot.ledger_count == 0 {
        tracing::debug!("empty ledger, starting all counters at 1");
        return Ok(Counters::FIRST);
    }

    let tail = snapshot.tail.as_ref().ok_or_else(|| {
        RegistryError::DataIntegrity(format!(
            "ledger holds {} entries but no tail was found",
            snapshot.ledger_count
        ))
    })?;
    validate_tail(tail)?;

    let todays_max = match snapshot.todays_max_daily {
        Some(value) if value < 1 => {
            return Err(RegistryError::DataIntegrity(format!(
                "daily count {} recorded today is out of range",
                value
            )))
        }
        Some(value) => value,
        None => 0,
    };

    let same_year = calendar.year_of(tail.created_at) == calendar.year_of(now);
    let yearly_count = if same_year {
        tail.counters.yearly_count + 1
    } else {
        1
    };
    let film_number = next_film_number(tail.counters.film_number);
    let daily_count = todays_max + 1;

    tracing::debug!(
        tail = %tail.id,
        same_year,
        yearly_count,
        film_number,
        daily_count,
        "assigned counters"
    );

    Ok(Counters::new(yearly_count, film_number, daily_count))
}

/// Film number following `previous`; wraps to 1, never 0.
pub fn next_film_number(previous: i64) -> i64 {
    (previous % FILM_STOCK_SIZE) + 1
}

fn validate_tail(tail: &TailCounters) -> Result<()> {
    let counters = &tail.counters;
    if counters.yearly_count < 1 {
        return Err(RegistryError::DataIntegrity(format!(
            "tail entry {} has yearly count {}",
            tail.id, counters.yearly_count
        )));
    }
    if !(1..=FILM_STOCK_SIZE).contains(&counters.film_number) {
        return Err(RegistryError::DataIntegrity(format!(
            "tail entry {} has film number {}",
            tail.id, counters.film_number
        )));
    }
    if counters.daily_count < 1 {
        return Err(RegistryError::DataIntegrity(format!(
            "tail entry {} has daily count {}",
            tail.id, counters.daily_count
        )));
    }
    Ok(())
}
