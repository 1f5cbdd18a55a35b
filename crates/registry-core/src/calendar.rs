//! Business calendar: the timezone in which days and years are counted.
//!
//! Instants are stored in UTC. Every day or year comparison made by the
//! counter engine and the filter builder goes through this type first.

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{RegistryError, Result};

/// Timezone used when no configuration is present.
pub const DEFAULT_TIMEZONE: &str = "Asia/Tashkent";

/// Converts between stored UTC instants and local business dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessCalendar {
    tz: Tz,
}

impl Default for BusinessCalendar {
    fn default() -> Self {
        Self {
            tz: chrono_tz::Asia::Tashkent,
        }
    }
}

impl BusinessCalendar {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Parse an IANA timezone name (e.g. "Asia/Tashkent").
    pub fn from_name(name: &str) -> Result<Self> {
        let trimmed = name.trim();
        let tz = trimmed
            .parse::<Tz>()
            .map_err(|_| RegistryError::InvalidInput(format!("Invalid timezone: {}", trimmed)))?;
        Ok(Self { tz })
    }

    pub fn utc() -> Self {
        Self { tz: chrono_tz::UTC }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Local calendar date of an instant.
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.tz).date_naive()
    }

    /// Local calendar year of an instant.
    pub fn year_of(&self, instant: DateTime<Utc>) -> i32 {
        self.local_date(instant).year()
    }

    /// First instant of a local date.
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        let mut local = NaiveDateTime::new(date, NaiveTime::default());
        // A DST transition can skip local midnight; the day then starts at
        // the first local time that exists.
        for _ in 0..(24 * 4) {
            match self.tz.from_local_datetime(&local) {
                LocalResult::Single(dt) => return dt.with_timezone(&Utc),
                LocalResult::Ambiguous(earliest, _) => return earliest.with_timezone(&Utc),
                LocalResult::None => local += Duration::minutes(15),
            }
        }
        Utc.from_utc_datetime(&NaiveDateTime::new(date, NaiveTime::default()))
    }

    /// Last millisecond of a local date (23:59:59.999 on ordinary days).
    pub fn end_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        match date.succ_opt() {
            Some(next) => self.start_of_day(next) - Duration::milliseconds(1),
            None => self.start_of_day(date) + Duration::days(1) - Duration::milliseconds(1),
        }
    }

    /// Inclusive bounds of the local day containing `instant`.
    pub fn day_bounds(&self, instant: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let date = self.local_date(instant);
        (self.start_of_day(date), self.end_of_day(date))
    }

    /// Age derived from a birth year, counted in whole calendar years.
    pub fn age_at(&self, birth_year: i32, instant: DateTime<Utc>) -> i32 {
        self.year_of(instant) - birth_year
    }
}
