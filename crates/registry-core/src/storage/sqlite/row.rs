//! Entry row type for database queries.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use uuid::Uuid;

use crate::error::{RegistryError, Result};
use crate::storage::types::{CodedField, Counters, Entry, Gender, VisitDetails};

/// Columns selected for every entry query, in [`EntryRow::from_row`] order.
pub const ENTRY_COLUMNS: &str = "id, created_at, updated_at, yearly_count, film_number, \
    daily_count, full_name, address, other_address, job, other_job, visit_reason, \
    other_visit_reason, radiology_report, other_radiology_report, birth_year, age, gender, \
    phone, radiation_dose";

/// Raw row data from the entries table, before parsing into domain types.
#[derive(Debug)]
pub struct EntryRow {
    pub id: String,
    pub created_at: String,
    pub updated_at: String,
    pub yearly_count: i64,
    pub film_number: i64,
    pub daily_count: i64,
    pub full_name: String,
    pub address: Option<String>,
    pub other_address: Option<String>,
    pub job: Option<String>,
    pub other_job: Option<String>,
    pub visit_reason: Option<String>,
    pub other_visit_reason: Option<String>,
    pub radiology_report: Option<String>,
    pub other_radiology_report: Option<String>,
    pub birth_year: i32,
    pub age: i32,
    pub gender: String,
    pub phone: Option<String>,
    pub radiation_dose: String,
}

impl EntryRow {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            created_at: row.get(1)?,
            updated_at: row.get(2)?,
            yearly_count: row.get(3)?,
            film_number: row.get(4)?,
            daily_count: row.get(5)?,
            full_name: row.get(6)?,
            address: row.get(7)?,
            other_address: row.get(8)?,
            job: row.get(9)?,
            other_job: row.get(10)?,
            visit_reason: row.get(11)?,
            other_visit_reason: row.get(12)?,
            radiology_report: row.get(13)?,
            other_radiology_report: row.get(14)?,
            birth_year: row.get(15)?,
            age: row.get(16)?,
            gender: row.get(17)?,
            phone: row.get(18)?,
            radiation_dose: row.get(19)?,
        })
    }
}

impl TryFrom<EntryRow> for Entry {
    type Error = RegistryError;

    fn try_from(row: EntryRow) -> Result<Self> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| RegistryError::Storage(format!("Invalid entry UUID: {}", e)))?;
        let created_at = parse_timestamp(&row.created_at)?;
        let updated_at = parse_timestamp(&row.updated_at)?;
        let gender: Gender = row
            .gender
            .parse()
            .map_err(|_| RegistryError::Storage(format!("Invalid gender: {}", row.gender)))?;

        Ok(Entry {
            id,
            created_at,
            updated_at,
            counters: Counters::new(row.yearly_count, row.film_number, row.daily_count),
            age: row.age,
            details: VisitDetails {
                full_name: row.full_name,
                address: CodedField::new(row.address, row.other_address),
                job: CodedField::new(row.job, row.other_job),
                visit_reason: CodedField::new(row.visit_reason, row.other_visit_reason),
                radiology_report: CodedField::new(row.radiology_report, row.other_radiology_report),
                birth_year: row.birth_year,
                gender,
                phone: row.phone,
                radiation_dose: row.radiation_dose,
            },
        })
    }
}

/// Fixed-width UTC text, so lexical order equals time order.
pub fn format_timestamp(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)
        .map_err(|e| RegistryError::Storage(format!("Invalid timestamp: {}", e)))?
        .with_timezone(&Utc))
}
