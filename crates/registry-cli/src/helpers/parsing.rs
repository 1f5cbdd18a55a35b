//! Parsing helpers for datetimes, identifiers, and output formats.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use registry_core::storage::Gender;
use registry_core::BusinessCalendar;

use crate::errors::CliError;

/// Parse a datetime string (ISO-8601 or YYYY-MM-DD).
///
/// A bare date means the start of that day in the business timezone.
pub fn parse_datetime(value: &str, calendar: &BusinessCalendar) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(calendar.start_of_day(date));
    }

    Err(CliError::invalid_input(format!(
        "Invalid date/time (expected ISO-8601 or YYYY-MM-DD): {}",
        value
    ))
    .into())
}

/// Parse a local calendar day (YYYY-MM-DD).
pub fn parse_date(value: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        CliError::invalid_input(format!("Invalid date (expected YYYY-MM-DD): {}", value)).into()
    })
}

pub fn parse_entry_id(value: &str) -> anyhow::Result<Uuid> {
    Uuid::parse_str(value.trim()).map_err(|e| {
        CliError::invalid_input_with_hint(
            format!("Invalid entry ID: {}", e),
            "Hint: Run `registry list` to find entry IDs.",
        )
        .into()
    })
}

pub fn parse_gender(value: &str) -> anyhow::Result<Gender> {
    value
        .parse::<Gender>()
        .map_err(|e| CliError::invalid_input(e.to_string()).into())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Plain,
}

pub fn parse_output_format(value: Option<&str>) -> anyhow::Result<Option<OutputFormat>> {
    match value {
        None => Ok(None),
        Some("table") => Ok(Some(OutputFormat::Table)),
        Some("plain") => Ok(Some(OutputFormat::Plain)),
        Some(other) => Err(CliError::invalid_input(format!(
            "Unsupported format: {} (use table or plain)",
            other
        ))
        .into()),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Jsonl,
}

pub fn parse_export_format(value: &str) -> anyhow::Result<ExportFormat> {
    match value {
        "json" => Ok(ExportFormat::Json),
        "jsonl" => Ok(ExportFormat::Jsonl),
        other => Err(CliError::invalid_input(format!(
            "Unsupported export format: {} (use json or jsonl)",
            other
        ))
        .into()),
    }
}
