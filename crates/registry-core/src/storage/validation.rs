//! Validation and normalization of visit details before they are written.

use chrono::{DateTime, Utc};

use crate::calendar::BusinessCalendar;
use crate::error::{RegistryError, Result};
use crate::storage::types::{non_blank, CodedField, VisitDetails};

pub const MAX_TEXT_BYTES: usize = 512;
pub const MAX_PHONE_BYTES: usize = 32;
pub const MIN_BIRTH_YEAR: i32 = 1000;

/// Trim every field, apply the overlay rule, and reject invalid values.
pub fn validate_details(
    details: &VisitDetails,
    now: DateTime<Utc>,
    calendar: &BusinessCalendar,
) -> Result<VisitDetails> {
    let full_name = required_text("full name", &details.full_name)?;
    let radiation_dose = required_text("radiation dose", &details.radiation_dose)?;

    let current_year = calendar.year_of(now);
    if details.birth_year < MIN_BIRTH_YEAR || details.birth_year > current_year {
        return Err(RegistryError::Validation(format!(
            "Birth year must be a four-digit year no later than {}",
            current_year
        )));
    }

    let phone = match non_blank(details.phone.as_deref()) {
        Some(phone) => Some(validate_phone(phone)?),
        None => None,
    };

    Ok(VisitDetails {
        full_name,
        address: coded("address", &details.address)?,
        job: coded("job", &details.job)?,
        visit_reason: coded("visit reason", &details.visit_reason)?,
        radiology_report: coded("radiology report", &details.radiology_report)?,
        birth_year: details.birth_year,
        gender: details.gender,
        phone,
        radiation_dose,
    })
}

fn required_text(label: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RegistryError::Validation(format!("{} is required", label)));
    }
    check_length(label, trimmed)?;
    Ok(trimmed.to_string())
}

fn check_length(label: &str, value: &str) -> Result<()> {
    if value.len() > MAX_TEXT_BYTES {
        return Err(RegistryError::Validation(format!(
            "{} too long (max {} bytes)",
            label, MAX_TEXT_BYTES
        )));
    }
    Ok(())
}

fn coded(label: &str, field: &CodedField) -> Result<CodedField> {
    let normalized = field.normalized();
    if let Some(code) = normalized.code.as_deref() {
        check_length(label, code)?;
    }
    if normalized.is_other() {
        match normalized.other.as_deref() {
            Some(text) => check_length(label, text)?,
            None => {
                return Err(RegistryError::Validation(format!(
                    "{} is \"other\" but no other text was given",
                    label
                )))
            }
        }
    }
    Ok(normalized)
}

fn validate_phone(phone: String) -> Result<String> {
    if phone.len() > MAX_PHONE_BYTES {
        return Err(RegistryError::Validation(format!(
            "Phone number too long (max {} bytes)",
            MAX_PHONE_BYTES
        )));
    }
    if !phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'))
    {
        return Err(RegistryError::Validation(
            "Phone number contains invalid characters".to_string(),
        ));
    }
    Ok(phone)
}
