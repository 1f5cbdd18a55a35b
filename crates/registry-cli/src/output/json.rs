//! JSON output formatting for entries.

use registry_core::catalog::{display_value, gender_label, CodedKind};
use registry_core::storage::Entry;
use registry_core::EntryPage;

/// Convert an entry to JSON for output.
///
/// With `resolved`, a `display` object carries the labels shown to operators.
pub fn entry_json(entry: &Entry, resolved: bool) -> anyhow::Result<serde_json::Value> {
    let mut value = serde_json::to_value(entry)?;
    if resolved {
        let details = &entry.details;
        let display = serde_json::json!({
            "address": display_value(CodedKind::Address, &details.address),
            "job": display_value(CodedKind::Job, &details.job),
            "visit_reason": display_value(CodedKind::VisitReason, &details.visit_reason),
            "radiology_report": display_value(CodedKind::RadiologyReport, &details.radiology_report),
            "gender": gender_label(details.gender),
        });
        if let Some(object) = value.as_object_mut() {
            object.insert("display".to_string(), display);
        }
    }
    Ok(value)
}

/// Convert multiple entries to JSON array for output.
pub fn entries_json(entries: &[Entry], resolved: bool) -> anyhow::Result<Vec<serde_json::Value>> {
    entries
        .iter()
        .map(|entry| entry_json(entry, resolved))
        .collect()
}

pub fn page_json(page: &EntryPage) -> anyhow::Result<serde_json::Value> {
    Ok(serde_json::to_value(page)?)
}
