//! Text and table output formatting for entries.

use comfy_table::presets::NOTHING;
use comfy_table::{ContentArrangement, Table};

use registry_core::catalog::{display_value, gender_label, CodedKind};
use registry_core::storage::{CodedField, Entry};
use registry_core::{BusinessCalendar, EntryPage, LedgerTotals};

use crate::helpers::OutputFormat;

const NAME_MAX: usize = 32;
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    let mut out: String = value.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

fn shown(kind: CodedKind, field: &CodedField) -> String {
    display_value(kind, field).unwrap_or_else(|| "-".to_string())
}

fn local_time(entry: &Entry, calendar: &BusinessCalendar) -> String {
    entry
        .created_at
        .with_timezone(&calendar.timezone())
        .format(DATE_FORMAT)
        .to_string()
}

fn page_rows(page: &EntryPage, calendar: &BusinessCalendar) -> Vec<Vec<String>> {
    page.entries
        .iter()
        .map(|listed| {
            let entry = &listed.entry;
            vec![
                entry.counters.yearly_count.to_string(),
                entry.counters.film_number.to_string(),
                entry.counters.daily_count.to_string(),
                local_time(entry, calendar),
                truncate(&entry.details.full_name, NAME_MAX),
                entry.age.to_string(),
                shown(CodedKind::VisitReason, &entry.details.visit_reason),
                if listed.is_deletable { "*" } else { "" }.to_string(),
                entry.id.to_string(),
            ]
        })
        .collect()
}

/// Print one page of a listing.
pub fn print_entry_page(
    page: &EntryPage,
    calendar: &BusinessCalendar,
    format: OutputFormat,
    quiet: bool,
) {
    if page.entries.is_empty() {
        if !quiet {
            println!("No entries found.");
        }
        return;
    }

    let rows = page_rows(page, calendar);
    match format {
        OutputFormat::Table => {
            let mut table = Table::new();
            table.load_preset(NOTHING);
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec![
                "YEAR", "FILM", "DAY", "CREATED", "NAME", "AGE", "REASON", "TAIL", "ID",
            ]);
            for i in 0..9 {
                if let Some(column) = table.column_mut(i) {
                    column.set_padding((0, 2));
                }
            }
            for row in rows {
                table.add_row(row);
            }
            println!("{}", table);
            if !quiet {
                println!(
                    "Page {} of {} ({} entries)",
                    page.page, page.total_pages, page.total_count
                );
            }
        }
        OutputFormat::Plain => {
            for row in rows {
                println!("{}", row.join("\t"));
            }
        }
    }
}

/// Print a single entry as labelled lines.
pub fn print_entry(entry: &Entry, calendar: &BusinessCalendar, quiet: bool) {
    let details = &entry.details;
    if !quiet {
        println!("ID: {}", entry.id);
        println!(
            "Counters: yearly {} | film {} | daily {}",
            entry.counters.yearly_count, entry.counters.film_number, entry.counters.daily_count
        );
        println!("Created: {}", local_time(entry, calendar));
        println!();
    }
    println!("Name: {}", details.full_name);
    println!("Birth year: {} (age {})", details.birth_year, entry.age);
    println!("Gender: {}", gender_label(details.gender));
    println!("Phone: {}", details.phone.as_deref().unwrap_or("-"));
    println!("Address: {}", shown(CodedKind::Address, &details.address));
    println!("Job: {}", shown(CodedKind::Job, &details.job));
    println!(
        "Visit reason: {}",
        shown(CodedKind::VisitReason, &details.visit_reason)
    );
    println!(
        "Radiology report: {}",
        shown(CodedKind::RadiologyReport, &details.radiology_report)
    );
    println!("Radiation dose: {}", details.radiation_dose);
}

pub fn print_totals(totals: &LedgerTotals) {
    println!(
        "Registry now holds {} entries ({} pages)",
        totals.total_count, totals.total_pages
    );
}
