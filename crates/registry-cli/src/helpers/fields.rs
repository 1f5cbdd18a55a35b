//! Conversion of command arguments into core request types.

use registry_core::storage::{CodedField, CodedPatch, EntryPatch, VisitDetails};
use registry_core::FilterCriteria;

use crate::cli::{AddArgs, EditArgs, FilterArgs, VisitFieldArgs};
use crate::errors::CliError;

use super::parsing::{parse_date, parse_gender};

fn coded(code: &Option<String>, other: &Option<String>) -> CodedField {
    CodedField::new(code.clone(), other.clone())
}

fn coded_patch(code: &Option<String>, other: &Option<String>) -> CodedPatch {
    CodedPatch {
        code: code.clone(),
        other: other.clone(),
    }
}

fn apply_fields(details: VisitDetails, fields: &VisitFieldArgs) -> VisitDetails {
    let mut details = details
        .with_address(coded(&fields.address, &fields.other_address))
        .with_job(coded(&fields.job, &fields.other_job))
        .with_visit_reason(coded(&fields.visit_reason, &fields.other_visit_reason))
        .with_radiology_report(coded(
            &fields.radiology_report,
            &fields.other_radiology_report,
        ));
    if let Some(phone) = &fields.phone {
        details = details.with_phone(phone.clone());
    }
    details
}

/// Visit details for `add`. Field rules are enforced by the store.
pub fn details_from_args(args: &AddArgs) -> anyhow::Result<VisitDetails> {
    let gender = parse_gender(&args.gender)?;
    let details = VisitDetails::new(&args.name, args.birth_year, gender, &args.dose);
    Ok(apply_fields(details, &args.fields))
}

/// Patch for `edit`; an empty `--phone ""` clears the phone number.
pub fn patch_from_args(args: &EditArgs) -> anyhow::Result<EntryPatch> {
    let fields = &args.fields;
    let patch = EntryPatch {
        full_name: args.name.clone(),
        address: coded_patch(&fields.address, &fields.other_address),
        job: coded_patch(&fields.job, &fields.other_job),
        visit_reason: coded_patch(&fields.visit_reason, &fields.other_visit_reason),
        radiology_report: coded_patch(&fields.radiology_report, &fields.other_radiology_report),
        birth_year: args.birth_year,
        gender: args.gender.as_deref().map(parse_gender).transpose()?,
        phone: fields.phone.clone(),
        radiation_dose: args.dose.clone(),
    };
    if patch.is_empty() {
        return Err(CliError::invalid_input_with_hint(
            "Nothing to change",
            "Hint: Pass at least one field, e.g. --name or --phone.",
        )
        .into());
    }
    Ok(patch)
}

pub fn criteria_from_args(args: &FilterArgs) -> anyhow::Result<FilterCriteria> {
    Ok(FilterCriteria {
        search: args.search.clone(),
        created_from: args.from.as_deref().map(parse_date).transpose()?,
        created_to: args.to.as_deref().map(parse_date).transpose()?,
        birth_year_from: args.birth_year_from,
        birth_year_to: args.birth_year_to,
        age_from: args.age_from,
        age_to: args.age_to,
        gender: args.gender.as_deref().map(parse_gender).transpose()?,
        address: args.address.clone(),
        other_address: args.other_address.clone(),
        job: args.job.clone(),
        other_job: args.other_job.clone(),
        visit_reason: args.visit_reason.clone(),
        other_visit_reason: args.other_visit_reason.clone(),
        radiology_report: args.radiology_report.clone(),
        other_radiology_report: args.other_radiology_report.clone(),
    })
}
