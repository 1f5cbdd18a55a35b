//! Display labels for coded values.

use crate::storage::types::{CodedField, Gender};

/// Which coded field a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodedKind {
    Address,
    Job,
    VisitReason,
    RadiologyReport,
}

/// Visit reason codes and their labels.
pub const VISIT_REASONS: &[(&str, &str)] = &[
    ("medical-examination", "Tibbiy ko'rik"),
    ("paid-medical-examination", "Pulli tibbiy ko'rik"),
    ("marriage", "Nikoh"),
    ("labor-migrant", "Mehnat muxojiri"),
    ("mental-illness", "Ruxiy kasallik"),
    ("chronic-alcoholism", "Surunkali alkogolizm"),
    ("released-from-prison", "Ozodlikka chiqqan"),
    ("drug-addict", "Giyohvand"),
    ("diabetes", "Qandli diabet"),
    ("dispensary-registered", "Dispanser hisobida turuvchi"),
    ("hormone-receiver", "Gormon oluvchi"),
    ("gastric-ulcer-disease", "Oshqozon yara kasalligi"),
    ("chronic-lung-disease", "Surunkali o'pka kasalligi"),
    ("respiratory-complaint", "Nafas olish organlarida shikoyat"),
    ("tb-contact", "Sil bo'lganlar bilan kontakt"),
    ("living-alone", "Yolg'iz yashovchi"),
];

/// Label for a known code, if the catalog has one.
pub fn label_for(kind: CodedKind, code: &str) -> Option<&'static str> {
    let table = match kind {
        CodedKind::VisitReason => VISIT_REASONS,
        CodedKind::Address | CodedKind::Job | CodedKind::RadiologyReport => return None,
    };
    table
        .iter()
        .find(|(key, _)| *key == code)
        .map(|(_, label)| *label)
}

/// Text shown for a coded field.
///
/// The `"other"` sentinel resolves to its free-text overlay; any other code
/// resolves to its label, or to the code itself when the catalog has none.
pub fn display_value(kind: CodedKind, field: &CodedField) -> Option<String> {
    if field.is_other() {
        return field.other.clone();
    }
    let code = field.code.as_deref()?;
    Some(label_for(kind, code).unwrap_or(code).to_string())
}

pub fn gender_label(gender: Gender) -> &'static str {
    match gender {
        Gender::Male => "Erkak",
        Gender::Female => "Ayol",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_visit_reason_uses_label() {
        let field = CodedField::coded("tb-contact");
        assert_eq!(
            display_value(CodedKind::VisitReason, &field).as_deref(),
            Some("Sil bo'lganlar bilan kontakt")
        );
    }

    #[test]
    fn test_unknown_code_falls_back_to_code() {
        let field = CodedField::coded("chilonzor-7");
        assert_eq!(
            display_value(CodedKind::Address, &field).as_deref(),
            Some("chilonzor-7")
        );
    }

    #[test]
    fn test_other_sentinel_uses_overlay() {
        let field = CodedField::other("Night watchman");
        assert_eq!(
            display_value(CodedKind::Job, &field).as_deref(),
            Some("Night watchman")
        );
        assert_eq!(display_value(CodedKind::Job, &CodedField::default()), None);
    }

    #[test]
    fn test_catalog_has_sixteen_reasons() {
        assert_eq!(VISIT_REASONS.len(), 16);
        assert_eq!(gender_label(Gender::Female), "Ayol");
    }
}
