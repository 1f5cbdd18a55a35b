//! Rendering of filter predicates to SQL.

use rusqlite::types::Value;

use super::row::format_timestamp;
use crate::filter::{Column, Operand, Predicate};

/// Name of the SQL function backing [`Predicate::Contains`].
pub const CONTAINS_FN: &str = "contains_ci";

pub fn column_name(column: Column) -> &'static str {
    match column {
        Column::FullName => "full_name",
        Column::Phone => "phone",
        Column::Address => "address",
        Column::OtherAddress => "other_address",
        Column::Job => "job",
        Column::OtherJob => "other_job",
        Column::VisitReason => "visit_reason",
        Column::OtherVisitReason => "other_visit_reason",
        Column::RadiologyReport => "radiology_report",
        Column::OtherRadiologyReport => "other_radiology_report",
        Column::Gender => "gender",
        Column::CreatedAt => "created_at",
        Column::BirthYear => "birth_year",
        Column::Age => "age",
    }
}

/// Render a predicate to a `WHERE` clause and its positional parameters.
pub fn render_predicate(predicate: &Predicate) -> (String, Vec<Value>) {
    let mut sql = String::new();
    let mut params = Vec::new();
    render_into(predicate, &mut sql, &mut params);
    (sql, params)
}

fn render_into(predicate: &Predicate, sql: &mut String, params: &mut Vec<Value>) {
    match predicate {
        Predicate::All => sql.push_str("1 = 1"),
        Predicate::And(parts) => render_group(parts, " AND ", "1 = 1", sql, params),
        Predicate::AnyOf(parts) => render_group(parts, " OR ", "0 = 1", sql, params),
        Predicate::Contains { column, needle } => {
            sql.push_str(&format!("{}({}, ?)", CONTAINS_FN, column_name(*column)));
            params.push(Value::Text(needle.clone()));
        }
        Predicate::Equals { column, value } => {
            sql.push_str(&format!("{} = ?", column_name(*column)));
            params.push(operand_value(value));
        }
        Predicate::Range {
            column,
            lower,
            upper,
        } => {
            let name = column_name(*column);
            let mut bounds = Vec::new();
            if let Some(lower) = lower {
                bounds.push(format!("{} >= ?", name));
                params.push(operand_value(lower));
            }
            if let Some(upper) = upper {
                bounds.push(format!("{} <= ?", name));
                params.push(operand_value(upper));
            }
            if bounds.is_empty() {
                sql.push_str("1 = 1");
            } else {
                sql.push('(');
                sql.push_str(&bounds.join(" AND "));
                sql.push(')');
            }
        }
    }
}

fn render_group(
    parts: &[Predicate],
    separator: &str,
    empty: &str,
    sql: &mut String,
    params: &mut Vec<Value>,
) {
    if parts.is_empty() {
        sql.push_str(empty);
        return;
    }
    sql.push('(');
    for (idx, part) in parts.iter().enumerate() {
        if idx > 0 {
            sql.push_str(separator);
        }
        render_into(part, sql, params);
    }
    sql.push(')');
}

fn operand_value(operand: &Operand) -> Value {
    match operand {
        Operand::Text(value) => Value::Text(value.clone()),
        Operand::Int(value) => Value::Integer(*value),
        Operand::Instant(value) => Value::Text(format_timestamp(value)),
    }
}
