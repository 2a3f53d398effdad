//! Literal rendering for generated SQL.
//!
//! # Known injection vector
//!
//! Text values are wrapped in single quotes as-is. Embedded quotes are NOT
//! doubled, so `O'Brien` renders as `'O'Brien'` and a hostile value can
//! terminate the literal early. The generated text is relied upon byte for
//! byte by existing callers, so this is left as observed. Only pass values
//! from trusted sources, or validate them before building a descriptor.

use crate::value::{float_text, SqlValue};

/// Render a value as SQL literal text.
///
/// - `Null` renders `NULL`
/// - booleans render unquoted
/// - numbers render unquoted, in their shortest round-trip form, with
///   exponent notation for very large or very small magnitudes
/// - lists render comma-joined; nested lists become parenthesized groups
/// - text renders single-quoted, without escaping (see module docs)
pub fn escape(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => "NULL".to_string(),
        SqlValue::Bool(true) => "true".to_string(),
        SqlValue::Bool(false) => "false".to_string(),
        SqlValue::Int(i) => i.to_string(),
        SqlValue::Float(f) => float_text(*f),
        SqlValue::List(items) => list_to_sql(items),
        SqlValue::Text(s) => format!("'{s}'"),
    }
}

fn list_to_sql(items: &[SqlValue]) -> String {
    items
        .iter()
        .map(|item| match item {
            SqlValue::List(inner) => format!("({})", list_to_sql(inner)),
            other => escape(other),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
