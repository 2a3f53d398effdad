//! Schema-driven coercion of result rows.
//!
//! The engine delivers most values as strings. Columns declared `int` or
//! `bigint` are parsed as integers and `double` columns as floats, reading
//! the longest numeric prefix of the text. Values that do not parse become
//! `null` instead of failing the query, because the declared type and the
//! delivered representation are known to disagree at times.

use crate::connection::ResultsMetadata;
use indexmap::IndexMap;
use serde_json::{Map, Number, Value};

/// One result row, keyed by column name in engine order
pub type Row = Map<String, Value>;

/// Column name -> declared type, fetched fresh for every statement
pub type SchemaMap = IndexMap<String, String>;

/// Flatten result metadata into a [`SchemaMap`].
pub fn schema_map(metadata: &ResultsMetadata) -> SchemaMap {
    metadata
        .schema
        .field_schemas
        .iter()
        .map(|field| (field.name.clone(), field.type_name.clone()))
        .collect()
}

/// Coerce every row against the schema.
pub fn coerce_rows(schema: &SchemaMap, rows: Vec<Row>) -> Vec<Row> {
    rows.into_iter().map(|row| coerce_row(schema, row)).collect()
}

/// Coerce one row. Columns missing from the schema pass through.
pub fn coerce_row(schema: &SchemaMap, row: Row) -> Row {
    row.into_iter()
        .map(|(column, value)| {
            let coerced = match schema.get(&column).map(String::as_str) {
                Some("int") | Some("bigint") => to_integer(&value),
                Some("double") => to_float(&value),
                _ => value,
            };
            (column, coerced)
        })
        .collect()
}

fn to_integer(value: &Value) -> Value {
    let parsed = match value {
        Value::String(s) => parse_int_prefix(s),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(IntOrFloat::Int(i)),
            None => n.as_f64().map(|f| IntOrFloat::from_truncated(f.trunc())),
        },
        _ => None,
    };
    match parsed {
        Some(IntOrFloat::Int(i)) => Value::from(i),
        Some(IntOrFloat::Float(f)) => float_value(f),
        None => Value::Null,
    }
}

fn to_float(value: &Value) -> Value {
    let parsed = match value {
        Value::String(s) => parse_float_prefix(s),
        Value::Number(n) => n.as_f64(),
        _ => None,
    };
    parsed.map_or(Value::Null, float_value)
}

fn float_value(f: f64) -> Value {
    Number::from_f64(f).map_or(Value::Null, Value::Number)
}

enum IntOrFloat {
    Int(i64),
    Float(f64),
}

impl IntOrFloat {
    /// Whole numbers inside the i64 range become integers
    fn from_truncated(f: f64) -> Self {
        if f >= i64::MIN as f64 && f < i64::MAX as f64 {
            IntOrFloat::Int(f as i64)
        } else {
            IntOrFloat::Float(f)
        }
    }
}

/// Leading `[+-]?digits` after optional whitespace.
///
/// Values beyond the i64 range come back as floats.
fn parse_int_prefix(s: &str) -> Option<IntOrFloat> {
    let s = s.trim_start();
    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    let digits = unsigned.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let end = s.len() - unsigned.len() + digits;
    let text = &s[..end];
    match text.parse::<i64>() {
        Ok(i) => Some(IntOrFloat::Int(i)),
        Err(_) => text.parse::<f64>().ok().map(IntOrFloat::Float),
    }
}

/// Longest leading decimal float literal after optional whitespace.
fn parse_float_prefix(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        i += 1;
    }
    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut mantissa_digits = i - int_start;
    if i < bytes.len() && bytes[i] == b'.' {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        mantissa_digits += j - frac_start;
        if mantissa_digits > 0 {
            i = j;
        }
    }
    if mantissa_digits == 0 {
        return None;
    }
    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        let mut j = i + 1;
        if j < bytes.len() && matches!(bytes[j], b'+' | b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }
    s[..i].parse::<f64>().ok()
}
