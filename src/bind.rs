//! `$name` placeholder substitution for hand-written SQL templates.
//!
//! This pass is independent of the descriptor compiler. Values render as
//! single-quoted strings unless the bind entry asks for numeric rendering.
//! Like [`escape`](crate::query::escape), string rendering does not double
//! embedded quotes.
//!
//! Two substitution modes exist:
//!
//! - [`format_bind_parameters`] replaces every literal `$name` occurrence,
//!   in map order. A name that prefixes another (`$id` and `$identity`) also
//!   rewrites the start of the longer placeholder.
//! - [`format_bind_parameters_strict`] only replaces `$name` when the next
//!   character cannot continue an identifier, which disambiguates prefixes.

use crate::value::SqlValue;
use indexmap::IndexMap;
use regex::{NoExpand, Regex};

/// How a bind value is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindKind {
    /// `'a','b'`
    #[default]
    String,
    /// `1,2`
    Number,
}

impl BindKind {
    /// Map a loose type name. Only `"number"` selects numeric rendering.
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "number" => BindKind::Number,
            _ => BindKind::String,
        }
    }
}

/// One bind entry
#[derive(Debug, Clone, PartialEq)]
pub struct BindValue {
    pub kind: BindKind,
    pub value: SqlValue,
}

impl BindValue {
    pub fn string(value: impl Into<SqlValue>) -> Self {
        Self {
            kind: BindKind::String,
            value: value.into(),
        }
    }

    pub fn number(value: impl Into<SqlValue>) -> Self {
        Self {
            kind: BindKind::Number,
            value: value.into(),
        }
    }

    /// Interpret a loose JSON bind entry: `{type, value}` objects pick the
    /// kind, anything else is a string-mode raw value.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value.as_object() {
            Some(obj) => {
                let kind = obj
                    .get("type")
                    .and_then(|t| t.as_str())
                    .map(BindKind::from_type_name)
                    .unwrap_or_default();
                let value = obj.get("value").map(SqlValue::from).unwrap_or(SqlValue::Null);
                Self { kind, value }
            }
            None => Self::string(SqlValue::from(value)),
        }
    }

    fn render(&self) -> String {
        let items: Vec<String> = match &self.value {
            SqlValue::List(items) => items.iter().map(SqlValue::to_plain_text).collect(),
            scalar => vec![scalar.to_plain_text()],
        };
        match self.kind {
            BindKind::String => format!("'{}'", items.join("','")),
            BindKind::Number => items.join(","),
        }
    }
}

/// Ordered placeholder name -> bind entry map
pub type BindMap = IndexMap<String, BindValue>;

/// Build a [`BindMap`] from a JSON object, keeping key order.
pub fn bind_map_from_json(map: &serde_json::Map<String, serde_json::Value>) -> BindMap {
    map.iter()
        .map(|(name, value)| (name.clone(), BindValue::from_json(value)))
        .collect()
}

/// Replace every `$name` with its rendered value.
pub fn format_bind_parameters(sql: &str, binds: &BindMap) -> String {
    substitute(sql, binds, |name| format!(r"\${}", regex::escape(name)))
}

/// Like [`format_bind_parameters`], but `$name` must not be followed by an
/// identifier character.
pub fn format_bind_parameters_strict(sql: &str, binds: &BindMap) -> String {
    substitute(sql, binds, |name| {
        let ends_in_word = name
            .chars()
            .last()
            .is_some_and(|c| c.is_alphanumeric() || c == '_');
        if ends_in_word {
            format!(r"\${}\b", regex::escape(name))
        } else {
            format!(r"\${}", regex::escape(name))
        }
    })
}

fn substitute(sql: &str, binds: &BindMap, pattern: impl Fn(&str) -> String) -> String {
    let mut out = sql.to_string();
    for (name, bind) in binds {
        let re = match Regex::new(&pattern(name)) {
            Ok(re) => re,
            Err(e) => {
                log::warn!("Skipping bind '{name}': {e}");
                continue;
            }
        };
        let rendered = bind.render();
        out = re.replace_all(&out, NoExpand(&rendered)).into_owned();
    }
    out
}
