//! Select list, group/order and paging clause fragments.
//!
//! Every compiler returns an empty string when there is nothing to emit so
//! the assembler can skip the fragment.

/// One projected column with an optional alias
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub column: String,
    pub alias: Option<String>,
}

impl Attribute {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            alias: None,
        }
    }

    pub fn aliased(column: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            alias: Some(alias.into()),
        }
    }

    /// Alias, falling back to the column expression itself when absent or empty
    pub fn alias(&self) -> &str {
        self.alias
            .as_deref()
            .filter(|alias| !alias.is_empty())
            .unwrap_or(&self.column)
    }
}

impl From<&str> for Attribute {
    fn from(column: &str) -> Self {
        Attribute::new(column)
    }
}

impl From<(&str, &str)> for Attribute {
    fn from((column, alias): (&str, &str)) -> Self {
        Attribute::aliased(column, alias)
    }
}

/// `select a as a, sum(x) as total`
///
/// An empty attribute list still yields `"select "`; supplying at least one
/// attribute is the caller's job.
pub fn compile_select(attributes: &[Attribute]) -> String {
    let list = attributes
        .iter()
        .map(|attr| format!("{} as {}", attr.column, attr.alias()))
        .collect::<Vec<_>>()
        .join(", ");
    format!("select {list}")
}

pub fn compile_group(columns: &[String]) -> String {
    prefixed_list("group by", columns)
}

pub fn compile_order(expressions: &[String]) -> String {
    prefixed_list("order by", expressions)
}

fn prefixed_list(prefix: &str, items: &[String]) -> String {
    let items: Vec<&str> = items
        .iter()
        .map(String::as_str)
        .filter(|item| !item.is_empty())
        .collect();
    if items.is_empty() {
        String::new()
    } else {
        format!("{prefix} {}", items.join(", "))
    }
}

/// `limit N offset M`, either part optional. Zero counts as absent.
pub fn compile_limit(limit: Option<u64>, offset: Option<u64>) -> String {
    let mut parts = Vec::with_capacity(2);
    if let Some(n) = limit.filter(|n| *n > 0) {
        parts.push(format!("limit {n}"));
    }
    if let Some(m) = offset.filter(|m| *m > 0) {
        parts.push(format!("offset {m}"));
    }
    parts.join(" ")
}
