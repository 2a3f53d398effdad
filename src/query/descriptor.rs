//! Object-shaped query descriptors.
//!
//! Descriptors can be built fluently or deserialized from JSON. JSON input is
//! validated here, so everything downstream works with typed predicates.

use crate::error::{ImpalaError, Result};
use crate::query::clause::Attribute;
use crate::query::predicate::{Predicate, PredicateMap};
use serde::Deserialize;
use serde_json::Value;

/// Projection, filter, grouping, ordering and paging for one query.
///
/// Every part is optional; an absent part emits no clause.
///
/// # Example
///
/// ```
/// use impala_lite::{QueryDescriptor, Operator};
///
/// let descriptor = QueryDescriptor::new()
///     .attribute("shop_id")
///     .attribute(("sum(amount)", "total"))
///     .filter("report_date", Operator::Between("2024-01-01".into(), "2024-01-31".into()))
///     .group_by("shop_id")
///     .order_by("total desc")
///     .limit(10);
/// assert_eq!(descriptor.group, vec!["shop_id".to_string()]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "RawDescriptor")]
pub struct QueryDescriptor {
    pub attributes: Vec<Attribute>,
    pub predicates: PredicateMap,
    pub group: Vec<String>,
    pub order: Vec<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl QueryDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attribute(mut self, attribute: impl Into<Attribute>) -> Self {
        self.attributes.push(attribute.into());
        self
    }

    pub fn filter(mut self, column: impl Into<String>, predicate: impl Into<Predicate>) -> Self {
        self.predicates.insert(column, predicate);
        self
    }

    /// Add a group column. Empty strings are ignored.
    pub fn group_by(mut self, column: impl Into<String>) -> Self {
        let column = column.into();
        if !column.is_empty() {
            self.group.push(column);
        }
        self
    }

    /// Add an order expression. Empty strings are ignored.
    pub fn order_by(mut self, expression: impl Into<String>) -> Self {
        let expression = expression.into();
        if !expression.is_empty() {
            self.order.push(expression);
        }
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Build a descriptor from its loose JSON form.
    pub fn from_json(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| ImpalaError::InvalidDescriptor(e.to_string()))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAttribute {
    Column(String),
    Pair(Vec<Option<String>>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl From<OneOrMany> for Vec<String> {
    fn from(v: OneOrMany) -> Self {
        let list = match v {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(list) => list,
        };
        list.into_iter().filter(|item| !item.is_empty()).collect()
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDescriptor {
    #[serde(default)]
    attributes: Vec<RawAttribute>,
    #[serde(default, rename = "where")]
    predicates: Value,
    group: Option<OneOrMany>,
    order: Option<OneOrMany>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl TryFrom<RawDescriptor> for QueryDescriptor {
    type Error = ImpalaError;

    fn try_from(raw: RawDescriptor) -> Result<Self> {
        let attributes = raw
            .attributes
            .into_iter()
            .map(|attr| match attr {
                RawAttribute::Column(column) => Ok(Attribute::new(column)),
                RawAttribute::Pair(pair) => {
                    let n = pair.len();
                    let mut parts = pair.into_iter();
                    match (parts.next().flatten(), parts.next().flatten(), n) {
                        (Some(column), alias, 1 | 2) => Ok(Attribute {
                            column,
                            alias: alias.filter(|a| !a.is_empty()),
                        }),
                        (None, _, 1 | 2) => Err(ImpalaError::InvalidDescriptor(
                            "attribute column cannot be null".to_string(),
                        )),
                        _ => Err(ImpalaError::InvalidDescriptor(format!(
                            "attribute must be [column] or [column, alias], got {n} elements"
                        ))),
                    }
                }
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            attributes,
            predicates: PredicateMap::from_json(&raw.predicates)?,
            group: raw.group.map(Vec::from).unwrap_or_default(),
            order: raw.order.map(Vec::from).unwrap_or_default(),
            limit: raw.limit,
            offset: raw.offset,
        })
    }
}
