//! Predicates and the where-clause compiler.
//!
//! A where map is an ordered list of `column -> predicate` entries joined
//! with `and`. Loose JSON input is validated into [`Predicate`] once, when
//! the descriptor is built; compilation never re-inspects raw objects.

use crate::error::{ImpalaError, Result};
use crate::query::escape::escape;
use crate::value::SqlValue;
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Partition-keyed date column that gets a mirrored predicate
pub const PARTITION_COLUMN: &str = "report_date";

/// Storage partition column correlated with [`PARTITION_COLUMN`]
pub const PARTITION_FLAG_COLUMN: &str = "date_flag";

/// Comparison operator with its operand
#[derive(Debug, Clone, PartialEq)]
pub enum Operator {
    Between(SqlValue, SqlValue),
    Like(SqlValue),
    Ne(SqlValue),
    In(SqlValue),
    NotIn(SqlValue),
    Gt(SqlValue),
    Lt(SqlValue),
}

impl Operator {
    /// Build an operator from its key and loose operand.
    ///
    /// Keys may carry a leading `$`. Returns `None` for unknown keys.
    pub fn from_key(key: &str, operand: &Value) -> Option<Self> {
        let key = key.strip_prefix('$').unwrap_or(key);
        let op = match key {
            "between" => {
                let (lo, hi) = match operand {
                    Value::Array(items) => (
                        items.first().map(SqlValue::from).unwrap_or(SqlValue::Null),
                        items.get(1).map(SqlValue::from).unwrap_or(SqlValue::Null),
                    ),
                    other => (SqlValue::from(other), SqlValue::Null),
                };
                Operator::Between(lo, hi)
            }
            "like" => Operator::Like(operand.into()),
            "ne" => Operator::Ne(operand.into()),
            "in" => Operator::In(operand.into()),
            "notIn" => Operator::NotIn(operand.into()),
            "gt" => Operator::Gt(operand.into()),
            "lt" => Operator::Lt(operand.into()),
            _ => return None,
        };
        Some(op)
    }

    fn render(&self, column: &str) -> String {
        match self {
            Operator::Between(lo, hi) => {
                format!("{column} between {} and {}", escape(lo), escape(hi))
            }
            Operator::Like(v) => format!("{column} like {}", escape(v)),
            Operator::Ne(v) => format!("{column} != {}", escape(v)),
            Operator::In(v) => format!("{column} in ({})", escape(v)),
            Operator::NotIn(v) => format!("{column} not in ({})", escape(v)),
            Operator::Gt(v) => format!("{column} > {}", escape(v)),
            Operator::Lt(v) => format!("{column} < {}", escape(v)),
        }
    }
}

/// One column-level filter
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq(SqlValue),
    Op(Operator),
}

impl Predicate {
    /// Interpret a loose JSON value.
    ///
    /// Objects are operator specs and only their first key is honored.
    /// Returns `None` when that key is not a known operator (or the object is
    /// empty); such entries produce no SQL.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Object(spec) => {
                let (key, operand) = spec.iter().next()?;
                let op = Operator::from_key(key, operand);
                if op.is_none() {
                    log::debug!("Ignoring unsupported operator '{key}'");
                }
                op.map(Predicate::Op)
            }
            other => Some(Predicate::Eq(other.into())),
        }
    }

    fn render(&self, column: &str) -> String {
        match self {
            Predicate::Eq(v) => format!("{column} = {}", escape(v)),
            Predicate::Op(op) => op.render(column),
        }
    }

    fn is_mirrored(&self) -> bool {
        matches!(self, Predicate::Eq(_) | Predicate::Op(Operator::Between(..)))
    }
}

macro_rules! impl_eq_predicate {
    ($($t:ty),*) => {
        $(impl From<$t> for Predicate {
            fn from(v: $t) -> Self {
                Predicate::Eq(v.into())
            }
        })*
    };
}

impl_eq_predicate!(
    SqlValue,
    i32,
    i64,
    u32,
    u64,
    f64,
    bool,
    &str,
    String,
    chrono::NaiveDate
);

impl From<Operator> for Predicate {
    fn from(op: Operator) -> Self {
        Predicate::Op(op)
    }
}

/// Insertion-ordered `column -> predicate` map
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredicateMap {
    entries: IndexMap<String, Predicate>,
}

impl PredicateMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a predicate. Replacing keeps the original position.
    pub fn insert(&mut self, column: impl Into<String>, predicate: impl Into<Predicate>) {
        self.entries.insert(column.into(), predicate.into());
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with(mut self, column: impl Into<String>, predicate: impl Into<Predicate>) -> Self {
        self.insert(column, predicate);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Predicate)> {
        self.entries.iter()
    }

    /// Build from an ordered JSON object, dropping unsupported operators.
    pub fn from_json_map(map: &Map<String, Value>) -> Self {
        let entries = map
            .iter()
            .filter_map(|(column, value)| {
                Predicate::from_json(value).map(|p| (column.clone(), p))
            })
            .collect();
        Self { entries }
    }

    /// Build from any JSON value; `null` means no predicates.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Self::new()),
            Value::Object(map) => Ok(Self::from_json_map(map)),
            other => Err(ImpalaError::InvalidDescriptor(format!(
                "where must be an object, got {other}"
            ))),
        }
    }
}

/// Compile a where map into `""` or `"where <expr>"`.
///
/// Entries render in insertion order and are joined with `" and "`. Plain
/// equality and `between` on [`PARTITION_COLUMN`] are followed by the same
/// predicate against [`PARTITION_FLAG_COLUMN`].
pub fn compile_where(predicates: &PredicateMap) -> String {
    let mut fragments = Vec::with_capacity(predicates.len());
    for (column, predicate) in predicates.iter() {
        fragments.push(predicate.render(column));
        if column == PARTITION_COLUMN && predicate.is_mirrored() {
            fragments.push(predicate.render(PARTITION_FLAG_COLUMN));
        }
    }

    if fragments.is_empty() {
        String::new()
    } else {
        format!("where {}", fragments.join(" and "))
    }
}
