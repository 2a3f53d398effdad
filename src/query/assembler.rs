//! Statement assembly from compiled fragments.

use crate::query::clause::{compile_group, compile_limit, compile_order, compile_select};
use crate::query::descriptor::QueryDescriptor;
use crate::query::predicate::compile_where;

/// Projection used by the count statement of `find_and_count_all`
pub const COUNT_SELECT: &str = "select count(1) as count";

/// Column holding the total in the count statement's single row
pub const COUNT_COLUMN: &str = "count";

/// Join the non-empty fragments with newlines.
pub fn assemble<'a>(fragments: impl IntoIterator<Item = &'a str>) -> String {
    fragments
        .into_iter()
        .filter(|f| !f.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fragments shared by the detail and count statements
struct Compiled {
    from: String,
    where_: String,
    group: String,
}

impl Compiled {
    fn new(table: &str, descriptor: &QueryDescriptor) -> Self {
        Self {
            from: format!("from {table}"),
            where_: compile_where(&descriptor.predicates),
            group: compile_group(&descriptor.group),
        }
    }
}

/// Full select statement: projection, filter, grouping, ordering, paging.
pub fn build_select_sql(table: &str, descriptor: &QueryDescriptor) -> String {
    let shared = Compiled::new(table, descriptor);
    let select = compile_select(&descriptor.attributes);
    let order = compile_order(&descriptor.order);
    let limit = compile_limit(descriptor.limit, descriptor.offset);
    assemble([
        select.as_str(),
        shared.from.as_str(),
        shared.where_.as_str(),
        shared.group.as_str(),
        order.as_str(),
        limit.as_str(),
    ])
}

/// Count statement sharing the descriptor's from/where/group fragments.
///
/// With a group clause the engine returns one row per group.
pub fn build_count_sql(table: &str, descriptor: &QueryDescriptor) -> String {
    let shared = Compiled::new(table, descriptor);
    assemble([
        COUNT_SELECT,
        shared.from.as_str(),
        shared.where_.as_str(),
        shared.group.as_str(),
    ])
}
