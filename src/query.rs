//! Descriptor-to-SQL compilation.
//!
//! Leaves first: [`escape`] renders literals, [`predicate`] and [`clause`]
//! compile individual fragments, and [`assembler`] joins them into
//! statements.

pub mod assembler;
pub mod clause;
pub mod descriptor;
pub mod escape;
pub mod predicate;

pub use assembler::{build_count_sql, build_select_sql};
pub use clause::{compile_group, compile_limit, compile_order, compile_select, Attribute};
pub use descriptor::QueryDescriptor;
pub use escape::escape;
pub use predicate::{compile_where, Operator, Predicate, PredicateMap};
