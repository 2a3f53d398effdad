//! # impala-lite
//!
//! Coroutine-native query layer for Impala using the `may` runtime.
//!
//! - [`query`] compiles object-shaped [`QueryDescriptor`]s into SQL text
//! - [`bind`] substitutes `$name` placeholders in hand-written templates
//! - [`pool`] keeps a bounded set of engine sessions
//! - [`executor`] runs statements on pooled sessions and coerces rows
//!   against freshly fetched result metadata
//! - [`model`] binds all of it to a table as `find_all` / `find_and_count_all`
//!
//! The wire protocol itself is provided by a driver implementing
//! [`ConnectionFactory`].
//!
//! ```no_run
//! use impala_lite::{
//!     ConnectionFactory, ConnectionPool, ImpalaLiteConfig, ImpalaModel, PooledExecutor,
//!     QueryDescriptor,
//! };
//!
//! fn report<F: ConnectionFactory>(factory: F) -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ImpalaLiteConfig::load()?;
//!     let pool = ConnectionPool::new(factory, config.connection, config.pool)?;
//!     let executor = PooledExecutor::new(pool.clone());
//!
//!     let sales = ImpalaModel::new("Sales", "dw.sales");
//!     let page = sales.find_and_count_all(
//!         &executor,
//!         &QueryDescriptor::new().attribute("shop_id").filter("report_date", "2024-01-01").limit(20),
//!     )?;
//!     println!("{} of {}", page.data.len(), page.total);
//!
//!     pool.drain();
//!     Ok(())
//! }
//! ```

pub mod bind;
pub mod coerce;
pub mod config;
pub mod connection;
pub mod error;
pub mod executor;
#[cfg(any(feature = "metrics", feature = "tracing"))]
pub mod metrics;
pub mod model;
pub mod pool;
pub mod query;
pub mod value;

#[cfg(test)]
mod test_helpers;

pub use bind::{
    bind_map_from_json, format_bind_parameters, format_bind_parameters_strict, BindKind, BindMap,
    BindValue,
};
pub use coerce::{Row, SchemaMap};
pub use config::{ConnectionConfig, ImpalaLiteConfig, PoolConfig};
pub use connection::{
    ConnectionFactory, FieldSchema, ImpalaConnection, QueryOptions, ResultSchema, ResultsMetadata,
};
pub use error::{DriverError, ImpalaError, Result};
pub use executor::{PooledExecutor, QueryExecutor};
pub use model::{FindAndCountAll, ImpalaModel, ModelRegistry};
pub use pool::{ConnectionPool, DrainReport, PoolStatus, PooledConnection};
pub use query::{Attribute, Operator, Predicate, PredicateMap, QueryDescriptor};
pub use value::SqlValue;
