//! Query execution over pooled connections.
//!
//! Each query borrows one connection for exactly one metadata fetch and one
//! execution, then returns it on every exit path. Schemas are fetched per
//! statement and never cached.

use crate::bind::{format_bind_parameters, BindMap};
use crate::coerce::{coerce_rows, schema_map, Row};
use crate::connection::{ConnectionFactory, ImpalaConnection, QueryOptions};
use crate::error::{ImpalaError, Result};
use crate::pool::ConnectionPool;
use std::time::Instant;

#[cfg(feature = "metrics")]
use crate::metrics::METRICS;
#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;

/// Runs SQL text and returns coerced rows.
///
/// Implemented by [`PooledExecutor`]; models only depend on this trait, so
/// tests and alternative transports can stand in for the pool.
pub trait QueryExecutor: Send + Sync {
    fn query(&self, sql: &str, options: Option<&QueryOptions>) -> Result<Vec<Row>>;

    /// Substitute `$name` placeholders, then run the statement.
    fn query_template(&self, template: &str, binds: &BindMap) -> Result<Vec<Row>> {
        self.query(&format_bind_parameters(template, binds), None)
    }
}

/// [`QueryExecutor`] backed by a [`ConnectionPool`]
pub struct PooledExecutor<F: ConnectionFactory> {
    pool: ConnectionPool<F>,
}

impl<F: ConnectionFactory> PooledExecutor<F> {
    pub fn new(pool: ConnectionPool<F>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &ConnectionPool<F> {
        &self.pool
    }
}

impl<F: ConnectionFactory> QueryExecutor for PooledExecutor<F> {
    fn query(&self, sql: &str, options: Option<&QueryOptions>) -> Result<Vec<Row>> {
        let mut conn = self.pool.acquire()?;

        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::execute_query_span(sql).entered();

        log::info!("Executing: {sql}");
        let start = Instant::now();
        let result = run_on(&mut *conn, sql, options);

        #[cfg(feature = "metrics")]
        METRICS.record_query(start.elapsed(), result.is_ok());

        if let Err(e) = &result {
            log::warn!("Impala query exception: {e}");
        } else {
            log::debug!("Query finished in {:?}", start.elapsed());
        }
        self.pool.release(conn);
        result
    }
}

/// Fetch the schema, run the statement and coerce its rows.
fn run_on<C: ImpalaConnection>(
    conn: &mut C,
    sql: &str,
    options: Option<&QueryOptions>,
) -> Result<Vec<Row>> {
    let metadata = conn
        .results_metadata(sql)
        .map_err(|e| ImpalaError::MetadataFetchFailed(e.to_string()))?;
    let schema = schema_map(&metadata);
    let rows = conn
        .query(sql, options)
        .map_err(|e| ImpalaError::QueryExecFailed(e.to_string()))?;
    Ok(coerce_rows(&schema, rows))
}
