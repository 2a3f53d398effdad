//! Connection pool for engine sessions.
//!
//! Connections move `created -> idle -> borrowed -> idle -> ... -> destroyed`.
//! They are destroyed from idle (eviction or drain) or on release after a
//! drain has started. A failed query does not destroy its connection.

pub mod config;
mod manager;
mod types;
mod worker;

pub use manager::ConnectionPool;
pub use types::{DrainReport, PoolStatus, PooledConnection};
