//! Error taxonomy for the query layer.
//!
//! Errors that reach the caller carry the driver's original message; there is
//! no error-code translation layer.

use std::fmt;
use std::time::Duration;

/// Error reported by the external query-engine driver.
///
/// The driver only gives us a message, so that is all this carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverError {
    message: String,
}

impl DriverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for DriverError {}

/// Crate error type
#[derive(Debug, Clone, PartialEq)]
pub enum ImpalaError {
    /// The driver could not establish a session
    ConnectFailed(String),
    /// No connection became available within the acquire window
    AcquireTimeout(Duration),
    /// The pool is draining or drained and hands out no more connections
    PoolClosed,
    /// Result-set metadata could not be fetched
    MetadataFetchFailed(String),
    /// The statement itself failed
    QueryExecFailed(String),
    /// Returning a connection to the pool failed. Never surfaced to query callers.
    ReleaseFailed(String),
    /// The drain or clear phase of a pool shutdown failed
    DrainPartialFailure(String),
    /// A query descriptor could not be built from its loose representation
    InvalidDescriptor(String),
    /// Configuration could not be loaded or is out of range
    Config(String),
}

impl fmt::Display for ImpalaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImpalaError::ConnectFailed(msg) => write!(f, "Connect failed: {msg}"),
            ImpalaError::AcquireTimeout(wait) => write!(
                f,
                "Acquire timeout: no connection available after {}ms",
                wait.as_millis()
            ),
            ImpalaError::PoolClosed => write!(f, "Pool closed: no new connections are issued"),
            ImpalaError::MetadataFetchFailed(msg) => write!(f, "Metadata fetch failed: {msg}"),
            ImpalaError::QueryExecFailed(msg) => write!(f, "Query failed: {msg}"),
            ImpalaError::ReleaseFailed(msg) => write!(f, "Release failed: {msg}"),
            ImpalaError::DrainPartialFailure(msg) => write!(f, "Drain failed: {msg}"),
            ImpalaError::InvalidDescriptor(msg) => write!(f, "Invalid query descriptor: {msg}"),
            ImpalaError::Config(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for ImpalaError {}

impl From<config::ConfigError> for ImpalaError {
    fn from(err: config::ConfigError) -> Self {
        ImpalaError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ImpalaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_message_is_kept_verbatim() {
        let err = ImpalaError::QueryExecFailed(DriverError::new("AnalysisException: x").to_string());
        assert_eq!(err.to_string(), "Query failed: AnalysisException: x");
    }

    #[test]
    fn test_acquire_timeout_display() {
        let err = ImpalaError::AcquireTimeout(Duration::from_millis(10_000));
        assert!(err.to_string().contains("10000ms"));
    }

    #[test]
    fn test_all_variants_display() {
        let cases = vec![
            (ImpalaError::ConnectFailed("refused".into()), "Connect failed"),
            (ImpalaError::PoolClosed, "Pool closed"),
            (ImpalaError::MetadataFetchFailed("x".into()), "Metadata fetch failed"),
            (ImpalaError::ReleaseFailed("x".into()), "Release failed"),
            (ImpalaError::DrainPartialFailure("x".into()), "Drain failed"),
            (ImpalaError::InvalidDescriptor("x".into()), "Invalid query descriptor"),
            (ImpalaError::Config("x".into()), "Configuration error"),
        ];
        for (err, expected) in cases {
            assert!(err.to_string().contains(expected), "{err}");
        }
    }
}
