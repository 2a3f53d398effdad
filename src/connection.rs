//! Query-engine driver contract.
//!
//! The wire protocol lives in an external driver. This module defines what
//! the pool and executor need from it:
//!
//! - a [`ConnectionFactory`] that opens sessions from a [`ConnectionConfig`]
//! - an [`ImpalaConnection`] that can describe a statement's result columns,
//!   run it, and close
//!
//! Driver calls block the calling coroutine only; run them inside `may`
//! coroutines to overlap many queries on a few OS threads.

use crate::coerce::Row;
use crate::config::ConnectionConfig;
use crate::error::{DriverError, ImpalaError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;

/// Engine query options (e.g. `MEM_LIMIT`), passed to the driver untouched
pub type QueryOptions = IndexMap<String, String>;

/// Result-set description returned by the driver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultsMetadata {
    pub schema: ResultSchema,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSchema {
    pub field_schemas: Vec<FieldSchema>,
}

/// One result column and its declared engine type (`int`, `bigint`, `double`, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// A live engine session.
///
/// A connection is used by one caller at a time; the pool enforces that.
pub trait ImpalaConnection: Send {
    /// Describe the columns `sql` would return, without running it
    fn results_metadata(&mut self, sql: &str) -> Result<ResultsMetadata, DriverError>;

    /// Run `sql` and return its rows, typically with string-encoded values
    fn query(&mut self, sql: &str, options: Option<&QueryOptions>) -> Result<Vec<Row>, DriverError>;

    /// Close the session
    fn close(&mut self) -> Result<(), DriverError>;
}

/// Opens engine sessions
pub trait ConnectionFactory: Send + Sync + 'static {
    type Connection: ImpalaConnection + 'static;

    fn connect(&self, config: &ConnectionConfig) -> Result<Self::Connection, DriverError>;
}

/// Validate `config` and open a session through `factory`.
///
/// Failures are logged at warn and returned as [`ImpalaError::ConnectFailed`].
pub fn connect<F: ConnectionFactory>(
    factory: &F,
    config: &ConnectionConfig,
) -> Result<F::Connection, ImpalaError> {
    #[cfg(feature = "tracing")]
    let _span = tracing_helpers::connect_span(&config.host, config.port).entered();

    validate_connection_config(config)?;
    factory.connect(config).map_err(|e| {
        log::warn!("Impala connection create error: {e}");
        ImpalaError::ConnectFailed(e.to_string())
    })
}

/// Check that `config` names a reachable-looking endpoint.
pub fn validate_connection_config(config: &ConnectionConfig) -> Result<(), ImpalaError> {
    if config.host.trim().is_empty() {
        return Err(ImpalaError::ConnectFailed(
            "host cannot be empty".to_string(),
        ));
    }
    if config.port == 0 {
        return Err(ImpalaError::ConnectFailed("port cannot be 0".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct RefusingFactory;

    struct NeverConnection;

    impl ImpalaConnection for NeverConnection {
        fn results_metadata(&mut self, _sql: &str) -> Result<ResultsMetadata, DriverError> {
            unreachable!()
        }

        fn query(&mut self, _sql: &str, _options: Option<&QueryOptions>) -> Result<Vec<Row>, DriverError> {
            unreachable!()
        }

        fn close(&mut self) -> Result<(), DriverError> {
            Ok(())
        }
    }

    impl ConnectionFactory for RefusingFactory {
        type Connection = NeverConnection;

        fn connect(&self, _config: &ConnectionConfig) -> Result<NeverConnection, DriverError> {
            Err(DriverError::new("connection refused"))
        }
    }

    #[test]
    fn test_validate_connection_config() {
        assert!(validate_connection_config(&ConnectionConfig::default()).is_ok());

        let mut config = ConnectionConfig::default();
        config.host = "  ".to_string();
        assert!(validate_connection_config(&config).is_err());

        let mut config = ConnectionConfig::default();
        config.port = 0;
        assert!(validate_connection_config(&config).is_err());
    }

    #[test]
    fn test_connect_failure_keeps_driver_message() {
        let err = connect(&RefusingFactory, &ConnectionConfig::default())
            .err()
            .unwrap();
        assert_eq!(err, ImpalaError::ConnectFailed("connection refused".to_string()));
    }

    #[test]
    fn test_metadata_wire_shape() {
        let metadata: ResultsMetadata = serde_json::from_value(json!({
            "schema": {"fieldSchemas": [{"name": "count", "type": "bigint"}]}
        }))
        .unwrap();
        assert_eq!(metadata.schema.field_schemas[0].type_name, "bigint");
    }
}
