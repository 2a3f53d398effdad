//! Scripted in-memory driver for unit tests.

use crate::coerce::Row;
use crate::config::ConnectionConfig;
use crate::connection::{
    ConnectionFactory, FieldSchema, ImpalaConnection, QueryOptions, ResultSchema, ResultsMetadata,
};
use crate::error::DriverError;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone)]
struct Response {
    needle: String,
    fields: Vec<FieldSchema>,
    rows: Vec<Row>,
}

/// Connection answering statements from a fixed script.
///
/// The first response whose needle occurs in the SQL wins; unmatched
/// statements return no columns and no rows.
#[derive(Clone, Default)]
pub(crate) struct ScriptedConnection {
    responses: Vec<Response>,
    metadata_error: Option<String>,
    query_error: Option<String>,
    close_error: Option<String>,
    closes: Arc<AtomicUsize>,
    statements: Arc<Mutex<Vec<String>>>,
}

impl ScriptedConnection {
    pub(crate) fn respond(mut self, needle: &str, fields: &[(&str, &str)], rows: Value) -> Self {
        let rows = match rows {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|r| r.as_object().cloned())
                .collect(),
            _ => Vec::new(),
        };
        self.responses.push(Response {
            needle: needle.to_string(),
            fields: fields
                .iter()
                .map(|(name, type_name)| FieldSchema {
                    name: name.to_string(),
                    type_name: type_name.to_string(),
                })
                .collect(),
            rows,
        });
        self
    }

    pub(crate) fn fail_metadata(mut self, message: &str) -> Self {
        self.metadata_error = Some(message.to_string());
        self
    }

    pub(crate) fn fail_query(mut self, message: &str) -> Self {
        self.query_error = Some(message.to_string());
        self
    }

    pub(crate) fn fail_close(mut self, message: &str) -> Self {
        self.close_error = Some(message.to_string());
        self
    }

    fn lookup(&self, sql: &str) -> Option<&Response> {
        self.responses.iter().find(|r| sql.contains(&r.needle))
    }
}

impl ImpalaConnection for ScriptedConnection {
    fn results_metadata(&mut self, sql: &str) -> Result<ResultsMetadata, DriverError> {
        if let Some(msg) = &self.metadata_error {
            return Err(DriverError::new(msg.clone()));
        }
        let field_schemas = self.lookup(sql).map(|r| r.fields.clone()).unwrap_or_default();
        Ok(ResultsMetadata {
            schema: ResultSchema { field_schemas },
        })
    }

    fn query(&mut self, sql: &str, _options: Option<&QueryOptions>) -> Result<Vec<Row>, DriverError> {
        if let Ok(mut statements) = self.statements.lock() {
            statements.push(sql.to_string());
        }
        if let Some(msg) = &self.query_error {
            return Err(DriverError::new(msg.clone()));
        }
        Ok(self.lookup(sql).map(|r| r.rows.clone()).unwrap_or_default())
    }

    fn close(&mut self) -> Result<(), DriverError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        match &self.close_error {
            Some(msg) => Err(DriverError::new(msg.clone())),
            None => Ok(()),
        }
    }
}

type Maker = dyn Fn() -> ScriptedConnection + Send + Sync;

/// Factory building [`ScriptedConnection`]s and counting their lifecycle
#[derive(Clone)]
pub(crate) struct MockFactory {
    make: Arc<Maker>,
    connect_error: Option<String>,
    connect_delay: Option<Duration>,
    connects: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
    statements: Arc<Mutex<Vec<String>>>,
}

impl MockFactory {
    pub(crate) fn new(make: impl Fn() -> ScriptedConnection + Send + Sync + 'static) -> Self {
        Self {
            make: Arc::new(make),
            connect_error: None,
            connect_delay: None,
            connects: Arc::default(),
            closes: Arc::default(),
            statements: Arc::default(),
        }
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self {
            connect_error: Some(message.to_string()),
            ..Self::new(ScriptedConnection::default)
        }
    }

    /// Make every `connect` take `delay` before it succeeds
    pub(crate) fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = Some(delay);
        self
    }

    pub(crate) fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub(crate) fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Statements passed to `query`, in call order
    pub(crate) fn statements(&self) -> Vec<String> {
        self.statements.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl ConnectionFactory for MockFactory {
    type Connection = ScriptedConnection;

    fn connect(&self, _config: &ConnectionConfig) -> Result<ScriptedConnection, DriverError> {
        if let Some(msg) = &self.connect_error {
            return Err(DriverError::new(msg.clone()));
        }
        if let Some(delay) = self.connect_delay {
            may::coroutine::sleep(delay);
        }
        self.connects.fetch_add(1, Ordering::SeqCst);
        let mut conn = (self.make)();
        conn.closes = Arc::clone(&self.closes);
        conn.statements = Arc::clone(&self.statements);
        Ok(conn)
    }
}
