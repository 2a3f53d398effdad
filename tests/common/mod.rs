//! In-memory engine driver shared by the integration tests.

#![allow(dead_code)]

use impala_lite::{
    ConnectionConfig, ConnectionFactory, DriverError, FieldSchema, ImpalaConnection, QueryOptions,
    ResultSchema, ResultsMetadata, Row,
};
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// Canned answer for statements containing `needle`
#[derive(Clone)]
pub struct Canned {
    pub needle: String,
    pub fields: Vec<FieldSchema>,
    pub rows: Vec<Row>,
}

pub fn canned(needle: &str, fields: &[(&str, &str)], rows: Value) -> Canned {
    Canned {
        needle: needle.to_string(),
        fields: fields
            .iter()
            .map(|(name, type_name)| FieldSchema {
                name: name.to_string(),
                type_name: type_name.to_string(),
            })
            .collect(),
        rows: serde_json::from_value(rows).expect("rows must be an array of objects"),
    }
}

/// Everything the fake engine saw
#[derive(Default)]
pub struct EngineLog {
    pub metadata_requests: Vec<String>,
    pub queries: Vec<(String, Option<QueryOptions>)>,
    pub connects: usize,
    pub closes: usize,
}

#[derive(Clone, Default)]
pub struct FakeEngine {
    answers: Arc<Vec<Canned>>,
    log: Arc<Mutex<EngineLog>>,
}

impl FakeEngine {
    pub fn new(answers: Vec<Canned>) -> Self {
        Self {
            answers: Arc::new(answers),
            log: Arc::default(),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.log.lock().unwrap().queries.iter().map(|(sql, _)| sql.clone()).collect()
    }

    pub fn with_log<T>(&self, f: impl FnOnce(&EngineLog) -> T) -> T {
        f(&self.log.lock().unwrap())
    }
}

pub struct FakeSession {
    engine: FakeEngine,
}

impl FakeSession {
    fn answer(&self, sql: &str) -> Option<&Canned> {
        self.engine.answers.iter().find(|c| sql.contains(&c.needle))
    }
}

impl ImpalaConnection for FakeSession {
    fn results_metadata(&mut self, sql: &str) -> Result<ResultsMetadata, DriverError> {
        self.engine.log.lock().unwrap().metadata_requests.push(sql.to_string());
        Ok(ResultsMetadata {
            schema: ResultSchema {
                field_schemas: self.answer(sql).map(|c| c.fields.clone()).unwrap_or_default(),
            },
        })
    }

    fn query(&mut self, sql: &str, options: Option<&QueryOptions>) -> Result<Vec<Row>, DriverError> {
        self.engine
            .log
            .lock()
            .unwrap()
            .queries
            .push((sql.to_string(), options.cloned()));
        match self.answer(sql) {
            Some(c) => Ok(c.rows.clone()),
            None => Err(DriverError::new(format!("AnalysisException: unexpected statement: {sql}"))),
        }
    }

    fn close(&mut self) -> Result<(), DriverError> {
        self.engine.log.lock().unwrap().closes += 1;
        Ok(())
    }
}

impl ConnectionFactory for FakeEngine {
    type Connection = FakeSession;

    fn connect(&self, _config: &ConnectionConfig) -> Result<FakeSession, DriverError> {
        self.log.lock().unwrap().connects += 1;
        Ok(FakeSession {
            engine: self.clone(),
        })
    }
}
