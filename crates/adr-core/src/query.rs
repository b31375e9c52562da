//! Queries, backend results, and the [`QueryClient`] seam.
//!
//! Recipes build a [`Query`]; a [`QueryClient`] sends it to the analytics
//! backend and returns a [`QueryResult`]. The query body is an opaque JSON
//! document: adr does not interpret the backend's query language.

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

/// A query ready to be sent to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// Name of the recipe (or helper) that built the query; used in logs.
    pub name: String,

    /// Backend query document.
    pub body: Value,
}

impl Query {
    /// Creates a query.
    pub fn new(name: impl Into<String>, body: Value) -> Self {
        Self {
            name: name.into(),
            body,
        }
    }
}

/// Backend response to a query.
///
/// Table-format responses carry `header` plus row arrays in `data`;
/// list-format responses carry an array of objects in `data`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Result payload.
    #[serde(default)]
    pub data: Value,

    /// Column names, for table-format responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<Vec<String>>,

    /// Backend metadata (timing, format, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl QueryResult {
    /// Creates a result with only a data payload.
    pub fn from_data(data: Value) -> Self {
        Self {
            data,
            header: None,
            meta: None,
        }
    }

    /// Creates a table-format result.
    pub fn table(header: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            data: Value::Array(rows.into_iter().map(Value::Array).collect()),
            header: Some(header),
            meta: None,
        }
    }
}

/// Sends queries to the analytics backend.
///
/// Implementations own transport concerns such as timeouts and retries.
#[async_trait]
pub trait QueryClient: Send + Sync {
    /// Runs a query and returns the backend's result.
    async fn run(&self, query: &Query) -> Result<QueryResult>;
}

// ============================================================================
// MockQueryClient
// ============================================================================

/// In-memory query client for tests.
///
/// Returns canned results in order, repeating the last one once the queue
/// runs dry, and records every query it receives.
#[derive(Debug, Default)]
pub struct MockQueryClient {
    results: Mutex<VecDeque<QueryResult>>,
    last: Mutex<Option<QueryResult>>,
    queries: Mutex<Vec<Query>>,
    failure: Option<String>,
}

impl MockQueryClient {
    /// Creates a mock that returns `results` in order.
    pub fn new(results: Vec<QueryResult>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            ..Self::default()
        }
    }

    /// Creates a mock that always returns `result`.
    pub fn with_result(result: QueryResult) -> Self {
        Self::new(vec![result])
    }

    /// Creates a mock whose every call fails with a query error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Queries received so far.
    pub fn queries(&self) -> Vec<Query> {
        self.queries
            .lock()
            .map(|q| q.clone())
            .unwrap_or_default()
    }

    /// Number of queries received so far.
    pub fn call_count(&self) -> usize {
        self.queries.lock().map(|q| q.len()).unwrap_or_default()
    }
}

#[async_trait]
impl QueryClient for MockQueryClient {
    async fn run(&self, query: &Query) -> Result<QueryResult> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.clone());
        }

        if let Some(message) = &self.failure {
            return Err(Error::query(message.clone()));
        }

        let next = self
            .results
            .lock()
            .map_err(|_| Error::query("mock result queue poisoned"))?
            .pop_front();
        let mut last = self
            .last
            .lock()
            .map_err(|_| Error::query("mock result queue poisoned"))?;

        match next {
            Some(result) => {
                *last = Some(result.clone());
                Ok(result)
            }
            None => last
                .clone()
                .ok_or_else(|| Error::query("no mock result configured")),
        }
    }
}
