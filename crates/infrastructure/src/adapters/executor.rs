//! Query executor adapters.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use templar_application::{MetricFindValue, PortError, QueryExecutor};
use templar_domain::ExecutionContext;

/// Executor that answers from a canned response table keyed by the
/// (already interpolated) query text, recording every call it receives.
///
/// Queries with no table entry resolve to an empty option list, which
/// mirrors a backend that matched nothing.
#[derive(Debug, Default)]
pub struct StaticQueryExecutor {
    responses: HashMap<String, Vec<MetricFindValue>>,
    calls: Mutex<Vec<RecordedCall>>,
}

/// One observed `metric_find_query` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// The fully interpolated query text received.
    pub query: String,
    /// Datasource reference, if the variable carried one.
    pub datasource: Option<String>,
}

impl StaticQueryExecutor {
    /// Creates an executor over the given response table.
    #[must_use]
    pub fn new(responses: HashMap<String, Vec<MetricFindValue>>) -> Self {
        Self {
            responses,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Adds or replaces one canned response.
    pub fn respond(&mut self, query: impl Into<String>, values: Vec<MetricFindValue>) {
        self.responses.insert(query.into(), values);
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl QueryExecutor for StaticQueryExecutor {
    async fn metric_find_query(
        &self,
        query: &str,
        datasource: Option<&str>,
        _ctx: &ExecutionContext,
    ) -> Result<Vec<MetricFindValue>, PortError> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(RecordedCall {
                query: query.to_string(),
                datasource: datasource.map(ToString::to_string),
            });
        tracing::debug!(query, ?datasource, "static executor answering");
        Ok(self.responses.get(query).cloned().unwrap_or_default())
    }
}

/// Executor that fails every call with a backend error. Exercises the
/// per-variable error isolation path.
#[derive(Debug, Clone)]
pub struct FailingQueryExecutor {
    message: String,
}

impl FailingQueryExecutor {
    /// Creates an executor that fails with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Default for FailingQueryExecutor {
    fn default() -> Self {
        Self::new("backend unavailable")
    }
}

#[async_trait]
impl QueryExecutor for FailingQueryExecutor {
    async fn metric_find_query(
        &self,
        query: &str,
        _datasource: Option<&str>,
        _ctx: &ExecutionContext,
    ) -> Result<Vec<MetricFindValue>, PortError> {
        tracing::debug!(query, "failing executor rejecting");
        Err(PortError::Backend(self.message.clone()))
    }
}
