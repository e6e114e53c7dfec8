//! Query executor port

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use templar_domain::ExecutionContext;

use super::PortError;

/// One raw row returned by a metric-find query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricFindValue {
    /// Display text.
    pub text: String,

    /// Underlying value; falls back to `text` when absent.
    #[serde(default)]
    pub value: Option<String>,
}

impl MetricFindValue {
    /// Creates a row whose value equals its text.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            value: None,
        }
    }

    /// Creates a row with distinct text and value.
    #[must_use]
    pub fn with_value(text: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            value: Some(value.into()),
        }
    }
}

/// Port for delegating Query-kind resolution to a datasource.
///
/// The query text handed to implementations is already interpolated: every
/// ancestor variable reference has been substituted before the call.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Executes a metric-find query and returns its rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing datasource rejects or fails the
    /// query. The engine records the failure on the owning variable and
    /// continues.
    async fn metric_find_query(
        &self,
        query: &str,
        datasource: Option<&str>,
        ctx: &ExecutionContext,
    ) -> Result<Vec<MetricFindValue>, PortError>;
}
