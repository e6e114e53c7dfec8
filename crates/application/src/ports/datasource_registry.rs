//! Datasource registry port

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::PortError;

/// One registered datasource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSourceInfo {
    /// Stable unique identifier, the value substituted into queries.
    pub uid: String,
    /// Human-readable name, the display text.
    pub name: String,
    /// Datasource type tag, e.g. `"prometheus"`.
    pub kind: String,
}

impl DataSourceInfo {
    /// Creates a registry entry.
    #[must_use]
    pub fn new(
        uid: impl Into<String>,
        name: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            uid: uid.into(),
            name: name.into(),
            kind: kind.into(),
        }
    }
}

/// Port for enumerating the datasource registry.
#[async_trait]
pub trait DataSourceRegistry: Send + Sync {
    /// Lists registered datasources, optionally restricted to one type.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be enumerated.
    async fn list(&self, type_filter: Option<&str>) -> Result<Vec<DataSourceInfo>, PortError>;
}
