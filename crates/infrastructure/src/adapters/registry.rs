//! In-memory datasource registry.

use async_trait::async_trait;
use templar_application::{DataSourceInfo, DataSourceRegistry, PortError};

/// Registry backed by a fixed list of entries.
///
/// Suitable for embedded hosts and tests; a deployment talking to a real
/// catalog implements [`DataSourceRegistry`] over its own client instead.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDataSourceRegistry {
    entries: Vec<DataSourceInfo>,
}

impl InMemoryDataSourceRegistry {
    /// Creates a registry over the given entries. First entry of a type
    /// acts as the default for that type.
    #[must_use]
    pub fn new(entries: Vec<DataSourceInfo>) -> Self {
        Self { entries }
    }

    /// Registers one more entry.
    pub fn register(&mut self, entry: DataSourceInfo) {
        self.entries.push(entry);
    }
}

#[async_trait]
impl DataSourceRegistry for InMemoryDataSourceRegistry {
    async fn list(&self, type_filter: Option<&str>) -> Result<Vec<DataSourceInfo>, PortError> {
        Ok(self
            .entries
            .iter()
            .filter(|entry| type_filter.is_none_or(|t| entry.kind == t))
            .cloned()
            .collect())
    }
}
