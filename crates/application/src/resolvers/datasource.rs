//! Datasource-list resolver

use async_trait::async_trait;
use templar_domain::{ExecutionContext, VariableDefinition, VariableOption};

use super::{KindResolver, ResolveDeps, ResolveError};

/// Resolves a DataSourceList variable by enumerating the registry,
/// optionally restricted to the type named in the definition query.
/// Option text is the datasource name, the value its uid.
pub struct DataSourceListResolver;

#[async_trait]
impl KindResolver for DataSourceListResolver {
    async fn resolve(
        &self,
        def: &VariableDefinition,
        deps: &ResolveDeps<'_>,
        _ctx: &ExecutionContext,
    ) -> Result<Vec<VariableOption>, ResolveError> {
        let filter = Some(def.query.trim()).filter(|f| !f.is_empty());
        let entries = deps.datasources.list(filter).await?;
        Ok(entries
            .into_iter()
            .map(|e| VariableOption::new(e.name, e.uid))
            .collect())
    }
}
