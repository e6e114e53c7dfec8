//! Query resolver

use async_trait::async_trait;
use templar_domain::{ExecutionContext, VariableDefinition, VariableOption};

use super::{KindResolver, ResolveDeps, ResolveError};
use crate::interpolate::Interpolator;

/// Resolves a Query variable: interpolates the raw query text (and the
/// datasource reference) against the already-resolved ancestors, then
/// delegates to the query executor.
///
/// Wave ordering guarantees every referenced ancestor is resolved before
/// this runs.
pub struct QueryResolver;

#[async_trait]
impl KindResolver for QueryResolver {
    async fn resolve(
        &self,
        def: &VariableDefinition,
        deps: &ResolveDeps<'_>,
        ctx: &ExecutionContext,
    ) -> Result<Vec<VariableOption>, ResolveError> {
        let query = Interpolator::interpolate(&def.query, deps.snapshot, ctx);
        let datasource = def
            .datasource
            .as_deref()
            .map(|ds| Interpolator::interpolate(ds, deps.snapshot, ctx));

        let rows = deps
            .query_executor
            .metric_find_query(&query, datasource.as_deref(), ctx)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let value = row.value.unwrap_or_else(|| row.text.clone());
                VariableOption::new(row.text, value)
            })
            .collect())
    }
}
