//! Ad-hoc resolver

use async_trait::async_trait;
use templar_domain::{ExecutionContext, VariableDefinition, VariableOption};

use super::{KindResolver, ResolveDeps, ResolveError};

/// Ad-hoc variables carry filters applied directly by consumers; they
/// have no options to resolve and complete immediately.
pub struct AdHocResolver;

#[async_trait]
impl KindResolver for AdHocResolver {
    async fn resolve(
        &self,
        _def: &VariableDefinition,
        _deps: &ResolveDeps<'_>,
        _ctx: &ExecutionContext,
    ) -> Result<Vec<VariableOption>, ResolveError> {
        Ok(Vec::new())
    }
}
