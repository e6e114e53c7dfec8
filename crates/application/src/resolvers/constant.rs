//! Constant resolver

use async_trait::async_trait;
use templar_domain::{ExecutionContext, VariableDefinition, VariableOption};

use super::{KindResolver, ResolveDeps, ResolveError};

/// Resolves a Constant variable to its single literal option.
pub struct ConstantResolver;

#[async_trait]
impl KindResolver for ConstantResolver {
    async fn resolve(
        &self,
        def: &VariableDefinition,
        _deps: &ResolveDeps<'_>,
        _ctx: &ExecutionContext,
    ) -> Result<Vec<VariableOption>, ResolveError> {
        Ok(vec![VariableOption::from_value(def.query.clone())])
    }
}
