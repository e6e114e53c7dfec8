//! Text-box resolver

use async_trait::async_trait;
use templar_domain::{ExecutionContext, VariableDefinition, VariableOption};

use super::{KindResolver, ResolveDeps, ResolveError};

/// Resolves a TextBox variable to one free-text option: the value the
/// user last set when there is one, otherwise the definition default.
pub struct TextBoxResolver;

#[async_trait]
impl KindResolver for TextBoxResolver {
    async fn resolve(
        &self,
        def: &VariableDefinition,
        deps: &ResolveDeps<'_>,
        _ctx: &ExecutionContext,
    ) -> Result<Vec<VariableOption>, ResolveError> {
        let user_set = deps
            .previous
            .and_then(|prev| prev.current.as_ref())
            .and_then(|current| current.value.first())
            .map(ToString::to_string);
        let value = user_set.unwrap_or_else(|| def.query.clone());
        Ok(vec![VariableOption::from_value(value)])
    }
}
