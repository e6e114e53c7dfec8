//! Interval resolver

use async_trait::async_trait;
use templar_domain::{ExecutionContext, VariableDefinition, VariableOption};

use super::custom::split_items;
use super::{KindResolver, ResolveDeps, ResolveError};
use crate::interpolate::builtins::{auto_interval_ms, format_interval, parse_duration_ms};

/// Resolves an Interval variable from its comma-separated duration
/// literals. When `auto` is enabled, an `auto` entry is prepended whose
/// value is computed from the current time range and the target step
/// count, floored at `auto_min`.
pub struct IntervalResolver;

#[async_trait]
impl KindResolver for IntervalResolver {
    async fn resolve(
        &self,
        def: &VariableDefinition,
        _deps: &ResolveDeps<'_>,
        ctx: &ExecutionContext,
    ) -> Result<Vec<VariableOption>, ResolveError> {
        let mut options: Vec<VariableOption> = split_items(&def.query)
            .into_iter()
            .map(VariableOption::from_value)
            .collect();

        if def.auto {
            let min_ms = def.auto_min.as_deref().and_then(parse_duration_ms);
            let computed = auto_interval_ms(
                ctx.time_range.duration_ms(),
                u64::from(def.auto_count.max(1)),
                min_ms,
            );
            options.insert(0, VariableOption::new("auto", format_interval(computed)));
        }
        Ok(options)
    }
}
