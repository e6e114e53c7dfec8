//! Resolved variable state
//!
//! This module defines the per-variable state machine:
//! `NotStarted -> Loading -> Done | Error`, with `Done`/`Error -> Loading`
//! on any triggered re-resolution.

use serde::{Deserialize, Serialize};

use crate::option::{OptionValue, VariableOption};
use crate::variable::VariableDefinition;

/// Resolution status of a variable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableStatus {
    /// No resolution has been attempted yet.
    #[default]
    NotStarted,
    /// A resolution is in flight.
    Loading,
    /// The last resolution completed.
    Done,
    /// The last resolution failed; previous options are retained.
    Error,
}

/// A definition together with its resolved options and current selection.
///
/// Instances are created once per definition at session initialization and
/// mutated only by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedVariable {
    /// The definition this state belongs to.
    pub definition: VariableDefinition,

    /// Resolved options, no duplicate values.
    pub options: Vec<VariableOption>,

    /// Current selection. Absent before the first resolution; the multi
    /// "none selected" sentinel is an explicit empty-list option.
    pub current: Option<VariableOption>,

    /// Resolution status.
    pub status: VariableStatus,

    /// Failure message when `status` is [`VariableStatus::Error`].
    pub error: Option<String>,
}

impl ResolvedVariable {
    /// Creates the initial, unresolved state for a definition.
    #[must_use]
    pub const fn not_started(definition: VariableDefinition) -> Self {
        Self {
            definition,
            options: Vec::new(),
            current: None,
            status: VariableStatus::NotStarted,
            error: None,
        }
    }

    /// Returns the current value, if a selection exists.
    #[must_use]
    pub fn current_value(&self) -> Option<&OptionValue> {
        self.current.as_ref().map(|c| &c.value)
    }

    /// Returns the values of every real option, excluding the synthetic
    /// "All" entry. Used when an "All" selection is expanded.
    #[must_use]
    pub fn real_option_values(&self) -> Vec<String> {
        self.options
            .iter()
            .filter(|o| !o.is_all())
            .flat_map(|o| o.value.to_vec())
            .collect()
    }

    /// Transitions into `Loading`, retaining options and selection.
    pub const fn begin_loading(&mut self) {
        self.status = VariableStatus::Loading;
    }

    /// Commits a successful resolution.
    pub fn complete(&mut self, options: Vec<VariableOption>, current: Option<VariableOption>) {
        self.options = options;
        self.current = current;
        self.status = VariableStatus::Done;
        self.error = None;
    }

    /// Records a failed resolution. Previously resolved options and the
    /// current selection are retained.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = VariableStatus::Error;
        self.error = Some(message.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::VariableDefinition;
    use pretty_assertions::assert_eq;

    fn resolved_with_options() -> ResolvedVariable {
        let mut var = ResolvedVariable::not_started(VariableDefinition::custom("x", "a,b"));
        var.complete(
            vec![
                VariableOption::from_value("a").selected(),
                VariableOption::from_value("b"),
            ],
            Some(VariableOption::from_value("a").selected()),
        );
        var
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut var = ResolvedVariable::not_started(VariableDefinition::constant("c", "v"));
        assert_eq!(var.status, VariableStatus::NotStarted);
        var.begin_loading();
        assert_eq!(var.status, VariableStatus::Loading);
        var.complete(vec![VariableOption::from_value("v").selected()], None);
        assert_eq!(var.status, VariableStatus::Done);
        assert!(var.error.is_none());
    }

    #[test]
    fn test_failure_retains_options() {
        let mut var = resolved_with_options();
        var.begin_loading();
        var.fail("datasource unreachable");
        assert_eq!(var.status, VariableStatus::Error);
        assert_eq!(var.options.len(), 2);
        assert_eq!(var.error.as_deref(), Some("datasource unreachable"));
        assert!(var.current.is_some());
    }

    #[test]
    fn test_real_option_values_skip_all() {
        let mut var = resolved_with_options();
        var.options.insert(0, VariableOption::all(None));
        assert_eq!(var.real_option_values(), vec!["a", "b"]);
    }
}
