//! Engine error types

use thiserror::Error;
use templar_domain::DomainError;

/// Structural engine failures. Runtime collaborator failures are never
/// surfaced through this type; they become per-variable `Error` status.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A domain validation error occurred before resolution began.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// The dependency graph contains a cycle. The path lists the
    /// variable names along the cycle, first name repeated at the end.
    #[error("cyclic variable dependency: {}", cycle.join(" -> "))]
    CyclicDependency {
        /// Ordered names along the cycle.
        cycle: Vec<String>,
    },

    /// An operation referenced a variable name the engine does not know.
    #[error("unknown variable: {0}")]
    UnknownVariable(String),

    /// A selection carried a value that is not among the variable's
    /// resolved options.
    #[error("selection {value:?} is not an option of variable {variable}")]
    SelectionNotAnOption {
        /// Variable that rejected the selection.
        variable: String,
        /// Offending selection value.
        value: String,
    },
}

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
