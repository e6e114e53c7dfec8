//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during definition validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The variable kind tag is not one of the supported kinds.
    #[error("unknown variable kind: {0}")]
    UnknownKind(String),

    /// Two definitions in the same scope share a name.
    #[error("duplicate variable name: {0}")]
    DuplicateVariableName(String),

    /// A variable name is empty or contains characters the reference
    /// grammar cannot express.
    #[error("invalid variable name: {0:?}")]
    InvalidVariableName(String),

    /// A time range has `to` before `from`.
    #[error("invalid time range: from {from} is after to {to}")]
    InvalidTimeRange {
        /// Start of the offending range.
        from: String,
        /// End of the offending range.
        to: String,
    },
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
