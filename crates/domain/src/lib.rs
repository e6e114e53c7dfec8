//! Templar Domain - Core variable-engine types
//!
//! This crate defines the domain model for the Templar template-variable
//! engine. All types here are pure Rust with no I/O dependencies.

pub mod adhoc;
pub mod context;
pub mod error;
pub mod option;
pub mod resolved;
pub mod variable;

pub use adhoc::{AdHocFilter, FilterOperator};
pub use context::{ExecutionContext, ScopedValue, ScopedVars, TimeRange};
pub use error::{DomainError, DomainResult};
pub use option::{ALL_TEXT, ALL_VALUE, OptionValue, VariableOption};
pub use resolved::{ResolvedVariable, VariableStatus};
pub use variable::{
    HideMode, RefreshTrigger, SortMode, VariableDefinition, VariableKind, validate_definitions,
};
