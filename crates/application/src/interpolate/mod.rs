//! Interpolation module
//!
//! Parses `$name`, `${name}`, and `${name:format}` reference tokens and
//! substitutes the current value of each referenced variable, applying
//! format specifiers and request-local scoped overrides.
//!
//! # Usage
//!
//! ```
//! use templar_application::interpolate::Interpolator;
//! use templar_application::engine::VariableSnapshot;
//! use templar_domain::ExecutionContext;
//!
//! let snapshot = VariableSnapshot::default();
//! let ctx = ExecutionContext::fixed();
//! let out = Interpolator::interpolate("rate(up[$__interval])", &snapshot, &ctx);
//! assert_eq!(out, "rate(up[2m])");
//! ```

pub mod builtins;
pub mod engine;
pub mod format;
pub mod parser;

pub use engine::Interpolator;
pub use format::{VariableFormat, format_values};
pub use parser::{VariableToken, parse_tokens, referenced_names};
