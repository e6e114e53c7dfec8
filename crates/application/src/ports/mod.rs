//! Port definitions (interfaces)
//!
//! Ports define the boundary between the engine core and external systems.
//! Each port is an object-safe trait implemented by adapters in the
//! infrastructure layer (or by mocks in tests). The engine never crosses
//! this boundary anywhere else.

mod datasource_registry;
mod query_executor;

pub use datasource_registry::{DataSourceInfo, DataSourceRegistry};
pub use query_executor::{MetricFindValue, QueryExecutor};

use thiserror::Error;

/// Failure reported by a collaborator behind a port.
///
/// Port errors are always per-variable: the engine records them as `Error`
/// status and never lets them abort sibling resolution.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PortError {
    /// The backing service rejected or failed the call.
    #[error("backend error: {0}")]
    Backend(String),

    /// The referenced datasource does not exist.
    #[error("datasource not found: {0}")]
    NotFound(String),

    /// The call did not complete in time.
    #[error("collaborator timed out")]
    Timeout,
}
