//! Infrastructure adapters for Templar.
//!
//! Concrete implementations of the application-layer collaborator ports,
//! plus event-stream plumbing. The adapters here are deliberately
//! self-contained (in-memory registries, canned executors) so a host can
//! run a full engine without any external services wired up.

pub mod adapters;
pub mod logging;

pub use adapters::{
    FailingQueryExecutor, InMemoryDataSourceRegistry, RecordedCall, StaticQueryExecutor,
};
pub use logging::spawn_event_logger;
