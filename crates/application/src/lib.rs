//! Templar Application - Variable resolution and interpolation
//!
//! This crate implements the engine core:
//! - Port traits for the external collaborators (query execution,
//!   datasource enumeration)
//! - Dependency graph construction with cycle detection
//! - Per-kind resolution strategies and option post-processing
//! - Wave-parallel scheduling with cascading invalidation
//! - Token interpolation with format specifiers and built-in variables
//! - A per-session event bus for state transitions

pub mod engine;
pub mod error;
pub mod events;
pub mod graph;
pub mod interpolate;
pub mod ports;
pub mod postprocess;
pub mod resolvers;

pub use engine::{InitSummary, VariableEngine, VariableSnapshot};
pub use error::{EngineError, EngineResult};
pub use events::{EventBus, SubscriptionHandle, VariableEvent};
pub use graph::DependencyGraph;
pub use interpolate::{Interpolator, VariableFormat};
pub use ports::{DataSourceInfo, DataSourceRegistry, MetricFindValue, PortError, QueryExecutor};
