//! Port adapters.

mod executor;
mod registry;

pub use executor::{FailingQueryExecutor, RecordedCall, StaticQueryExecutor};
pub use registry::InMemoryDataSourceRegistry;
