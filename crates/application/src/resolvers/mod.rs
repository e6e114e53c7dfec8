//! Kind resolvers
//!
//! One resolution strategy per variable kind, behind a single trait. The
//! resolvers are the only code that calls the collaborator ports. Adding a
//! kind means adding one implementation here, nothing else.

mod adhoc;
mod constant;
mod custom;
mod datasource;
mod interval;
mod query;
mod textbox;

pub use adhoc::AdHocResolver;
pub use constant::ConstantResolver;
pub use custom::CustomResolver;
pub use datasource::DataSourceListResolver;
pub use interval::IntervalResolver;
pub use query::QueryResolver;
pub use textbox::TextBoxResolver;

use async_trait::async_trait;
use thiserror::Error;
use templar_domain::{ExecutionContext, ResolvedVariable, VariableDefinition, VariableKind,
    VariableOption};

use crate::engine::VariableSnapshot;
use crate::ports::{DataSourceRegistry, PortError, QueryExecutor};

/// Per-variable resolution failure. Recorded as `Error` status on the
/// owning variable; never aborts sibling resolution.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// A collaborator behind a port failed.
    #[error("{0}")]
    Collaborator(#[from] PortError),
}

/// Everything a resolver may reach while producing raw options.
pub struct ResolveDeps<'a> {
    /// Query execution collaborator.
    pub query_executor: &'a dyn QueryExecutor,
    /// Datasource registry collaborator.
    pub datasources: &'a dyn DataSourceRegistry,
    /// Snapshot holding the already-resolved ancestors, used for query and
    /// datasource-reference interpolation.
    pub snapshot: &'a VariableSnapshot,
    /// Previous state of the variable being resolved, when it has one.
    pub previous: Option<&'a ResolvedVariable>,
}

/// One resolution strategy.
#[async_trait]
pub trait KindResolver: Send + Sync {
    /// Produces the raw option list for a definition. Post-processing
    /// (filtering, sorting, "All", selection) happens outside.
    async fn resolve(
        &self,
        def: &VariableDefinition,
        deps: &ResolveDeps<'_>,
        ctx: &ExecutionContext,
    ) -> Result<Vec<VariableOption>, ResolveError>;
}

/// Maps a kind to its resolver.
#[must_use]
pub fn resolver_for(kind: VariableKind) -> &'static dyn KindResolver {
    match kind {
        VariableKind::Query => &QueryResolver,
        VariableKind::Custom => &CustomResolver,
        VariableKind::Constant => &ConstantResolver,
        VariableKind::DataSourceList => &DataSourceListResolver,
        VariableKind::Interval => &IntervalResolver,
        VariableKind::TextBox => &TextBoxResolver,
        VariableKind::AdHoc => &AdHocResolver,
    }
}
