//! Variable snapshot
//!
//! A snapshot is a consistent read view over the variable store, taken
//! under the store's read lock. Consumers (the interpolator above all)
//! only ever see snapshots; the live store is written exclusively by the
//! engine.

use std::collections::HashMap;

use templar_domain::ResolvedVariable;

/// An immutable name -> resolved-variable view.
#[derive(Debug, Clone, Default)]
pub struct VariableSnapshot {
    vars: HashMap<String, ResolvedVariable>,
}

impl VariableSnapshot {
    /// Creates a snapshot from resolved variables.
    #[must_use]
    pub fn from_vars(vars: HashMap<String, ResolvedVariable>) -> Self {
        Self { vars }
    }

    /// Looks up a variable by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ResolvedVariable> {
        self.vars.get(name)
    }

    /// Adds or replaces a variable. Mainly useful for building fixtures.
    pub fn insert(&mut self, var: ResolvedVariable) {
        self.vars.insert(var.definition.name.clone(), var);
    }

    /// Iterates all variables in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &ResolvedVariable> {
        self.vars.values()
    }

    /// Number of variables in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Returns true when the snapshot holds no variables.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
