//! Dependency graph construction
//!
//! The graph records, for every variable, which other variables its raw
//! text references. Detection is a static token scan over the definition's
//! `query` and `datasource` fields, not semantic parsing: tokens inside
//! literals are still counted, references assembled at runtime are missed.
//! That approximation is accepted behavior.
//!
//! Ad-hoc variables take part in neither the graph nor resolution order.

use std::collections::{HashMap, HashSet};

use templar_domain::{VariableDefinition, VariableKind};

use crate::error::{EngineError, EngineResult};
use crate::interpolate::referenced_names;

/// Directed dependency graph over variable names, cycle-checked at
/// construction.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Graph members in definition order.
    members: Vec<String>,
    /// dependent -> direct dependencies.
    deps: HashMap<String, Vec<String>>,
    /// dependency -> direct dependents.
    rdeps: HashMap<String, Vec<String>>,
    /// Topological layers: every member's dependencies sit in earlier
    /// layers.
    waves: Vec<Vec<String>>,
}

impl DependencyGraph {
    /// Scans definitions and builds the graph.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::CyclicDependency`] naming the full cycle
    /// when the references are not acyclic.
    pub fn build(definitions: &[VariableDefinition]) -> EngineResult<Self> {
        let members: Vec<String> = definitions
            .iter()
            .filter(|d| d.kind != VariableKind::AdHoc)
            .map(|d| d.name.clone())
            .collect();
        let known: HashSet<&str> = members.iter().map(String::as_str).collect();

        let mut deps: HashMap<String, Vec<String>> = HashMap::new();
        let mut rdeps: HashMap<String, Vec<String>> = HashMap::new();
        for name in &members {
            deps.insert(name.clone(), Vec::new());
            rdeps.insert(name.clone(), Vec::new());
        }

        for def in definitions {
            if def.kind == VariableKind::AdHoc {
                continue;
            }
            let mut scanned = def.query.clone();
            if let Some(ds) = &def.datasource {
                scanned.push(' ');
                scanned.push_str(ds);
            }
            for referenced in referenced_names(&scanned) {
                if referenced != def.name && known.contains(referenced.as_str()) {
                    if let Some(entry) = deps.get_mut(&def.name) {
                        if !entry.contains(&referenced) {
                            entry.push(referenced.clone());
                        }
                    }
                    if let Some(entry) = rdeps.get_mut(&referenced) {
                        if !entry.contains(&def.name) {
                            entry.push(def.name.clone());
                        }
                    }
                } else if referenced == def.name {
                    // A self-reference is the smallest cycle.
                    return Err(EngineError::CyclicDependency {
                        cycle: vec![def.name.clone(), def.name.clone()],
                    });
                }
            }
        }

        if let Some(cycle) = find_cycle(&members, &deps) {
            return Err(EngineError::CyclicDependency { cycle });
        }

        let waves = compute_waves(&members, &deps);
        Ok(Self {
            members,
            deps,
            rdeps,
            waves,
        })
    }

    /// Graph members in definition order.
    #[must_use]
    pub fn members(&self) -> &[String] {
        &self.members
    }

    /// Returns true if `name` is a graph member.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.deps.contains_key(name)
    }

    /// Direct dependencies of `name`.
    #[must_use]
    pub fn depends_on(&self, name: &str) -> &[String] {
        self.deps.get(name).map_or(&[], Vec::as_slice)
    }

    /// Topological layers; within a layer no member depends on another.
    #[must_use]
    pub fn waves(&self) -> &[Vec<String>] {
        &self.waves
    }

    /// Direct and transitive dependents of `name`, in topological order.
    #[must_use]
    pub fn dependents_of(&self, name: &str) -> Vec<String> {
        let mut reached = HashSet::new();
        let mut frontier = vec![name];
        while let Some(current) = frontier.pop() {
            if let Some(children) = self.rdeps.get(current) {
                for child in children {
                    if reached.insert(child.as_str()) {
                        frontier.push(child);
                    }
                }
            }
        }
        self.waves
            .iter()
            .flatten()
            .filter(|n| reached.contains(n.as_str()))
            .cloned()
            .collect()
    }
}

/// Depth-first cycle search with an explicit recursion stack. Returns the
/// ordered cycle path (first name repeated at the end) when one exists.
fn find_cycle(
    members: &[String],
    deps: &HashMap<String, Vec<String>>,
) -> Option<Vec<String>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        InStack,
        Finished,
    }

    let mut marks: HashMap<&str, Mark> =
        members.iter().map(|n| (n.as_str(), Mark::Unvisited)).collect();

    fn visit<'a>(
        node: &'a str,
        deps: &'a HashMap<String, Vec<String>>,
        marks: &mut HashMap<&'a str, Mark>,
        stack: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
        marks.insert(node, Mark::InStack);
        stack.push(node);
        if let Some(children) = deps.get(node) {
            for child in children {
                match marks.get(child.as_str()).copied().unwrap_or(Mark::Finished) {
                    Mark::InStack => {
                        // Back-edge: the cycle is the stack suffix from
                        // the first occurrence of `child`.
                        let start = stack
                            .iter()
                            .position(|n| *n == child.as_str())
                            .unwrap_or(0);
                        let mut cycle: Vec<String> =
                            stack[start..].iter().map(ToString::to_string).collect();
                        cycle.push(child.clone());
                        return Some(cycle);
                    }
                    Mark::Unvisited => {
                        if let Some(cycle) = visit(child, deps, marks, stack) {
                            return Some(cycle);
                        }
                    }
                    Mark::Finished => {}
                }
            }
        }
        stack.pop();
        marks.insert(node, Mark::Finished);
        None
    }

    let mut stack = Vec::new();
    for node in members {
        if marks.get(node.as_str()).copied() == Some(Mark::Unvisited) {
            if let Some(cycle) = visit(node, deps, &mut marks, &mut stack) {
                return Some(cycle);
            }
        }
    }
    None
}

/// Kahn layering: wave N holds every member whose dependencies all sit in
/// waves 0..N. Member order within a wave follows definition order.
fn compute_waves(
    members: &[String],
    deps: &HashMap<String, Vec<String>>,
) -> Vec<Vec<String>> {
    let mut placed: HashSet<&str> = HashSet::new();
    let mut remaining: Vec<&String> = members.iter().collect();
    let mut waves = Vec::new();

    while !remaining.is_empty() {
        let (ready, blocked): (Vec<&String>, Vec<&String>) = remaining.iter().copied().partition(|n| {
            deps.get(n.as_str())
                .is_none_or(|ds| ds.iter().all(|d| placed.contains(d.as_str())))
        });
        if ready.is_empty() {
            // Unreachable for an acyclic graph; bail rather than spin.
            break;
        }
        for n in &ready {
            placed.insert(n.as_str());
        }
        waves.push(ready.iter().map(ToString::to_string).collect());
        remaining = blocked;
    }
    waves
}
