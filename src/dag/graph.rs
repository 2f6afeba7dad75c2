// src/dag/graph.rs

use std::collections::{BTreeMap, BTreeSet};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::errors::{BatchdagError, Result};
use crate::types::TaskName;

/// Internal node structure: stores immediate deps.
#[derive(Debug, Clone, Default)]
struct DagNode {
    /// Direct dependencies: tasks that must complete before this one runs.
    deps: Vec<TaskName>,
}

/// Dependency graph keyed by task name.
///
/// Built from whatever a runner declares, so it may reference undeclared
/// names or contain cycles until [`DagGraph::check`] has passed.
#[derive(Debug, Clone, Default)]
pub struct DagGraph {
    nodes: BTreeMap<TaskName, DagNode>,
}

impl DagGraph {
    /// Build a graph from `(task, dependencies)` pairs.
    pub fn from_deps<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a [TaskName])>,
    {
        let mut nodes: BTreeMap<TaskName, DagNode> = BTreeMap::new();

        for (name, deps) in entries {
            nodes.entry(name.to_string()).or_default().deps = deps.to_vec();
        }

        Self { nodes }
    }

    /// Return all declared task names, in name order.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Immediate dependencies of a task.
    pub fn dependencies_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Validate that every dependency is declared and that there is no
    /// cycle.
    ///
    /// Walks each task depth-first with a stack of pending names. A
    /// dependency already pending closes a cycle, reported as the path from
    /// its first occurrence back to itself, e.g. `a -> c -> b -> a`.
    pub fn check(&self) -> Result<()> {
        let mut checked: BTreeSet<&str> = BTreeSet::new();
        for name in self.tasks() {
            if !checked.contains(name) {
                let mut pending = Vec::new();
                self.check_task(name, &mut checked, &mut pending)?;
            }
        }
        Ok(())
    }

    fn check_task<'a>(
        &'a self,
        name: &'a str,
        checked: &mut BTreeSet<&'a str>,
        pending: &mut Vec<&'a str>,
    ) -> Result<()> {
        pending.push(name);

        for dep in self.dependencies_of(name) {
            let dep = dep.as_str();
            if let Some(entry) = pending.iter().position(|p| *p == dep) {
                let mut cycle: Vec<&str> = pending[entry..].to_vec();
                cycle.push(dep);
                return Err(BatchdagError::DagCycle(cycle.join(" -> ")));
            }
            if !self.contains(dep) {
                return Err(BatchdagError::MissingDependency {
                    dependency: dep.to_string(),
                    referrer: name.to_string(),
                });
            }
            if checked.contains(dep) {
                continue;
            }
            self.check_task(dep, checked, pending)?;
        }

        pending.pop();
        checked.insert(name);
        Ok(())
    }

    /// Dependency-respecting order of `subset` (dependencies first).
    ///
    /// Only edges between members of the subset are considered. Requires a
    /// graph that passed [`DagGraph::check`].
    pub fn execution_order(&self, subset: &BTreeSet<TaskName>) -> Result<Vec<TaskName>> {
        // Edge direction: dep -> task.
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for name in subset {
            graph.add_node(name.as_str());
        }
        for name in subset {
            for dep in self.dependencies_of(name) {
                if subset.contains(dep) {
                    graph.add_edge(dep.as_str(), name.as_str(), ());
                }
            }
        }

        match toposort(&graph, None) {
            Ok(order) => Ok(order.into_iter().map(str::to_string).collect()),
            Err(cycle) => Err(BatchdagError::DagCycle(format!(
                "cycle detected in task DAG involving task '{}'",
                cycle.node_id()
            ))),
        }
    }
}
