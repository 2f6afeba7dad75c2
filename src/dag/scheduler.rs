// src/dag/scheduler.rs

//! Incremental scheduling over a validated [`DagGraph`].
//!
//! The functions here know nothing about tasks; the runner supplies closures
//! answering "is this task satisfied?" and "run this task".

use std::collections::BTreeSet;

use tracing::{debug, trace};

use crate::dag::graph::DagGraph;
use crate::errors::{BatchdagError, Result};
use crate::types::TaskName;

/// Compute the set of tasks that must run to satisfy `targets`.
///
/// A satisfied task short-circuits expansion: its dependencies are not
/// examined, whether or not they still exist individually. An unsatisfied
/// task is scheduled and its dependencies are expanded in turn. Every name
/// is examined at most once.
pub fn recursively_schedule<F>(
    graph: &DagGraph,
    targets: &[TaskName],
    mut is_satisfied: F,
) -> Result<BTreeSet<TaskName>>
where
    F: FnMut(&str) -> Result<bool>,
{
    let mut scheduled = BTreeSet::new();
    let mut examined = BTreeSet::new();
    let mut stack: Vec<&str> = targets.iter().rev().map(|t| t.as_str()).collect();

    while let Some(name) = stack.pop() {
        if !graph.contains(name) {
            return Err(BatchdagError::TaskNotFound(name.to_string()));
        }
        if !examined.insert(name) {
            continue;
        }

        if is_satisfied(name)? {
            debug!(task = %name, "already satisfied; not expanding dependencies");
            continue;
        }

        trace!(task = %name, "scheduling");
        scheduled.insert(name.to_string());
        for dep in graph.dependencies_of(name).iter().rev() {
            if !examined.contains(dep.as_str()) {
                stack.push(dep);
            }
        }
    }

    Ok(scheduled)
}

/// Run every scheduled task once its scheduled dependencies are done.
///
/// Each pass scans the remaining schedule in name order and runs whatever
/// has no dependency left in it. Returns the order in which tasks ran.
pub fn run_schedule<F>(
    graph: &DagGraph,
    mut schedule: BTreeSet<TaskName>,
    mut run: F,
) -> Result<Vec<TaskName>>
where
    F: FnMut(&str) -> Result<()>,
{
    let mut executed = Vec::with_capacity(schedule.len());

    while !schedule.is_empty() {
        let remaining: Vec<TaskName> = schedule.iter().cloned().collect();
        let mut progressed = false;

        for name in remaining {
            let blocked = graph
                .dependencies_of(&name)
                .iter()
                .any(|d| schedule.contains(d));
            if blocked {
                continue;
            }

            run(&name)?;
            schedule.remove(&name);
            executed.push(name);
            progressed = true;
        }

        if !progressed {
            return Err(BatchdagError::ScheduleStalled(schedule.into_iter().collect()));
        }
    }

    Ok(executed)
}
