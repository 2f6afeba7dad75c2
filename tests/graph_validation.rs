// tests/graph_validation.rs

use std::collections::BTreeSet;

use proptest::prelude::*;

use batchdag::dag::{recursively_schedule, run_schedule, DagGraph};
use batchdag::errors::BatchdagError;
use batchdag::types::TaskName;

fn graph(spec: &[(&str, &[&str])]) -> DagGraph {
    let owned: Vec<(String, Vec<TaskName>)> = spec
        .iter()
        .map(|(name, deps)| (name.to_string(), deps.iter().map(|d| d.to_string()).collect()))
        .collect();
    DagGraph::from_deps(owned.iter().map(|(n, d)| (n.as_str(), d.as_slice())))
}

#[test]
fn test_cycle_is_reported_as_exact_path() {
    let g = graph(&[
        ("task1", &["task3"]),
        ("task2", &["task5"]),
        ("task3", &["task2"]),
        ("task4", &[]),
        ("task5", &["task1"]),
    ]);

    match g.check() {
        Err(BatchdagError::DagCycle(path)) => {
            assert_eq!(path, "task1 -> task3 -> task2 -> task5 -> task1");
        }
        other => panic!("Expected DagCycle error, got: {:?}", other),
    }
}

#[test]
fn test_cycle_path_starts_at_first_repeated_name() {
    // a is outside the cycle; the path only covers b -> c -> b.
    let g = graph(&[("a", &["b"]), ("b", &["c"]), ("c", &["b"])]);

    match g.check() {
        Err(BatchdagError::DagCycle(path)) => assert_eq!(path, "b -> c -> b"),
        other => panic!("Expected DagCycle error, got: {:?}", other),
    }
}

#[test]
fn test_self_dependency_is_a_cycle() {
    let g = graph(&[("solo", &["solo"])]);
    match g.check() {
        Err(BatchdagError::DagCycle(path)) => assert_eq!(path, "solo -> solo"),
        other => panic!("Expected DagCycle error, got: {:?}", other),
    }
}

#[test]
fn test_unknown_dependency_names_both_tasks() {
    let g = graph(&[("A", &["NonExistent"]), ("B", &[])]);

    match g.check() {
        Err(BatchdagError::MissingDependency { dependency, referrer }) => {
            assert_eq!(dependency, "NonExistent");
            assert_eq!(referrer, "A");
        }
        other => panic!("Expected MissingDependency error, got: {:?}", other),
    }
}

#[test]
fn test_satisfied_task_short_circuits_expansion() {
    // t3 -> t2 -> t1 -> t0, with t1 already complete.
    let g = graph(&[("t0", &[]), ("t1", &["t0"]), ("t2", &["t1"]), ("t3", &["t2"])]);
    let schedule =
        recursively_schedule(&g, &["t3".to_string()], |name| Ok(name == "t1")).unwrap();

    let expected: BTreeSet<String> = ["t2", "t3"].iter().map(|s| s.to_string()).collect();
    assert_eq!(schedule, expected);
}

#[test]
fn test_schedule_rejects_unknown_target() {
    let g = graph(&[("a", &[])]);
    let err = recursively_schedule(&g, &["zzz".to_string()], |_| Ok(false)).unwrap_err();
    assert!(matches!(err, BatchdagError::TaskNotFound(name) if name == "zzz"));
}

#[test]
fn test_run_schedule_runs_dependencies_first() {
    let g = graph(&[("a", &[]), ("b", &["a"]), ("c", &["b", "a"]), ("d", &[])]);
    let schedule: BTreeSet<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();

    let mut seen = Vec::new();
    let executed = run_schedule(&g, schedule, |name| {
        seen.push(name.to_string());
        Ok(())
    })
    .unwrap();

    assert_eq!(executed, seen);
    let pos = |n: &str| executed.iter().position(|e| e == n).unwrap();
    assert!(pos("a") < pos("b"));
    assert!(pos("b") < pos("c"));
    assert_eq!(executed.len(), 4);
}

#[test]
fn test_run_schedule_stops_on_first_failure() {
    let g = graph(&[("a", &[]), ("b", &["a"])]);
    let schedule: BTreeSet<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();

    let mut ran = Vec::new();
    let result = run_schedule(&g, schedule, |name| {
        ran.push(name.to_string());
        Err(BatchdagError::TaskFailed {
            task: name.to_string(),
            code: 2,
        })
    });

    assert!(matches!(result, Err(BatchdagError::TaskFailed { code: 2, .. })));
    assert_eq!(ran, vec!["a".to_string()]);
}

#[test]
fn test_run_schedule_stalls_on_unchecked_cycle() {
    let g = graph(&[("a", &["b"]), ("b", &["a"])]);
    let schedule: BTreeSet<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();

    let err = run_schedule(&g, schedule, |_| Ok(())).unwrap_err();
    match err {
        BatchdagError::ScheduleStalled(left) => assert_eq!(left, vec!["a".to_string(), "b".to_string()]),
        other => panic!("Expected ScheduleStalled, got: {:?}", other),
    }
}

// Acyclic by construction: task N only depends on tasks 0..N-1.
fn acyclic_deps_strategy(max_tasks: usize) -> impl Strategy<Value = Vec<Vec<usize>>> {
    (1..=max_tasks).prop_flat_map(|num_tasks| {
        proptest::collection::vec(
            proptest::collection::vec(any::<usize>(), 0..num_tasks),
            num_tasks,
        )
        .prop_map(|raw| {
            raw.into_iter()
                .enumerate()
                .map(|(i, potential)| {
                    let mut deps: Vec<usize> = if i == 0 {
                        Vec::new()
                    } else {
                        potential.into_iter().map(|d| d % i).collect()
                    };
                    deps.sort();
                    deps.dedup();
                    deps
                })
                .collect()
        })
    })
}

fn graph_from_indices(deps: &[Vec<usize>]) -> DagGraph {
    let owned: Vec<(String, Vec<TaskName>)> = deps
        .iter()
        .enumerate()
        .map(|(i, ds)| (format!("task_{i}"), ds.iter().map(|d| format!("task_{d}")).collect()))
        .collect();
    DagGraph::from_deps(owned.iter().map(|(n, d)| (n.as_str(), d.as_slice())))
}

proptest! {
    #[test]
    fn test_acyclic_graphs_validate(deps in acyclic_deps_strategy(12)) {
        let g = graph_from_indices(&deps);
        prop_assert!(g.check().is_ok());
    }

    #[test]
    fn test_full_schedule_runs_every_task_once_in_order(deps in acyclic_deps_strategy(12)) {
        let g = graph_from_indices(&deps);
        let targets: Vec<String> = g.tasks().map(str::to_string).collect();
        let schedule = recursively_schedule(&g, &targets, |_| Ok(false)).unwrap();
        prop_assert_eq!(schedule.len(), deps.len());

        let executed = run_schedule(&g, schedule.clone(), |_| Ok(())).unwrap();
        prop_assert_eq!(executed.len(), deps.len());
        for (i, ds) in deps.iter().enumerate() {
            let pos = |n: &str| executed.iter().position(|e| e == n).unwrap();
            for d in ds {
                let dep = format!("task_{}", d);
                let task = format!("task_{}", i);
                prop_assert!(pos(&dep) < pos(&task), "{} ran after {}", dep, task);
            }
        }

        let order = g.execution_order(&schedule).unwrap();
        prop_assert_eq!(order.len(), deps.len());
    }

    #[test]
    fn test_ring_reports_full_cycle(len in 2usize..8) {
        // task_0 -> task_1 -> ... -> task_{len-1} -> task_0
        let deps: Vec<Vec<usize>> = (0..len).map(|i| vec![(i + 1) % len]).collect();
        let g = graph_from_indices(&deps);

        let mut expected: Vec<String> = (0..len).map(|i| format!("task_{i}")).collect();
        expected.push("task_0".to_string());

        match g.check() {
            Err(BatchdagError::DagCycle(path)) => prop_assert_eq!(path, expected.join(" -> ")),
            other => prop_assert!(false, "Expected DagCycle, got {:?}", other),
        }
    }
}
