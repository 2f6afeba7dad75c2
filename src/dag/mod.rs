// src/dag/mod.rs

//! Dependency graph and scheduling.
//!
//! - [`graph`] holds the declared dependency graph and its validation.
//! - [`scheduler`] computes the minimal schedule for a target and runs it
//!   in dependency order.

pub mod graph;
pub mod scheduler;

pub use graph::DagGraph;
pub use scheduler::{recursively_schedule, run_schedule};
