// src/config/mod.rs

//! Pipeline files for batchdag.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a pipeline file from disk (`loader.rs`).
//! - Validate tasks, resources and the dependency graph (`validate.rs`).
//! - Build a [`Runner`](crate::runner::Runner) out of a validated file (`build.rs`).

pub mod build;
pub mod loader;
pub mod model;
pub mod validate;

pub use build::{build_runner, BuildContext};
pub use loader::{load_and_validate, load_from_path, load_runner, load_runner_with_fs};
pub use model::{PipelineFile, PipelineSection, PortsConfig, ResourceConfig, TaskConfig};
