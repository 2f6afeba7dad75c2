// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BatchdagError {
    /// A required naming attribute had no value at any precedence level.
    #[error("unresolved attribute `{attribute}` for {owner}")]
    UnresolvedAttribute {
        attribute: &'static str,
        owner: String,
    },

    #[error("namespace of {owner} must be a string, got {found}")]
    InvalidType { owner: String, found: String },

    #[error("Cycle detected in DAG: {0}")]
    DagCycle(String),

    #[error("{dependency} is listed as a dependency of {referrer} but never declared")]
    MissingDependency {
        dependency: String,
        referrer: String,
    },

    #[error("refusing to overwrite existing artifact {0:?}")]
    OverwriteRefused(PathBuf),

    #[error(
        "task {0} does not declare outputs; declare `Ports::None` explicitly for tasks without outputs"
    )]
    MissingOutputs(String),

    #[error("not implemented: {0}")]
    NotImplemented(String),

    #[error("path kind collision at {path:?}: expected a {expected}")]
    PathKindCollision { path: PathBuf, expected: &'static str },

    #[error("{0} is not ready; bind it before use")]
    NotReady(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("task {task} failed with exit code {code}")]
    TaskFailed { task: String, code: i32 },

    #[error("schedule made no progress; remaining tasks: {0:?}")]
    ScheduleStalled(Vec<String>),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, BatchdagError>;
