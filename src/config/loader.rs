// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::build::{build_runner, BuildContext};
use crate::config::model::{PipelineFile, RawPipelineFile};
use crate::errors::Result;
use crate::fs::{FileSystem, RealFileSystem};
use crate::runner::Runner;

/// Load a pipeline file from a given path and return the raw `RawPipelineFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation (DAG correctness, etc.). Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawPipelineFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawPipelineFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a pipeline file from path and run validation.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks for:
///   - tasks that set neither or both of `cmd` / `pipeline`,
///   - malformed resources and command templates,
///   - unknown `after` references and dependency cycles.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<PipelineFile> {
    let raw_config = load_from_path(&path)?;
    let config = PipelineFile::try_from(raw_config)?;
    Ok(config)
}

/// Load, validate and build the runner described by the file at `path`.
///
/// Resources use the real filesystem.
pub fn load_runner(path: impl AsRef<Path>) -> Result<Runner> {
    load_runner_with_fs(path, Arc::new(RealFileSystem))
}

/// Like [`load_runner`], with resources and markers going through `fs`.
///
/// Pipeline files, nested ones included, are always read from disk: `fs`
/// only backs what the tasks read, write and mark.
pub fn load_runner_with_fs(path: impl AsRef<Path>, fs: Arc<dyn FileSystem>) -> Result<Runner> {
    let path = path.as_ref();
    let file = load_and_validate(&path)?;
    // Absolute, so resource paths stay valid inside each command's workdir.
    let canonical = std::fs::canonicalize(path)?;
    let base_dir = config_root_dir(&canonical);

    let mut ctx = BuildContext::new(&base_dir, fs);
    ctx.include_stack.push(canonical);
    build_runner(&file, &mut ctx)
}

/// Directory that relative paths in the file at `config_path` start from.
///
/// A bare file name like `Pipeline.toml` (parent = "") maps to ".".
pub fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
