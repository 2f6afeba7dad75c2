// src/resource/marker.rs

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use tracing::debug;

use crate::errors::{BatchdagError, Result};
use crate::fs::{FileSystem, RealFileSystem, WriteMode};
use crate::naming::{BindContext, Naming, NamingExt};
use crate::resource::Resource;

/// File extension of completion markers.
pub const MARKER_EXTENSION: &str = "marker";

/// Completion artifact of a task: `<dir>/[namespace_][trial_]<task>.marker`.
///
/// Each successful run appends one timestamp line; the marker's existence
/// alone says the task has done its job.
pub struct Marker {
    dir: PathBuf,
    task: Option<String>,
    naming: Naming,
    fs: Arc<dyn FileSystem>,
}

impl fmt::Debug for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Marker")
            .field("dir", &self.dir)
            .field("task", &self.task)
            .field("naming", &self.naming)
            .finish_non_exhaustive()
    }
}

impl Marker {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            task: None,
            naming: Naming::new(),
            fs: Arc::new(RealFileSystem),
        }
    }

    pub fn with_fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Bind the marker to the task that owns it.
    pub fn bind_for(&mut self, task: &str, ctx: &BindContext) -> Result<()> {
        self.task = Some(task.to_string());
        self.bind(ctx)
    }

    /// Append a completion timestamp, creating the marker if needed.
    pub fn mark_done(&self) -> Result<()> {
        let path = self.path()?;
        if self.fs.is_file(&self.dir) {
            return Err(BatchdagError::PathKindCollision {
                path: self.dir.clone(),
                expected: "directory",
            });
        }
        self.fs.create_dir_all(&self.dir)?;
        let mut out = self.fs.open_write(&path, WriteMode::Append)?;
        writeln!(out, "{}", Local::now().to_rfc3339())?;
        out.flush()?;
        debug!(marker = ?path, "marked task as done");
        Ok(())
    }
}

impl NamingExt for Marker {
    fn naming_slot(&mut self) -> &mut Naming {
        &mut self.naming
    }
}

impl Resource for Marker {
    fn label(&self) -> String {
        match &self.task {
            Some(task) => format!("{task}.{MARKER_EXTENSION}"),
            None => format!("<unbound>.{MARKER_EXTENSION}"),
        }
    }

    fn naming(&self) -> &Naming {
        &self.naming
    }

    fn naming_mut(&mut self) -> &mut Naming {
        &mut self.naming
    }

    fn exists(&self) -> Result<bool> {
        Ok(self.fs.is_file(&self.path()?))
    }

    fn path(&self) -> Result<PathBuf> {
        let label = self.label();
        if self.task.is_none() {
            return Err(BatchdagError::NotReady(label));
        }
        Ok(self.dir.join(self.naming.display_name(&label, &label)?))
    }
}
