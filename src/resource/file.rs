// src/resource/file.rs

use std::fmt;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::errors::{BatchdagError, Result};
use crate::fs::{FileSystem, RealFileSystem, WriteMode};
use crate::naming::{Naming, NamingExt};
use crate::resource::Resource;

/// A single file named `[namespace_][trial_]basename` inside `dir`.
pub struct File {
    dir: PathBuf,
    basename: String,
    naming: Naming,
    fs: Arc<dyn FileSystem>,
}

impl fmt::Debug for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("File")
            .field("dir", &self.dir)
            .field("basename", &self.basename)
            .field("naming", &self.naming)
            .finish_non_exhaustive()
    }
}

impl File {
    pub fn new(dir: impl Into<PathBuf>, basename: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            basename: basename.into(),
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

    pub fn basename(&self) -> &str {
        &self.basename
    }

    /// Resolved file name (without directory).
    pub fn file_name(&self) -> Result<String> {
        self.naming.display_name(&self.basename, &self.basename)
    }

    pub fn read_to_string(&self) -> Result<String> {
        Ok(self.fs.read_to_string(&self.path()?)?)
    }

    fn guard_write(&self, path: &Path) -> Result<()> {
        let resolved = self.resolved()?;
        if self.fs.exists(path) && !resolved.overwrite {
            return Err(BatchdagError::OverwriteRefused(path.to_path_buf()));
        }
        if self.fs.is_file(&self.dir) {
            return Err(BatchdagError::PathKindCollision {
                path: self.dir.clone(),
                expected: "directory",
            });
        }
        if !self.fs.is_dir(&self.dir) {
            debug!(dir = ?self.dir, "creating missing directory");
            self.fs.create_dir_all(&self.dir)?;
        }
        Ok(())
    }
}

impl NamingExt for File {
    fn naming_slot(&mut self) -> &mut Naming {
        &mut self.naming
    }
}

impl Resource for File {
    fn label(&self) -> String {
        self.basename.clone()
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
        Ok(self.dir.join(self.file_name()?))
    }

    fn open_read(&self) -> Result<Box<dyn Read + Send>> {
        Ok(self.fs.open_read(&self.path()?)?)
    }

    fn open_write(&self, mode: WriteMode) -> Result<Box<dyn Write + Send>> {
        let path = self.path()?;
        self.guard_write(&path)?;
        Ok(self.fs.open_write(&path, mode)?)
    }

    fn prepare_write(&self) -> Result<()> {
        self.guard_write(&self.path()?)
    }
}
