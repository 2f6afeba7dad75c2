// src/resource/folder.rs

use std::fmt;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::errors::{BatchdagError, Result};
use crate::fs::{FileSystem, RealFileSystem, WriteMode};
use crate::naming::{Naming, NamingExt};
use crate::resource::{NameFilter, Resource};

/// Kind of entry expected at a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

impl EntryKind {
    fn describe(self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Dir => "directory",
        }
    }
}

/// A directory named `[namespace_][trial_]basename` inside `parent`.
///
/// Children are addressed by plain names; only the folder itself carries
/// the naming decorations.
pub struct Folder {
    parent: PathBuf,
    basename: String,
    naming: Naming,
    fs: Arc<dyn FileSystem>,
}

impl fmt::Debug for Folder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Folder")
            .field("parent", &self.parent)
            .field("basename", &self.basename)
            .field("naming", &self.naming)
            .finish_non_exhaustive()
    }
}

impl Folder {
    pub fn new(parent: impl Into<PathBuf>, basename: impl Into<String>) -> Self {
        Self {
            parent: parent.into(),
            basename: basename.into(),
            naming: Naming::new(),
            fs: Arc::new(RealFileSystem),
        }
    }

    pub fn with_fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn parent(&self) -> &Path {
        &self.parent
    }

    /// Create the folder if absent.
    pub fn ensure_created(&self) -> Result<PathBuf> {
        let path = self.path()?;
        check_kind(self.fs.as_ref(), &path, EntryKind::Dir)?;
        if !self.fs.is_dir(&path) {
            debug!(folder = ?path, "creating folder");
            self.fs.create_dir_all(&path)?;
        }
        Ok(path)
    }

    /// Path of a child entry, failing if something of the other kind is
    /// already there.
    pub fn child_path(&self, name: &str, kind: EntryKind) -> Result<PathBuf> {
        let path = self.path()?.join(name);
        check_kind(self.fs.as_ref(), &path, kind)?;
        Ok(path)
    }

    pub fn open_child_read(&self, name: &str) -> Result<Box<dyn Read + Send>> {
        let path = self.child_path(name, EntryKind::File)?;
        Ok(self.fs.open_read(&path)?)
    }

    pub fn open_child_write(&self, name: &str, mode: WriteMode) -> Result<Box<dyn Write + Send>> {
        let path = self.child_path(name, EntryKind::File)?;
        if self.fs.exists(&path) && !self.resolved()?.overwrite {
            return Err(BatchdagError::OverwriteRefused(path));
        }
        self.ensure_created()?;
        Ok(self.fs.open_write(&path, mode)?)
    }

    /// Create a child directory if absent.
    pub fn ensure_child_dir(&self, name: &str) -> Result<PathBuf> {
        let path = self.child_path(name, EntryKind::Dir)?;
        self.ensure_created()?;
        if !self.fs.is_dir(&path) {
            self.fs.create_dir_all(&path)?;
        }
        Ok(path)
    }

    /// Immediate file children accepted by `filter`, sorted by path.
    pub fn files(&self, filter: &NameFilter) -> Result<Vec<PathBuf>> {
        let path = self.path()?;
        let mut files: Vec<PathBuf> = self
            .fs
            .read_dir(&path)?
            .into_iter()
            .filter(|p| self.fs.is_file(p))
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| filter.accepts(n))
            })
            .collect();
        files.sort();
        Ok(files)
    }
}

fn check_kind(fs: &dyn FileSystem, path: &Path, kind: EntryKind) -> Result<()> {
    let collides = match kind {
        EntryKind::File => fs.is_dir(path),
        EntryKind::Dir => fs.is_file(path),
    };
    if collides {
        return Err(BatchdagError::PathKindCollision {
            path: path.to_path_buf(),
            expected: kind.describe(),
        });
    }
    Ok(())
}

impl NamingExt for Folder {
    fn naming_slot(&mut self) -> &mut Naming {
        &mut self.naming
    }
}

impl Resource for Folder {
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
        Ok(self.fs.is_dir(&self.path()?))
    }

    fn path(&self) -> Result<PathBuf> {
        let name = self.naming.display_name(&self.basename, &self.basename)?;
        Ok(self.parent.join(name))
    }

    fn prepare_write(&self) -> Result<()> {
        let path = self.path()?;
        if self.fs.is_dir(&path) && !self.resolved()?.overwrite {
            return Err(BatchdagError::OverwriteRefused(path));
        }
        self.ensure_created()?;
        Ok(())
    }

    fn as_folder(&self) -> Option<&Folder> {
        Some(self)
    }
}
