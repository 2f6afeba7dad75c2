// src/resource/mod.rs

//! Artifacts consumed and produced by tasks.
//!
//! - [`file`] is a single file under a base directory.
//! - [`folder`] is a directory with guarded child access and filtered listing.
//! - [`marker`] is the timestamped completion artifact used by marked tasks.
//! - [`filter`] holds the allow/deny name patterns used by folders.
//! - [`ports`] is the None / Single / Ordered / Named shape of a task's
//!   inputs and outputs.

use std::fmt;
use std::io::{Read, Write};
use std::path::PathBuf;

use crate::errors::{BatchdagError, Result};
use crate::fs::WriteMode;
use crate::naming::{BindContext, Naming, Resolved};

pub mod file;
pub mod filter;
pub mod folder;
pub mod marker;
pub mod ports;

pub use file::File;
pub use filter::NameFilter;
pub use folder::{EntryKind, Folder};
pub use marker::Marker;
pub use ports::Ports;

/// Identity and existence/IO contract of an artifact.
///
/// Only [`Resource::naming`], [`Resource::naming_mut`] and
/// [`Resource::label`] are required; storage-backed resources override the
/// rest.
pub trait Resource: fmt::Debug {
    /// Human-readable label used in errors and logs (usually the basename).
    fn label(&self) -> String;

    fn naming(&self) -> &Naming;

    fn naming_mut(&mut self) -> &mut Naming;

    /// Fix this resource's naming attributes for the current run.
    fn bind(&mut self, ctx: &BindContext) -> Result<()> {
        let label = self.label();
        self.naming_mut().bind(&label, ctx)?;
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.naming().is_bound()
    }

    fn resolved(&self) -> Result<&Resolved> {
        self.naming().resolved(&self.label())
    }

    fn exists(&self) -> Result<bool> {
        Err(BatchdagError::NotImplemented(format!(
            "resource {} must implement exists()",
            self.label()
        )))
    }

    /// Resolved storage location.
    fn path(&self) -> Result<PathBuf> {
        Err(BatchdagError::NotImplemented(format!(
            "resource {} has no storage path",
            self.label()
        )))
    }

    fn open_read(&self) -> Result<Box<dyn Read + Send>> {
        Err(BatchdagError::NotImplemented(format!(
            "resource {} cannot be opened for reading",
            self.label()
        )))
    }

    fn open_write(&self, _mode: WriteMode) -> Result<Box<dyn Write + Send>> {
        Err(BatchdagError::NotImplemented(format!(
            "resource {} cannot be opened for writing",
            self.label()
        )))
    }

    /// Apply the overwrite guard and create whatever the artifact needs to
    /// be written by an external process.
    fn prepare_write(&self) -> Result<()> {
        Ok(())
    }

    fn as_folder(&self) -> Option<&Folder> {
        None
    }
}
