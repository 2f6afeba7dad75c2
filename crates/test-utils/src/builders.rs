#![allow(dead_code)]

use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use batchdag::errors::Result;
use batchdag::fs::{FileSystem, WriteMode};
use batchdag::naming::NamingExt;
use batchdag::resource::{File, Folder, Ports, Resource};
use batchdag::task::{Task, TaskCore};

/// Shared, ordered log of task runs.
#[derive(Debug, Clone, Default)]
pub struct RunLog(Arc<Mutex<Vec<String>>>);

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, name: &str) {
        self.0.lock().unwrap().push(name.to_string());
    }

    /// Names in the order they ran.
    pub fn runs(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|n| *n == name).count()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

/// A task that records each run and writes `<task name>\n` into every
/// output file (and into `result.txt` inside every output folder).
#[derive(Debug)]
pub struct RecordingTask {
    core: TaskCore,
    log: RunLog,
}

impl RecordingTask {
    pub fn new(core: TaskCore, log: &RunLog) -> Self {
        Self {
            core,
            log: log.clone(),
        }
    }
}

impl NamingExt for RecordingTask {
    fn naming_slot(&mut self) -> &mut batchdag::naming::Naming {
        self.core.naming_slot()
    }
}

impl Task for RecordingTask {
    fn core(&self) -> &TaskCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TaskCore {
        &mut self.core
    }

    fn kind(&self) -> &'static str {
        "recording"
    }

    fn run(&mut self) -> Result<()> {
        let name = self.core.name().to_string();
        self.log.record(&name);
        for output in self.core.outputs()?.resources() {
            write_payload(output, &name)?;
        }
        Ok(())
    }
}

fn write_payload(output: &dyn Resource, payload: &str) -> Result<()> {
    match output.as_folder() {
        Some(folder) => {
            let mut w = folder.open_child_write("result.txt", WriteMode::Truncate)?;
            writeln!(w, "{payload}")?;
        }
        None => {
            let mut w = output.open_write(WriteMode::Truncate)?;
            writeln!(w, "{payload}")?;
        }
    }
    Ok(())
}

/// A task with no `run` implementation.
#[derive(Debug)]
pub struct UnimplementedTask {
    core: TaskCore,
}

impl UnimplementedTask {
    pub fn new(core: TaskCore) -> Self {
        Self { core }
    }
}

impl Task for UnimplementedTask {
    fn core(&self) -> &TaskCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TaskCore {
        &mut self.core
    }
}

/// `File` in `dir` backed by `fs`.
pub fn file_in(fs: &Arc<dyn FileSystem>, dir: impl AsRef<Path>, basename: &str) -> File {
    File::new(dir.as_ref(), basename).with_fs(fs.clone())
}

/// `Folder` under `parent` backed by `fs`.
pub fn folder_in(fs: &Arc<dyn FileSystem>, parent: impl AsRef<Path>, basename: &str) -> Folder {
    Folder::new(parent.as_ref(), basename).with_fs(fs.clone())
}

/// Core of a task that reads `input` and writes `output`.
pub fn io_core(input: Option<File>, output: File) -> TaskCore {
    let core = TaskCore::new().with_outputs(Ports::single(output));
    match input {
        Some(input) => core.with_inputs(Ports::single(input)),
        None => core,
    }
}
