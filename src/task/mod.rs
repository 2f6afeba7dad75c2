// src/task/mod.rs

//! Units of work.
//!
//! A task is any type implementing [`Task`] around an embedded [`TaskCore`].
//! The core carries everything the runner needs: the assigned name, the
//! parameter signature, naming attributes, declared inputs/outputs and the
//! [`Completion`] strategy. Task authors only write `run` (and optionally
//! `exists` or `after_run`).

use std::fmt;

use tracing::{debug, info};

use crate::errors::{BatchdagError, Result};
use crate::naming::{BindContext, Naming, NamingExt, Resolved};
use crate::resource::{Marker, Ports, Resource};
use crate::types::{ParamValue, Params, TaskIdentity};

pub mod command;

pub use command::{CommandTask, CommandTemplate};

/// How a task decides that it has already done its job.
#[derive(Debug, Default)]
pub enum Completion {
    /// Complete iff every declared output exists.
    #[default]
    Outputs,
    /// Complete iff the marker exists, whatever happened to the outputs.
    Marker(Marker),
    /// Complete iff the marker and every declared output exist.
    MarkerAndOutputs(Marker),
}

impl Completion {
    pub fn marker(&self) -> Option<&Marker> {
        match self {
            Completion::Outputs => None,
            Completion::Marker(m) | Completion::MarkerAndOutputs(m) => Some(m),
        }
    }

    fn marker_mut(&mut self) -> Option<&mut Marker> {
        match self {
            Completion::Outputs => None,
            Completion::Marker(m) | Completion::MarkerAndOutputs(m) => Some(m),
        }
    }

    pub fn is_complete(&self, outputs: &[&dyn Resource]) -> Result<bool> {
        match self {
            Completion::Outputs => all_exist(outputs),
            Completion::Marker(m) => m.exists(),
            Completion::MarkerAndOutputs(m) => Ok(m.exists()? && all_exist(outputs)?),
        }
    }

    /// Called once after every successful run.
    pub fn on_success(&self) -> Result<()> {
        match self.marker() {
            Some(m) => m.mark_done(),
            None => Ok(()),
        }
    }
}

fn all_exist(resources: &[&dyn Resource]) -> Result<bool> {
    for r in resources {
        if !r.exists()? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// State shared by every task implementation.
#[derive(Debug, Default)]
pub struct TaskCore {
    name: Option<String>,
    params: Params,
    naming: Naming,
    inputs: Ports,
    /// `None` until the author declares outputs (possibly `Ports::None`).
    outputs: Option<Ports>,
    completion: Completion,
    bound: bool,
}

impl TaskCore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key, value);
        self
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn with_inputs(mut self, inputs: Ports) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn with_outputs(mut self, outputs: Ports) -> Self {
        self.outputs = Some(outputs);
        self
    }

    /// Explicitly declare that this task has no outputs.
    pub fn without_outputs(self) -> Self {
        self.with_outputs(Ports::None)
    }

    pub fn with_completion(mut self, completion: Completion) -> Self {
        self.completion = completion;
        self
    }

    pub fn with_marker(self, marker: Marker) -> Self {
        self.with_completion(Completion::Marker(marker))
    }

    /// Name assigned by the owning runner, or `<unnamed>` before binding.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn naming(&self) -> &Naming {
        &self.naming
    }

    pub fn resolved(&self) -> Result<&Resolved> {
        self.naming.resolved(self.name())
    }

    pub fn inputs(&self) -> &Ports {
        &self.inputs
    }

    /// Declared outputs, or a missing-declaration error.
    pub fn outputs(&self) -> Result<&Ports> {
        self.outputs
            .as_ref()
            .ok_or_else(|| BatchdagError::MissingOutputs(self.name().to_string()))
    }

    pub fn completion(&self) -> &Completion {
        &self.completion
    }

    pub fn is_bound(&self) -> bool {
        self.bound
    }

    /// Resolve this task's naming attributes and bind every input, output
    /// and marker with them. A second call is a no-op.
    pub fn bind(&mut self, name: &str, ctx: &BindContext) -> Result<()> {
        if self.bound {
            debug!(task = %name, "already bound; skipping");
            return Ok(());
        }
        self.name = Some(name.to_string());

        let outputs = self
            .outputs
            .as_mut()
            .ok_or_else(|| BatchdagError::MissingOutputs(name.to_string()))?;

        let resolved = self.naming.bind(name, ctx)?;
        let inherited = BindContext {
            scope: ctx.scope.clone(),
            ..BindContext::from(&*resolved)
        };

        self.inputs.bind_all(&inherited)?;
        outputs.bind_all(&inherited)?;
        if let Some(marker) = self.completion.marker_mut() {
            marker.bind_for(&ctx.qualify(name), &inherited)?;
        }

        debug!(
            task = %name,
            namespace = ?inherited.namespace,
            trial = ?inherited.trial,
            overwrite = ?inherited.overwrite,
            "task bound"
        );
        self.bound = true;
        Ok(())
    }
}

impl NamingExt for TaskCore {
    fn naming_slot(&mut self) -> &mut Naming {
        &mut self.naming
    }
}

/// A named unit of work.
pub trait Task: fmt::Debug {
    fn core(&self) -> &TaskCore;

    fn core_mut(&mut self) -> &mut TaskCore;

    /// Kind of task, part of its identity.
    fn kind(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn identity(&self) -> TaskIdentity {
        TaskIdentity::new(self.kind(), self.core().params().clone())
    }

    fn bind(&mut self, name: &str, ctx: &BindContext) -> Result<()> {
        self.core_mut().bind(name, ctx)
    }

    /// Structural checks that must pass before anything runs.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Every output resource this task stands for.
    fn output_resources(&self) -> Result<Vec<&dyn Resource>> {
        Ok(self.core().outputs()?.resources())
    }

    /// Whether the task has already done its job.
    fn exists(&self) -> Result<bool> {
        let outputs = self.output_resources()?;
        self.core().completion().is_complete(&outputs)
    }

    fn run(&mut self) -> Result<()> {
        Err(BatchdagError::NotImplemented(format!(
            "task {} must implement run()",
            self.core().name()
        )))
    }

    /// Hook called after a successful `run`, before the completion marker
    /// is written.
    fn after_run(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Run a bound task and record its completion.
pub fn execute(task: &mut dyn Task) -> Result<()> {
    let name = task.core().name().to_string();
    if !task.core().is_bound() {
        return Err(BatchdagError::NotReady(format!("task {name}")));
    }
    info!(task = %name, "running task");
    task.run()?;
    task.after_run()?;
    task.core().completion().on_success()?;
    debug!(task = %name, "task finished");
    Ok(())
}
