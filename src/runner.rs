// src/runner.rs

//! Runners: tasks made of tasks.
//!
//! A [`Runner`] owns named sub-tasks with their dependency names. Running it
//! binds the naming context down the task tree, validates the dependency
//! graph (including nested runners), computes the minimal schedule for the
//! target and executes it one task at a time.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::{debug, info};

use crate::dag::{recursively_schedule, run_schedule, DagGraph};
use crate::errors::{BatchdagError, Result};
use crate::naming::{BindContext, Naming, NamingExt};
use crate::resource::{Marker, Resource};
use crate::task::{self, Completion, Task, TaskCore};
use crate::types::{SchedulePolicy, TaskIdentity, TaskName};

/// Name a top-level runner binds under unless told otherwise.
pub const DEFAULT_RUNNER_NAME: &str = "main";

/// A declared sub-task and the names it depends on.
#[derive(Debug)]
pub struct TaskEntry {
    pub task: Box<dyn Task>,
    pub deps: Vec<TaskName>,
}

/// Lifecycle of a runner. Phases only move forward; running a completed
/// runner again re-checks completion without re-binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    Unbound,
    Bound,
    Scheduled,
    Running,
    Complete,
}

/// Arguments of a top-level invocation.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub namespace: Option<String>,
    pub trial: bool,
    pub target: Option<Vec<TaskName>>,
    pub overwrite: bool,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn trial(mut self, trial: bool) -> Self {
        self.trial = trial;
        self
    }

    pub fn target<I, S>(mut self, target: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskName>,
    {
        self.target = Some(target.into_iter().map(Into::into).collect());
        self
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

/// What a run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Tasks selected by scheduling.
    pub scheduled: BTreeSet<TaskName>,
    /// Tasks in the order they ran.
    pub executed: Vec<TaskName>,
}

#[derive(Debug)]
pub struct Runner {
    core: TaskCore,
    label: String,
    tasks: BTreeMap<TaskName, TaskEntry>,
    target: Option<Vec<TaskName>>,
    policy: SchedulePolicy,
    state: RunnerState,
    last_report: RunReport,
    /// Set when bound as the outermost runner; its tasks are not scoped
    /// under its label.
    top_level: bool,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner {
    pub fn new() -> Self {
        Self {
            core: TaskCore::new().without_outputs(),
            label: DEFAULT_RUNNER_NAME.to_string(),
            tasks: BTreeMap::new(),
            target: None,
            policy: SchedulePolicy::default(),
            state: RunnerState::Unbound,
            last_report: RunReport::default(),
            top_level: false,
        }
    }

    /// Name used when this runner is invoked at the top level.
    pub fn named(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Declare a task without dependencies.
    pub fn task(self, name: impl Into<TaskName>, task: impl Task + 'static) -> Self {
        self.task_after(name, task, Vec::<TaskName>::new())
    }

    /// Declare a task that runs after `deps`.
    pub fn task_after<I, S>(mut self, name: impl Into<TaskName>, task: impl Task + 'static, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskName>,
    {
        let deps = deps.into_iter().map(Into::into).collect();
        self.add_task(name, Box::new(task), deps);
        self
    }

    pub fn add_task(&mut self, name: impl Into<TaskName>, task: Box<dyn Task>, deps: Vec<TaskName>) {
        self.tasks.insert(name.into(), TaskEntry { task, deps });
    }

    pub fn with_target<I, S>(mut self, target: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskName>,
    {
        self.target = Some(target.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_policy(mut self, policy: SchedulePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Track completion of the whole runner with a marker.
    pub fn with_marker(self, marker: Marker) -> Self {
        self.with_completion(Completion::Marker(marker))
    }

    pub fn with_completion(mut self, completion: Completion) -> Self {
        let core = std::mem::take(&mut self.core);
        self.core = core.with_completion(completion);
        self
    }

    pub fn state(&self) -> RunnerState {
        self.state
    }

    pub fn last_report(&self) -> &RunReport {
        &self.last_report
    }

    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(|s| s.as_str())
    }

    pub fn get_task(&self, name: &str) -> Option<&dyn Task> {
        self.tasks.get(name).map(|e| e.task.as_ref())
    }

    pub fn graph(&self) -> DagGraph {
        DagGraph::from_deps(
            self.tasks
                .iter()
                .map(|(name, entry)| (name.as_str(), entry.deps.as_slice())),
        )
    }

    /// Validate this runner's dependency graph.
    pub fn check_schedule(&self) -> Result<()> {
        self.graph().check()
    }

    /// Groups of task names that share the same identity.
    pub fn duplicate_identities(&self) -> Vec<Vec<TaskName>> {
        let mut by_identity: HashMap<TaskIdentity, Vec<TaskName>> = HashMap::new();
        for (name, entry) in &self.tasks {
            by_identity
                .entry(entry.task.identity())
                .or_default()
                .push(name.clone());
        }
        let mut groups: Vec<Vec<TaskName>> = by_identity
            .into_values()
            .filter(|names| names.len() > 1)
            .collect();
        groups.sort();
        groups
    }

    fn targets(&self) -> Vec<TaskName> {
        match &self.target {
            Some(target) => target.clone(),
            None => self.tasks.keys().cloned().collect(),
        }
    }

    /// Tasks that must run to satisfy `targets` given current completion.
    pub fn recursively_schedule(&self, targets: &[TaskName]) -> Result<BTreeSet<TaskName>> {
        let graph = self.graph();
        recursively_schedule(&graph, targets, |name| {
            let entry = self
                .tasks
                .get(name)
                .ok_or_else(|| BatchdagError::TaskNotFound(name.to_string()))?;
            if self.policy == SchedulePolicy::OwnOverwriteFlag
                && entry.task.core().resolved()?.overwrite
            {
                debug!(task = %name, "overwrite requested; scheduling regardless of existence");
                return Ok(false);
            }
            entry.task.exists()
        })
    }

    /// Bind as a top-level runner and require a namespace unless this runner
    /// ignores namespaces.
    fn bind_top_level(&mut self, options: &RunOptions) -> Result<()> {
        let ctx = BindContext::top_level(options.namespace.clone(), options.trial, options.overwrite);
        let label = self.label.clone();
        self.top_level = true;
        Task::bind(self, &label, &ctx)?;

        let resolved = self.core.resolved()?;
        if resolved.namespace.is_none() && !self.core.naming().modifiers.ignores_namespace() {
            return Err(BatchdagError::UnresolvedAttribute {
                attribute: "namespace",
                owner: format!("runner {label}"),
            });
        }

        if let Some(target) = &options.target {
            self.target = Some(target.clone());
        }
        Ok(())
    }

    /// Run the pipeline as the top-level runner.
    pub fn run_pipeline(&mut self, options: RunOptions) -> Result<RunReport> {
        self.bind_top_level(&options)?;
        info!(
            runner = %self.label,
            namespace = ?self.core.resolved()?.namespace,
            trial = options.trial,
            "starting pipeline"
        );
        self.execute()?;
        Ok(self.last_report.clone())
    }

    /// Bind, validate and schedule without running anything. Returns the
    /// scheduled tasks in an order that respects their dependencies.
    pub fn plan(&mut self, options: RunOptions) -> Result<Vec<TaskName>> {
        self.bind_top_level(&options)?;
        Task::validate(self)?;
        let schedule = self.recursively_schedule(&self.targets())?;
        self.graph().execution_order(&schedule)
    }

    fn execute(&mut self) -> Result<()> {
        if self.state == RunnerState::Unbound {
            return Err(BatchdagError::NotReady(format!("runner {}", self.core.name())));
        }
        Task::validate(self)?;

        let schedule = self.recursively_schedule(&self.targets())?;
        self.state = RunnerState::Scheduled;
        info!(
            runner = %self.core.name(),
            scheduled = ?schedule,
            "computed schedule"
        );

        let graph = self.graph();
        self.state = RunnerState::Running;
        let tasks = &mut self.tasks;
        let executed = run_schedule(&graph, schedule.clone(), |name| {
            let entry = tasks
                .get_mut(name)
                .ok_or_else(|| BatchdagError::TaskNotFound(name.to_string()))?;
            task::execute(entry.task.as_mut())
        })?;

        self.state = RunnerState::Complete;
        self.last_report = RunReport {
            scheduled: schedule,
            executed,
        };
        Ok(())
    }
}

impl NamingExt for Runner {
    fn naming_slot(&mut self) -> &mut Naming {
        self.core.naming_slot()
    }
}

impl Task for Runner {
    fn core(&self) -> &TaskCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TaskCore {
        &mut self.core
    }

    fn kind(&self) -> &'static str {
        "runner"
    }

    fn identity(&self) -> TaskIdentity {
        let params = self
            .tasks
            .iter()
            .map(|(name, entry)| (name.clone(), entry.task.identity().fingerprint()))
            .collect();
        TaskIdentity::new(self.kind(), params)
    }

    fn bind(&mut self, name: &str, ctx: &BindContext) -> Result<()> {
        if self.core.is_bound() {
            return Ok(());
        }
        self.core.bind(name, ctx)?;
        let mut inherited = BindContext {
            scope: ctx.scope.clone(),
            ..BindContext::from(self.core.resolved()?)
        };
        if !self.top_level {
            inherited = inherited.entering(name);
        }
        for (task_name, entry) in self.tasks.iter_mut() {
            entry.task.bind(task_name, &inherited)?;
        }

        for group in self.duplicate_identities() {
            debug!(runner = %name, tasks = ?group, "tasks share the same identity");
        }
        self.state = RunnerState::Bound;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        self.check_schedule()?;
        for entry in self.tasks.values() {
            entry.task.validate()?;
        }
        Ok(())
    }

    /// Union of the outputs of every declared task.
    fn output_resources(&self) -> Result<Vec<&dyn Resource>> {
        let mut all = Vec::new();
        for entry in self.tasks.values() {
            all.extend(entry.task.output_resources()?);
        }
        Ok(all)
    }

    fn run(&mut self) -> Result<()> {
        self.execute()
    }
}
