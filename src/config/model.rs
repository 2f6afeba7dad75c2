// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::naming::{AttrLayer, Modifiers};
use crate::types::{ParamValue, Params, SchedulePolicy};

/// Top-level pipeline file as read from TOML.
///
/// ```toml
/// [pipeline]
/// namespace = "lot1"
/// root = "data"
///
/// [task.reverse]
/// cmd = "rev < {inputs} > {outputs}"
/// inputs = { file = "0.txt", independent = true }
/// outputs = "1.txt"
///
/// [task.stagger]
/// cmd = "nl {inputs} > {outputs}"
/// after = ["reverse"]
/// inputs = "1.txt"
/// outputs = "2.txt"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawPipelineFile {
    #[serde(default)]
    pub pipeline: PipelineSection,

    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// Naming attributes that pipelines, tasks and resources may declare.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NamingConfig {
    #[serde(default)]
    pub namespace: Option<ParamValue>,
    #[serde(default)]
    pub trial: Option<bool>,
    #[serde(default)]
    pub overwrite: Option<bool>,
    #[serde(default)]
    pub independent: bool,
    #[serde(default)]
    pub shared_namespace: bool,
    #[serde(default)]
    pub namespace_only: bool,
}

impl NamingConfig {
    /// Values from the file act as declared defaults.
    pub fn declared(&self) -> AttrLayer {
        AttrLayer {
            namespace: self.namespace.clone(),
            trial: self.trial,
            overwrite: self.overwrite,
        }
    }

    pub fn modifiers(&self) -> Modifiers {
        Modifiers {
            independent: self.independent,
            shared_namespace: self.shared_namespace,
            namespace_only: self.namespace_only,
        }
    }
}

fn default_pipeline_name() -> String {
    crate::runner::DEFAULT_RUNNER_NAME.to_string()
}

fn default_root() -> String {
    ".".to_string()
}

fn default_marker_dir() -> String {
    ".batchdag/markers".to_string()
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSection {
    #[serde(default = "default_pipeline_name")]
    pub name: String,

    /// Base directory of every resource, relative to the pipeline file.
    #[serde(default = "default_root")]
    pub root: String,

    /// Directory for completion markers, relative to the pipeline file.
    #[serde(default = "default_marker_dir")]
    pub marker_dir: String,

    /// Tasks to run when no target is given on the command line.
    #[serde(default)]
    pub target: Option<Vec<String>>,

    #[serde(default)]
    pub schedule_policy: SchedulePolicy,

    #[serde(flatten)]
    pub naming: NamingConfig,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            name: default_pipeline_name(),
            root: default_root(),
            marker_dir: default_marker_dir(),
            target: None,
            schedule_policy: SchedulePolicy::default(),
            naming: NamingConfig::default(),
        }
    }
}

/// One resource entry: a bare relative file path or a detailed table.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ResourceConfig {
    Path(String),
    Detailed(ResourceSpec),
}

/// Detailed resource entry. Exactly one of `file` / `folder` must be set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceSpec {
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default)]
    pub namespace: Option<ParamValue>,
    #[serde(default)]
    pub trial: Option<bool>,
    #[serde(default)]
    pub overwrite: Option<bool>,
    #[serde(default)]
    pub independent: bool,
    #[serde(default)]
    pub shared_namespace: bool,
    #[serde(default)]
    pub namespace_only: bool,
}

impl ResourceSpec {
    pub fn naming(&self) -> NamingConfig {
        NamingConfig {
            namespace: self.namespace.clone(),
            trial: self.trial,
            overwrite: self.overwrite,
            independent: self.independent,
            shared_namespace: self.shared_namespace,
            namespace_only: self.namespace_only,
        }
    }
}

/// Shape of `inputs` / `outputs`.
///
/// A table whose only keys are resource fields (`file`, `folder`, ...) is a
/// single resource; any other table is a name-keyed mapping. Arrays are
/// tried first so they never deserialize as a struct sequence.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PortsConfig {
    Ordered(Vec<ResourceConfig>),
    Single(ResourceConfig),
    Named(BTreeMap<String, ResourceConfig>),
}

/// `marker = true` or `marker = "marker+outputs"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MarkerConfig {
    Enabled(bool),
    Mode(String),
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// Shell command to run; mutually exclusive with `pipeline`.
    #[serde(default)]
    pub cmd: Option<String>,

    /// Nested pipeline file, relative to this file.
    #[serde(default)]
    pub pipeline: Option<String>,

    /// Dependency list: this task waits for all tasks listed here.
    #[serde(default)]
    pub after: Vec<String>,

    #[serde(default)]
    pub inputs: Option<PortsConfig>,

    /// Required for command tasks; `outputs = []` declares "no outputs".
    #[serde(default)]
    pub outputs: Option<PortsConfig>,

    #[serde(default)]
    pub marker: Option<MarkerConfig>,

    #[serde(default)]
    pub params: Params,

    #[serde(flatten)]
    pub naming: NamingConfig,
}

/// A validated pipeline file.
///
/// Construct through [`TryFrom<RawPipelineFile>`], which runs validation.
#[derive(Debug, Clone)]
pub struct PipelineFile {
    pipeline: PipelineSection,
    task: BTreeMap<String, TaskConfig>,
}

impl PipelineFile {
    pub(crate) fn new_unchecked(pipeline: PipelineSection, task: BTreeMap<String, TaskConfig>) -> Self {
        Self { pipeline, task }
    }

    pub fn pipeline(&self) -> &PipelineSection {
        &self.pipeline
    }

    pub fn tasks(&self) -> &BTreeMap<String, TaskConfig> {
        &self.task
    }
}
