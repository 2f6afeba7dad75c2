// src/config/validate.rs

use crate::config::model::{
    MarkerConfig, PipelineFile, PortsConfig, RawPipelineFile, ResourceConfig, TaskConfig,
};
use crate::dag::DagGraph;
use crate::errors::{BatchdagError, Result};
use crate::task::CommandTemplate;

/// Marker mode strings accepted by `marker = "..."`.
pub const MARKER_ONLY: &str = "marker";
pub const MARKER_AND_OUTPUTS: &str = "marker+outputs";

impl TryFrom<RawPipelineFile> for PipelineFile {
    type Error = BatchdagError;

    fn try_from(raw: RawPipelineFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_pipeline(&raw)?;
        Ok(PipelineFile::new_unchecked(raw.pipeline, raw.task))
    }
}

fn validate_raw_pipeline(cfg: &RawPipelineFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    for (name, task) in cfg.task.iter() {
        validate_task(name, task)?;
    }
    validate_targets(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn config_error(msg: String) -> BatchdagError {
    BatchdagError::ConfigError(msg)
}

fn ensure_has_tasks(cfg: &RawPipelineFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(config_error(
            "pipeline must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_task(name: &str, task: &TaskConfig) -> Result<()> {
    match (&task.cmd, &task.pipeline) {
        (Some(cmd), None) => {
            CommandTemplate::parse(cmd)?;
        }
        (None, Some(_)) => {
            if task.inputs.is_some() || task.outputs.is_some() {
                return Err(config_error(format!(
                    "task '{name}' is a nested pipeline and cannot declare inputs or outputs"
                )));
            }
        }
        (Some(_), Some(_)) => {
            return Err(config_error(format!(
                "task '{name}' sets both `cmd` and `pipeline`"
            )));
        }
        (None, None) => {
            return Err(config_error(format!(
                "task '{name}' must set one of `cmd` or `pipeline`"
            )));
        }
    }

    for ports in [&task.inputs, &task.outputs].into_iter().flatten() {
        validate_ports(name, ports)?;
    }

    if let Some(MarkerConfig::Mode(mode)) = &task.marker {
        if mode != MARKER_ONLY && mode != MARKER_AND_OUTPUTS {
            return Err(config_error(format!(
                "task '{name}' has invalid marker mode '{mode}' (expected \"{MARKER_ONLY}\" or \"{MARKER_AND_OUTPUTS}\")"
            )));
        }
    }
    Ok(())
}

fn validate_ports(task: &str, ports: &PortsConfig) -> Result<()> {
    match ports {
        PortsConfig::Single(r) => validate_resource(task, r),
        PortsConfig::Ordered(rs) => rs.iter().try_for_each(|r| validate_resource(task, r)),
        PortsConfig::Named(rs) => rs.values().try_for_each(|r| validate_resource(task, r)),
    }
}

fn validate_resource(task: &str, resource: &ResourceConfig) -> Result<()> {
    let path = match resource {
        ResourceConfig::Path(path) => path.as_str(),
        ResourceConfig::Detailed(spec) => match (&spec.file, &spec.folder) {
            (Some(path), None) | (None, Some(path)) => path.as_str(),
            _ => {
                return Err(config_error(format!(
                    "resource of task '{task}' must set exactly one of `file` or `folder`"
                )));
            }
        },
    };
    if path.trim().is_empty() || path.ends_with('/') {
        return Err(config_error(format!(
            "task '{task}' has invalid resource path '{path}'"
        )));
    }
    Ok(())
}

fn validate_targets(cfg: &RawPipelineFile) -> Result<()> {
    for target in cfg.pipeline.target.iter().flatten() {
        if !cfg.task.contains_key(target) {
            return Err(config_error(format!(
                "[pipeline].target names unknown task '{target}'"
            )));
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawPipelineFile) -> Result<()> {
    let graph = DagGraph::from_deps(
        cfg.task
            .iter()
            .map(|(name, task)| (name.as_str(), task.after.as_slice())),
    );
    graph.check()
}
