// src/config/build.rs

//! Turn a validated [`PipelineFile`] into a [`Runner`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::config::loader::load_and_validate;
use crate::config::model::{
    MarkerConfig, NamingConfig, PipelineFile, PortsConfig, ResourceConfig, TaskConfig,
};
use crate::config::validate::MARKER_AND_OUTPUTS;
use crate::errors::{BatchdagError, Result};
use crate::fs::FileSystem;
use crate::naming::NamingExt;
use crate::resource::{File, Folder, Marker, Ports, Resource};
use crate::runner::Runner;
use crate::task::{CommandTask, CommandTemplate, Completion, Task, TaskCore};

/// Everything needed to build the tasks of one pipeline file.
pub struct BuildContext<'a> {
    /// Directory containing the pipeline file; relative paths start here.
    pub base_dir: &'a Path,
    pub fs: Arc<dyn FileSystem>,
    /// Canonical paths of the pipeline files currently being built.
    pub include_stack: Vec<PathBuf>,
}

impl<'a> BuildContext<'a> {
    pub fn new(base_dir: &'a Path, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            base_dir,
            fs,
            include_stack: Vec::new(),
        }
    }
}

/// Build the runner described by `file`.
pub fn build_runner(file: &PipelineFile, ctx: &mut BuildContext<'_>) -> Result<Runner> {
    let section = file.pipeline();
    let root = ctx.base_dir.join(&section.root);
    let marker_dir = ctx.base_dir.join(&section.marker_dir);

    let mut runner = Runner::new()
        .named(section.name.clone())
        .with_policy(section.schedule_policy)
        .with_declared(section.naming.declared())
        .with_modifiers(section.naming.modifiers());
    if let Some(target) = &section.target {
        runner = runner.with_target(target.iter().cloned());
    }

    for (name, task) in file.tasks() {
        let built: Box<dyn Task> = match (&task.cmd, &task.pipeline) {
            (Some(cmd), _) => Box::new(build_command_task(name, cmd, task, &root, &marker_dir, ctx)?),
            (None, Some(nested)) => Box::new(build_nested_runner(name, nested, task, &marker_dir, ctx)?),
            (None, None) => {
                return Err(BatchdagError::ConfigError(format!(
                    "task '{name}' must set one of `cmd` or `pipeline`"
                )));
            }
        };
        debug!(task = %name, kind = built.kind(), after = ?task.after, "built task");
        runner.add_task(name.clone(), built, task.after.clone());
    }

    Ok(runner)
}

fn build_command_task(
    name: &str,
    cmd: &str,
    task: &TaskConfig,
    root: &Path,
    marker_dir: &Path,
    ctx: &BuildContext<'_>,
) -> Result<CommandTask> {
    let template = CommandTemplate::parse(cmd)?;

    let mut core = TaskCore::new()
        .with_params(task.params.clone())
        .with_declared(task.naming.declared())
        .with_modifiers(task.naming.modifiers());
    if let Some(inputs) = &task.inputs {
        core = core.with_inputs(build_ports(inputs, root, ctx)?);
    }
    if let Some(outputs) = &task.outputs {
        core = core.with_outputs(build_ports(outputs, root, ctx)?);
    }
    if let Some(completion) = build_completion(name, task.marker.as_ref(), marker_dir, ctx) {
        core = core.with_completion(completion);
    }

    Ok(CommandTask::new(core, template).in_dir(ctx.base_dir))
}

fn build_nested_runner(
    name: &str,
    nested: &str,
    task: &TaskConfig,
    marker_dir: &Path,
    ctx: &mut BuildContext<'_>,
) -> Result<Runner> {
    let path = ctx.base_dir.join(nested);
    let canonical = std::fs::canonicalize(&path)?;
    if ctx.include_stack.contains(&canonical) {
        return Err(BatchdagError::ConfigError(format!(
            "task '{name}' includes pipeline {} recursively",
            path.display()
        )));
    }

    let file = load_and_validate(&path)?;
    let base_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut nested_ctx = BuildContext {
        base_dir: &base_dir,
        fs: ctx.fs.clone(),
        include_stack: ctx.include_stack.clone(),
    };
    nested_ctx.include_stack.push(canonical);
    let mut runner = build_runner(&file, &mut nested_ctx)?;

    apply_instance_naming(&mut runner, &task.naming);
    if let Some(completion) = build_completion(name, task.marker.as_ref(), marker_dir, ctx) {
        runner = runner.with_completion(completion);
    }
    Ok(runner)
}

/// Settings on the including `[task.<name>]` override the nested file's own
/// `[pipeline]` section.
fn apply_instance_naming(runner: &mut Runner, naming: &NamingConfig) {
    let slot = runner.naming_slot();
    if naming.namespace.is_some() {
        slot.instance.namespace = naming.namespace.clone();
    }
    if naming.trial.is_some() {
        slot.instance.trial = naming.trial;
    }
    if naming.overwrite.is_some() {
        slot.instance.overwrite = naming.overwrite;
    }
    slot.modifiers.independent |= naming.independent;
    slot.modifiers.shared_namespace |= naming.shared_namespace;
    slot.modifiers.namespace_only |= naming.namespace_only;
}

fn build_completion(
    name: &str,
    marker: Option<&MarkerConfig>,
    marker_dir: &Path,
    ctx: &BuildContext<'_>,
) -> Option<Completion> {
    let new_marker = || Marker::new(marker_dir).with_fs(ctx.fs.clone());
    match marker? {
        MarkerConfig::Enabled(false) => None,
        MarkerConfig::Enabled(true) => Some(Completion::Marker(new_marker())),
        MarkerConfig::Mode(mode) if mode == MARKER_AND_OUTPUTS => {
            Some(Completion::MarkerAndOutputs(new_marker()))
        }
        MarkerConfig::Mode(_) => {
            debug!(task = %name, "marker-only completion");
            Some(Completion::Marker(new_marker()))
        }
    }
}

fn build_ports(ports: &PortsConfig, root: &Path, ctx: &BuildContext<'_>) -> Result<Ports> {
    Ok(match ports {
        PortsConfig::Single(r) => Ports::Single(build_resource(r, root, ctx)?),
        PortsConfig::Ordered(rs) if rs.is_empty() => Ports::None,
        PortsConfig::Ordered(rs) => Ports::Ordered(
            rs.iter()
                .map(|r| build_resource(r, root, ctx))
                .collect::<Result<_>>()?,
        ),
        PortsConfig::Named(rs) => Ports::Named(
            rs.iter()
                .map(|(key, r)| Ok((key.clone(), build_resource(r, root, ctx)?)))
                .collect::<Result<_>>()?,
        ),
    })
}

/// Split `rel` into the directory under `root` and the final component.
fn split_path(rel: &str, root: &Path) -> Result<(PathBuf, String)> {
    let rel = Path::new(rel);
    let basename = rel
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| BatchdagError::ConfigError(format!("invalid resource path {}", rel.display())))?;
    let dir = match rel.parent() {
        Some(parent) => root.join(parent),
        None => root.to_path_buf(),
    };
    Ok((dir, basename.to_string()))
}

fn build_resource(resource: &ResourceConfig, root: &Path, ctx: &BuildContext<'_>) -> Result<Box<dyn Resource>> {
    match resource {
        ResourceConfig::Path(path) => {
            let (dir, basename) = split_path(path, root)?;
            Ok(Box::new(File::new(dir, basename).with_fs(ctx.fs.clone())))
        }
        ResourceConfig::Detailed(spec) => {
            let naming = spec.naming();
            match (&spec.file, &spec.folder) {
                (Some(path), None) => {
                    let (dir, basename) = split_path(path, root)?;
                    Ok(Box::new(
                        File::new(dir, basename)
                            .with_fs(ctx.fs.clone())
                            .with_declared(naming.declared())
                            .with_modifiers(naming.modifiers()),
                    ))
                }
                (None, Some(path)) => {
                    let (parent, basename) = split_path(path, root)?;
                    Ok(Box::new(
                        Folder::new(parent, basename)
                            .with_fs(ctx.fs.clone())
                            .with_declared(naming.declared())
                            .with_modifiers(naming.modifiers()),
                    ))
                }
                _ => Err(BatchdagError::ConfigError(
                    "resource must set exactly one of `file` or `folder`".to_string(),
                )),
            }
        }
    }
}
