// src/task/command.rs

//! Shell-command tasks declared in pipeline files.

use std::path::PathBuf;
use std::process::Command;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use crate::errors::{BatchdagError, Result};
use crate::naming::{Naming, NamingExt};
use crate::resource::Ports;
use crate::task::{Task, TaskCore};

/// `{kind}` or `{kind.key}`.
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([a-z]+)(?:\.([A-Za-z0-9_\-]+))?\}").expect("placeholder pattern is valid")
});

/// What a `{...}` placeholder refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placeholder {
    /// `{inputs}` or `{inputs.<key>}`.
    Inputs(Option<String>),
    /// `{outputs}` or `{outputs.<key>}`.
    Outputs(Option<String>),
    Namespace,
    Name,
    /// `{param.<key>}`.
    Param(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Slot(Placeholder),
}

/// A command line with placeholders, parsed once at load time.
///
/// Paths are substituted verbatim; quote them in the template if they may
/// contain spaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl CommandTemplate {
    pub fn parse(source: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut last = 0;
        for caps in PLACEHOLDER.captures_iter(source) {
            let Some(whole) = caps.get(0) else { continue };
            if whole.start() > last {
                segments.push(Segment::Literal(source[last..whole.start()].to_string()));
            }
            let key = caps.get(2).map(|m| m.as_str().to_string());
            let placeholder = match (&caps[1], key) {
                ("inputs", key) => Placeholder::Inputs(key),
                ("outputs", key) => Placeholder::Outputs(key),
                ("namespace", None) => Placeholder::Namespace,
                ("name", None) => Placeholder::Name,
                ("param", Some(key)) => Placeholder::Param(key),
                (other, _) => {
                    return Err(BatchdagError::ConfigError(format!(
                        "unknown placeholder `{}` in command `{}`",
                        other, source
                    )));
                }
            };
            segments.push(Segment::Slot(placeholder));
            last = whole.end();
        }
        if last < source.len() {
            segments.push(Segment::Literal(source[last..].to_string()));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn placeholders(&self) -> impl Iterator<Item = &Placeholder> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Slot(p) => Some(p),
            Segment::Literal(_) => None,
        })
    }

    /// Substitute every placeholder using a bound task core.
    pub fn render(&self, core: &TaskCore) -> Result<String> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Slot(placeholder) => out.push_str(&render_slot(placeholder, core)?),
            }
        }
        Ok(out)
    }
}

fn render_ports(ports: &Ports, key: Option<&str>, which: &str, task: &str) -> Result<String> {
    match key {
        None => {
            let paths = ports
                .resources()
                .into_iter()
                .map(|r| r.path().map(|p| p.display().to_string()))
                .collect::<Result<Vec<_>>>()?;
            Ok(paths.join(" "))
        }
        Some(key) => {
            let resource = ports.get(key).ok_or_else(|| {
                BatchdagError::ConfigError(format!("task {task} has no {which} `{key}`"))
            })?;
            Ok(resource.path()?.display().to_string())
        }
    }
}

fn render_slot(placeholder: &Placeholder, core: &TaskCore) -> Result<String> {
    let task = core.name();
    match placeholder {
        Placeholder::Inputs(key) => render_ports(core.inputs(), key.as_deref(), "input", task),
        Placeholder::Outputs(key) => render_ports(core.outputs()?, key.as_deref(), "output", task),
        Placeholder::Namespace => Ok(core.resolved()?.namespace.clone().unwrap_or_default()),
        Placeholder::Name => Ok(task.to_string()),
        Placeholder::Param(key) => core
            .params()
            .get(key)
            .map(|v| v.to_string())
            .ok_or_else(|| BatchdagError::ConfigError(format!("task {task} has no param `{key}`"))),
    }
}

/// A task that runs a shell command synchronously.
#[derive(Debug)]
pub struct CommandTask {
    core: TaskCore,
    template: CommandTemplate,
    workdir: Option<PathBuf>,
}

impl CommandTask {
    pub fn new(core: TaskCore, template: CommandTemplate) -> Self {
        Self {
            core,
            template,
            workdir: None,
        }
    }

    pub fn in_dir(mut self, workdir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(workdir.into());
        self
    }

    pub fn template(&self) -> &CommandTemplate {
        &self.template
    }
}

impl NamingExt for CommandTask {
    fn naming_slot(&mut self) -> &mut Naming {
        self.core.naming_slot()
    }
}

impl Task for CommandTask {
    fn core(&self) -> &TaskCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TaskCore {
        &mut self.core
    }

    fn kind(&self) -> &'static str {
        "command"
    }

    fn run(&mut self) -> Result<()> {
        for output in self.core.outputs()?.resources() {
            output.prepare_write()?;
        }

        let line = self.template.render(&self.core)?;
        let name = self.core.name().to_string();
        info!(task = %name, cmd = %line, "starting command");

        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&line);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&line);
            c
        };
        if let Some(dir) = &self.workdir {
            cmd.current_dir(dir);
        }

        let status = cmd.status()?;
        let code = status.code().unwrap_or(-1);
        debug!(task = %name, exit_code = code, "command exited");

        if !status.success() {
            return Err(BatchdagError::TaskFailed { task: name, code });
        }
        Ok(())
    }
}
