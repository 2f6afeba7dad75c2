// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::runner::RunOptions;

/// Command-line arguments for `batchdag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "batchdag",
    version,
    about = "Run a pipeline of tasks whose outputs feed each other, skipping work that is already done.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the pipeline file (TOML).
    ///
    /// Default: `Pipeline.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Pipeline.toml")]
    pub config: String,

    /// Namespace prefixed to every artifact name.
    #[arg(long, short = 'n', value_name = "NAME")]
    pub namespace: Option<String>,

    /// Write `trial_`-prefixed artifacts instead of the real ones.
    #[arg(long)]
    pub trial: bool,

    /// Task to bring up to date (repeatable). Defaults to every task, or the
    /// file's `[pipeline].target`.
    #[arg(long, value_name = "TASK")]
    pub target: Vec<String>,

    /// Re-run scheduled tasks even if their outputs exist, replacing them.
    #[arg(long)]
    pub overwrite: bool,

    /// Load, validate and print the execution plan without running anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BATCHDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

impl CliArgs {
    pub fn run_options(&self) -> RunOptions {
        let mut options = RunOptions::new()
            .trial(self.trial)
            .overwrite(self.overwrite);
        if let Some(ns) = &self.namespace {
            options = options.namespace(ns.clone());
        }
        if !self.target.is_empty() {
            options = options.target(self.target.iter().cloned());
        }
        options
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
