// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod naming;
pub mod resource;
pub mod runner;
pub mod task;
pub mod types;

use std::path::PathBuf;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_runner;
use crate::runner::{RunReport, Runner};

pub use crate::errors::BatchdagError;
pub use crate::naming::NamingExt;
pub use crate::runner::RunOptions;
pub use crate::task::{Task, TaskCore};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - pipeline file loading and validation
/// - top-level binding of namespace / trial / overwrite
/// - scheduling and sequential execution (or a dry-run plan)
pub fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let mut runner = load_runner(&config_path)?;
    let options = args.run_options();

    if args.dry_run {
        let plan = runner.plan(options)?;
        print_dry_run(&runner, &plan);
        return Ok(());
    }

    let report = runner.run_pipeline(options)?;
    print_report(&report);
    Ok(())
}

/// Simple dry-run output: print the tasks that would run, in order.
fn print_dry_run(runner: &Runner, plan: &[String]) {
    println!("batchdag dry-run");
    println!();

    if plan.is_empty() {
        println!("nothing to do: every target is complete");
        return;
    }

    println!("would run ({}):", plan.len());
    for name in plan {
        println!("  - {name}");
        let Some(task) = runner.get_task(name) else {
            continue;
        };
        println!("      kind: {}", task.kind());
        let graph = runner.graph();
        let deps = graph.dependencies_of(name);
        if !deps.is_empty() {
            println!("      after: {deps:?}");
        }
        if let Ok(outputs) = task.output_resources() {
            for output in outputs {
                if let Ok(path) = output.path() {
                    println!("      output: {}", path.display());
                }
            }
        }
    }

    debug!("dry-run complete (no execution)");
}

fn print_report(report: &RunReport) {
    if report.executed.is_empty() {
        info!("pipeline already complete; nothing ran");
    } else {
        info!(executed = ?report.executed, "pipeline complete");
    }
}
