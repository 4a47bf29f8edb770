// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod filter;
pub mod logging;
pub mod sched;
pub mod task;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::exec::CommandTaskProvider;
use crate::filter::{TaskFilter, compile};
use crate::sched::{RunOptions, Scheduler};
use crate::task::{TaskProvider, TestTask};

/// Highest process exit code used for a failure count.
pub const MAX_FAILURE_EXIT_CODE: usize = 254;

/// Process exit code for a run with `failed` failed tasks.
pub fn exit_code(failed: usize) -> i32 {
    failed.min(MAX_FAILURE_EXIT_CODE) as i32
}

/// High-level entry point used by `main.rs`.
///
/// Loads and validates the config, applies CLI overrides, builds the command
/// tasks and runs them. Returns the number of failed tasks.
pub async fn run(args: CliArgs) -> Result<usize> {
    let config_path = &args.config;
    let cfg = load_and_validate(config_path)?;
    info!(path = %config_path.display(), tasks = cfg.task.len(), "config loaded");

    let options = run_options(&cfg, &args)?;
    let tasks = CommandTaskProvider::from_config(&cfg).provide()?;

    let scheduler = Scheduler::new(options);

    if args.dry_run {
        print_dry_run(&scheduler, tasks);
        return Ok(0);
    }

    let report = scheduler.run(tasks).await;
    report.print_summary();
    Ok(report.failed)
}

/// Merge `[config]` with the CLI overrides.
pub fn run_options(cfg: &ConfigFile, args: &CliArgs) -> Result<RunOptions> {
    let mut options = cfg.run_options();

    if let Some(expr) = args.filter.as_deref() {
        let compiled = compile(expr)?;
        debug!(filter = %compiled, "filter taken from the command line");
        let general_priority = options.filter.general_priority;
        options.filter =
            TaskFilter::new(Some(compiled)).with_general_priority(general_priority);
    }
    if let Some(priority) = args.general_priority {
        if priority.is_nan() {
            anyhow::bail!("--general-priority must be a number");
        }
        options.filter = options.filter.with_general_priority(priority);
    }
    if let Some(jobs) = args.jobs {
        if jobs == 0 {
            anyhow::bail!("--jobs must be >= 1");
        }
        options = options.with_max_concurrency(jobs);
    }
    if let Some(ms) = args.status_interval_ms {
        if ms == 0 {
            anyhow::bail!("--status-interval-ms must be >= 1");
        }
        options = options.with_status_interval(Duration::from_millis(ms));
    }

    Ok(options)
}

/// Print the tasks the filter accepts, in dispatch order.
fn print_dry_run(scheduler: &Scheduler, tasks: Vec<TestTask>) {
    let options = scheduler.options();
    let declared = tasks.len();
    let accepted: Vec<Arc<TestTask>> = scheduler.select(tasks);

    println!("tagdriver dry-run");
    match options.filter.condition.as_ref() {
        Some(filter) => println!("  filter = {:?}", filter.source()),
        None => println!("  filter = (none)"),
    }
    println!("  max_concurrency = {}", options.effective_concurrency());
    println!();

    println!("accepted tasks ({} of {declared}):", accepted.len());
    for task in accepted.iter() {
        println!("  - {}", task.name());
        if !task.tags().is_empty() {
            let tags: Vec<String> = task.tags().iter().map(ToString::to_string).collect();
            println!("      tags: {}", tags.join(", "));
        }
        if task.has_barrier_before() {
            println!("      barrier_before: true");
        }
        if task.has_barrier_after() {
            println!("      barrier_after: true");
        }
    }

    debug!("dry-run complete (no execution)");
}
