// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;

/// Command-line arguments for `tagdriver`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "tagdriver",
    version,
    about = "Run tagged test tasks concurrently, selected by a filter expression.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Tagdriver.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Filter expression, e.g. "fast +db -slow <30".
    ///
    /// Overrides `[config].filter`.
    #[arg(long, value_name = "EXPR")]
    pub filter: Option<String>,

    /// Maximum number of tasks running at once.
    #[arg(long, short = 'j', value_name = "N")]
    pub jobs: Option<usize>,

    /// Tagged tasks need a tag with at least this priority.
    #[arg(long, value_name = "P", allow_negative_numbers = true)]
    pub general_priority: Option<f64>,

    /// Minimum time between two periodic status reports.
    #[arg(long, value_name = "MS")]
    pub status_interval_ms: Option<u64>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TAGDRIVER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the accepted tasks, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,
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
