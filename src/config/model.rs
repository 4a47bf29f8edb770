// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::filter::{CompiledFilter, Tag, TaskFilter};
use crate::sched::RunOptions;

/// Top-level configuration as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// max_concurrency = 4
/// filter = "fast -slow"
///
/// [[task]]
/// name = "unit"
/// cmd = "cargo test --lib"
/// tags = ["fast", { name = "db", priority = 1.0, duration = 30.0 }]
///
/// [[task]]
/// name = "migrations"
/// cmd = "./scripts/migrate-check.sh"
/// tags = ["db"]
/// single_thread = true
/// ```
///
/// Tasks are an array of tables so that declaration order is kept; the
/// scheduler dispatches in that order.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub task: Vec<TaskConfig>,
}

/// A validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>` (see `validate.rs`), so
/// holding one means the filter expression compiled and every task entry is
/// well formed.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub task: Vec<TaskConfig>,
    filter: Option<CompiledFilter>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        task: Vec<TaskConfig>,
        filter: Option<CompiledFilter>,
    ) -> Self {
        Self {
            config,
            task,
            filter,
        }
    }

    /// The compiled `[config].filter`, if one is set.
    pub fn filter(&self) -> Option<&CompiledFilter> {
        self.filter.as_ref()
    }

    /// Scheduler options described by `[config]`.
    pub fn run_options(&self) -> RunOptions {
        let mut filter = TaskFilter::new(self.filter.clone());
        if let Some(priority) = self.config.general_priority {
            filter = filter.with_general_priority(priority);
        }

        RunOptions::default()
            .with_max_concurrency(self.config.max_concurrency.unwrap_or(0))
            .with_filter(filter)
            .with_status_interval(Duration::from_millis(self.config.status_interval_ms))
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Maximum number of tasks running at once; defaults to the available
    /// hardware parallelism.
    #[serde(default)]
    pub max_concurrency: Option<usize>,

    /// Filter expression selecting the tasks to run.
    #[serde(default)]
    pub filter: Option<String>,

    /// Tagged tasks need a tag with at least this priority.
    #[serde(default)]
    pub general_priority: Option<f64>,

    /// Minimum time between two periodic status reports.
    #[serde(default = "default_status_interval_ms")]
    pub status_interval_ms: u64,
}

fn default_status_interval_ms() -> u64 {
    2000
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            max_concurrency: None,
            filter: None,
            general_priority: None,
            status_interval_ms: default_status_interval_ms(),
        }
    }
}

/// A tag entry: either a bare name or a table with priority/duration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TagConfig {
    Name(String),
    Detailed {
        name: String,
        #[serde(default)]
        priority: f64,
        #[serde(default = "unconstrained_duration")]
        duration: f64,
    },
}

fn unconstrained_duration() -> f64 {
    -1.0
}

impl TagConfig {
    pub fn name(&self) -> &str {
        match self {
            TagConfig::Name(name) | TagConfig::Detailed { name, .. } => name,
        }
    }

    pub fn to_tag(&self) -> Tag {
        match self {
            TagConfig::Name(name) => Tag::named(name.clone()),
            TagConfig::Detailed {
                name,
                priority,
                duration,
            } => Tag::named(name.clone())
                .with_priority(*priority)
                .with_duration(*duration),
        }
    }
}

/// One `[[task]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    pub name: String,

    /// Shell command; the task fails when it exits non-zero.
    pub cmd: String,

    #[serde(default)]
    pub tags: Vec<TagConfig>,

    /// Shorthand for `barrier_before = true` plus `barrier_after = true`.
    #[serde(default)]
    pub single_thread: bool,

    #[serde(default)]
    pub barrier_before: bool,

    #[serde(default)]
    pub barrier_after: bool,

    /// Regex matched against stdout lines; its first capture group is read
    /// as the task's progress in percent.
    #[serde(default)]
    pub progress_regex: Option<String>,
}

impl TaskConfig {
    pub fn effective_barrier_before(&self) -> bool {
        self.barrier_before || self.single_thread
    }

    pub fn effective_barrier_after(&self) -> bool {
        self.barrier_after || self.single_thread
    }

    pub fn task_tags(&self) -> Vec<Tag> {
        self.tags.iter().map(TagConfig::to_tag).collect()
    }
}
