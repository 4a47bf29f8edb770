// src/sched/mod.rs

//! Bounded-concurrency task scheduling.
//!
//! - [`scheduler`] filters the declared tasks and dispatches them in order,
//!   honouring barriers and the concurrency cap.
//! - [`state`] holds the counters shared between controller and workers.
//! - [`status`] defines status snapshots and the sinks that publish them.
//! - [`report`] defines the per-task and per-run results.

pub mod report;
pub mod scheduler;
pub mod state;
pub mod status;

pub use report::{RunReport, TaskReport};
pub use scheduler::{DEFAULT_STATUS_INTERVAL, RunOptions, Scheduler, default_concurrency, run};
pub use state::Counts;
pub use status::{ActiveTask, LogStatusSink, StatusSink, StatusSnapshot};
