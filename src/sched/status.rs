// src/sched/status.rs

//! Run status snapshots and the sinks that publish them.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::sched::report::TaskReport;
use crate::sched::state::Counts;
use crate::task::TestTask;

/// A task that has started and not yet ended.
#[derive(Debug, Clone)]
pub struct ActiveTask {
    pub name: String,
    pub progress: f32,
    pub elapsed: Duration,
}

/// Point-in-time view of a run.
#[derive(Debug, Clone, Default)]
pub struct StatusSnapshot {
    pub total: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
    /// Time since the run started.
    pub elapsed: Duration,
    pub active: Vec<ActiveTask>,
}

impl StatusSnapshot {
    pub(crate) fn capture(counts: Counts, queue: &[Arc<TestTask>], elapsed: Duration) -> Self {
        let active = queue
            .iter()
            .filter(|t| t.is_started() && !t.is_ended())
            .map(|t| ActiveTask {
                name: t.name().to_string(),
                progress: t.progress(),
                elapsed: t.elapsed().unwrap_or_default(),
            })
            .collect();

        Self {
            total: queue.len(),
            running: counts.running,
            completed: counts.completed,
            failed: counts.failed,
            elapsed,
            active,
        }
    }
}

/// Receives status updates from the scheduler.
///
/// `report` is called from the controlling task, throttled to the run's
/// status interval, and once more with `final_report = true` after the run
/// drained. `task_finished` is called from worker tasks as each task ends.
pub trait StatusSink: Send + Sync {
    fn report(&self, status: &StatusSnapshot, final_report: bool);

    fn task_finished(&self, _report: &TaskReport) {}
}

/// Default sink: publishes everything through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogStatusSink;

impl StatusSink for LogStatusSink {
    fn report(&self, status: &StatusSnapshot, final_report: bool) {
        info!(
            completed = status.completed,
            total = status.total,
            failed = status.failed,
            running = status.running,
            elapsed_ms = status.elapsed.as_millis() as u64,
            final_report,
            "run status"
        );

        for task in &status.active {
            debug!(
                task = %task.name,
                progress = format_args!("{:.0}%", task.progress),
                elapsed_ms = task.elapsed.as_millis() as u64,
                "task still running"
            );
        }
    }

    fn task_finished(&self, report: &TaskReport) {
        let elapsed_ms = report.elapsed().unwrap_or_default().as_millis() as u64;
        if report.is_failed() {
            warn!(
                task = %report.name,
                elapsed_ms,
                errors = report.errors.len(),
                "task ended with errors"
            );
        } else {
            info!(task = %report.name, elapsed_ms, "task ended");
        }
    }
}

/// Limits how often periodic status reports are published.
#[derive(Debug)]
pub(crate) struct StatusThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl StatusThrottle {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub(crate) fn interval(&self) -> Duration {
        self.interval
    }

    /// `true` at most once per interval.
    pub(crate) fn due(&mut self) -> bool {
        let now = Instant::now();
        match self.last {
            Some(last) if now.duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}
