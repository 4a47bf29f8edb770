// src/sched/state.rs

//! Shared per-run bookkeeping.
//!
//! All counter mutation goes through one `watch` channel: the value is
//! guarded by the channel's lock and every update wakes the controller,
//! which waits on the receiver side.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::watch;

use crate::task::TestTask;

/// Aggregate counts for the current run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    /// Tasks dispatched and not yet finished.
    pub running: usize,
    /// Tasks finished, successfully or not.
    pub completed: usize,
    /// Finished tasks with at least one recorded error.
    pub failed: usize,
}

#[derive(Debug, Default)]
struct RunTimeline {
    started_at: Option<Instant>,
    queue: Vec<Arc<TestTask>>,
}

#[derive(Debug)]
pub(crate) struct RunState {
    counts: watch::Sender<Counts>,
    timeline: Mutex<RunTimeline>,
}

impl RunState {
    pub(crate) fn new() -> Self {
        let (counts, _) = watch::channel(Counts::default());
        Self {
            counts,
            timeline: Mutex::new(RunTimeline::default()),
        }
    }

    /// Start a new run over `queue`, clearing all counters.
    pub(crate) fn reset(&self, queue: Vec<Arc<TestTask>>) {
        self.counts.send_replace(Counts::default());
        let mut timeline = self.timeline();
        timeline.started_at = Some(Instant::now());
        timeline.queue = queue;
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Counts> {
        self.counts.subscribe()
    }

    pub(crate) fn counts(&self) -> Counts {
        *self.counts.borrow()
    }

    pub(crate) fn queue(&self) -> Vec<Arc<TestTask>> {
        self.timeline().queue.clone()
    }

    pub(crate) fn started_at(&self) -> Option<Instant> {
        self.timeline().started_at
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.started_at()
            .map(|started| started.elapsed())
            .unwrap_or_default()
    }

    pub(crate) fn task_dispatched(&self) {
        self.counts.send_modify(|c| c.running += 1);
    }

    pub(crate) fn task_finished(&self, failed: bool) {
        self.counts.send_modify(|c| {
            c.running = c.running.saturating_sub(1);
            c.completed += 1;
            if failed {
                c.failed += 1;
            }
        });
    }

    fn timeline(&self) -> MutexGuard<'_, RunTimeline> {
        self.timeline.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
