// src/sched/report.rs

//! Per-task and per-run results.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::sched::state::Counts;
use crate::task::TestTask;

/// Outcome of one task, available once the task has ended.
#[derive(Debug, Clone)]
pub struct TaskReport {
    pub name: String,
    pub started_at: Option<Instant>,
    pub ended_at: Option<Instant>,
    pub progress: f32,
    pub errors: Vec<String>,
}

impl TaskReport {
    pub fn from_task(task: &TestTask) -> Self {
        Self {
            name: task.name().to_string(),
            started_at: task.started_at(),
            ended_at: task.ended_at(),
            progress: task.progress(),
            errors: task.errors().into_iter().map(|e| e.message).collect(),
        }
    }

    pub fn elapsed(&self) -> Option<Duration> {
        Some(self.ended_at?.duration_since(self.started_at?))
    }

    pub fn is_failed(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Result of a whole run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Tasks accepted by the filter.
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub elapsed: Duration,
    /// One entry per accepted task, in queue order.
    pub tasks: Vec<TaskReport>,
}

impl RunReport {
    pub(crate) fn collect(queue: &[Arc<TestTask>], counts: Counts, elapsed: Duration) -> Self {
        Self {
            total: queue.len(),
            completed: counts.completed,
            failed: counts.failed,
            elapsed,
            tasks: queue.iter().map(|t| TaskReport::from_task(t)).collect(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    pub fn failed_tasks(&self) -> impl Iterator<Item = &TaskReport> {
        self.tasks.iter().filter(|t| t.is_failed())
    }

    pub fn task(&self, name: &str) -> Option<&TaskReport> {
        self.tasks.iter().find(|t| t.name == name)
    }

    /// Print counts and every failed task's errors to stdout.
    pub fn print_summary(&self) {
        println!(
            "tests ended in {:.3}s: {} / {} completed, {} with errors",
            self.elapsed.as_secs_f64(),
            self.completed,
            self.total,
            self.failed
        );

        for task in self.failed_tasks() {
            println!();
            println!("for task {}", task.name);
            for message in &task.errors {
                println!("  {message}");
            }
        }
    }
}
