// src/sched/scheduler.rs

use std::num::NonZeroUsize;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::filter::TaskFilter;
use crate::sched::report::{RunReport, TaskReport};
use crate::sched::state::{Counts, RunState};
use crate::sched::status::{LogStatusSink, StatusSink, StatusSnapshot, StatusThrottle};
use crate::task::{TestError, TestTask};

/// Default minimum time between two periodic status reports.
pub const DEFAULT_STATUS_INTERVAL: Duration = Duration::from_millis(2000);

/// Number of worker slots used when none is configured.
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Options for one scheduler run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Maximum number of concurrently running tasks; `None` uses
    /// [`default_concurrency`].
    pub max_concurrency: Option<NonZeroUsize>,
    pub filter: TaskFilter,
    pub status_interval: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            max_concurrency: None,
            filter: TaskFilter::default(),
            status_interval: DEFAULT_STATUS_INTERVAL,
        }
    }
}

impl RunOptions {
    /// A zero value falls back to the default concurrency.
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = NonZeroUsize::new(max);
        self
    }

    pub fn with_filter(mut self, filter: TaskFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Intervals below one millisecond are raised to one millisecond.
    pub fn with_status_interval(mut self, interval: Duration) -> Self {
        self.status_interval = interval.max(Duration::from_millis(1));
        self
    }

    pub fn effective_concurrency(&self) -> usize {
        self.max_concurrency
            .map(NonZeroUsize::get)
            .unwrap_or_else(default_concurrency)
    }
}

/// Runs filtered tasks on a bounded number of worker slots.
///
/// Tasks are dispatched strictly in queue order. A task with
/// `barrier_before` starts only once nothing else runs; a task with
/// `barrier_after` keeps every later task waiting until it has finished.
/// Failures are recorded on the failing task and never stop the run.
pub struct Scheduler {
    options: RunOptions,
    state: Arc<RunState>,
    sink: Arc<dyn StatusSink>,
}

impl Scheduler {
    pub fn new(options: RunOptions) -> Self {
        Self {
            options,
            state: Arc::new(RunState::new()),
            sink: Arc::new(LogStatusSink),
        }
    }

    pub fn with_status_sink(mut self, sink: Arc<dyn StatusSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Current counters of the active (or last) run.
    pub fn counts(&self) -> Counts {
        self.state.counts()
    }

    /// Snapshot of the active (or last) run, including per-task elapsed time.
    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot::capture(self.state.counts(), &self.state.queue(), self.state.elapsed())
    }

    /// Apply the filter, keeping declaration order.
    pub fn select(&self, tasks: Vec<TestTask>) -> Vec<Arc<TestTask>> {
        let declared = tasks.len();
        let accepted: Vec<Arc<TestTask>> = tasks
            .into_iter()
            .filter(|task| {
                let keep = self.options.filter.accepts(task.tags());
                debug!(task = %task.name(), accepted = keep, "filter decision");
                keep
            })
            .map(Arc::new)
            .collect();

        info!(
            declared,
            accepted = accepted.len(),
            "tasks selected for execution"
        );
        accepted
    }

    /// Filter `tasks`, run the accepted ones and wait for all of them.
    ///
    /// Runs on one scheduler must not overlap.
    pub async fn run(&self, tasks: Vec<TestTask>) -> RunReport {
        let queue = self.select(tasks);
        self.run_queue(queue).await
    }

    /// Run an already filtered queue.
    pub async fn run_queue(&self, queue: Vec<Arc<TestTask>>) -> RunReport {
        let limit = self.options.effective_concurrency();
        self.state.reset(queue.clone());

        info!(
            tasks = queue.len(),
            max_concurrency = limit,
            "starting test run"
        );

        let mut rx = self.state.subscribe();
        let mut throttle = StatusThrottle::new(self.options.status_interval);

        for task in &queue {
            let allowed = if task.has_barrier_before() { 1 } else { limit };
            self.wait_until(&mut rx, &mut throttle, |c| c.running < allowed)
                .await;

            self.dispatch(Arc::clone(task));

            if task.has_barrier_after() {
                self.wait_until(&mut rx, &mut throttle, |c| c.running == 0)
                    .await;
            }
        }

        self.wait_until(&mut rx, &mut throttle, |c| c.running == 0)
            .await;

        let status = self.status();
        self.sink.report(&status, true);

        let report = RunReport::collect(&queue, self.state.counts(), status.elapsed);
        info!(
            total = report.total,
            completed = report.completed,
            failed = report.failed,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "test run finished"
        );
        report
    }

    /// Block the controller until `predicate` holds for the counters.
    ///
    /// Re-checks on every counter update and publishes throttled status
    /// reports while waiting.
    async fn wait_until<P>(
        &self,
        rx: &mut watch::Receiver<Counts>,
        throttle: &mut StatusThrottle,
        predicate: P,
    ) where
        P: Fn(&Counts) -> bool,
    {
        loop {
            let counts = *rx.borrow_and_update();
            if predicate(&counts) {
                return;
            }

            match tokio::time::timeout(throttle.interval(), rx.changed()).await {
                Ok(Ok(())) | Err(_) => {}
                Ok(Err(_)) => {
                    warn!("run state channel closed while waiting for tasks");
                    return;
                }
            }

            if throttle.due() {
                self.sink.report(&self.status(), false);
            }
        }
    }

    fn dispatch(&self, task: Arc<TestTask>) {
        self.state.task_dispatched();
        debug!(task = %task.name(), "dispatching task");

        let state = Arc::clone(&self.state);
        let sink = Arc::clone(&self.sink);
        tokio::spawn(execute(task, state, sink));
    }
}

/// Worker side: run one body and record its outcome.
async fn execute(task: Arc<TestTask>, state: Arc<RunState>, sink: Arc<dyn StatusSink>) {
    task.mark_started();
    info!(task = %task.name(), "task started");

    match task.body().spawn(task.context()).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            error!(task = %task.name(), error = %format!("{err:#}"), "task body returned an error");
            task.push_error(TestError::from_error(err));
        }
        Err(join_err) if join_err.is_panic() => {
            error!(task = %task.name(), "task body panicked");
            task.push_error(TestError::from_panic(join_err.into_panic()));
        }
        Err(join_err) => {
            error!(task = %task.name(), error = %join_err, "task body did not complete");
            task.push_error(TestError::new(format!("task body did not complete: {join_err}")));
        }
    }

    task.mark_ended();
    let failed = task.has_errors();

    // `running` must drop even when the sink misbehaves.
    let report = TaskReport::from_task(&task);
    if catch_unwind(AssertUnwindSafe(|| sink.task_finished(&report))).is_err() {
        warn!(task = %task.name(), "status sink panicked in task_finished");
    }
    state.task_finished(failed);
}

/// Run `tasks` with `options` and return the number of failed tasks.
pub async fn run(tasks: Vec<TestTask>, options: RunOptions) -> usize {
    Scheduler::new(options).run(tasks).await.failed
}
