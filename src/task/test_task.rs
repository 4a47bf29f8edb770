// src/task/test_task.rs

//! Task entity, task bodies and the context handed to a running body.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tracing::warn;

use crate::filter::Tag;
use crate::task::error::TestError;

/// Future returned by an async task body.
pub type BodyFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'static>>;

type BlockingFn = dyn Fn(&TaskContext) -> anyhow::Result<()> + Send + Sync;
type AsyncFn = dyn Fn(TaskContext) -> BodyFuture + Send + Sync;

/// The runnable part of a task.
#[derive(Clone)]
pub enum TaskBody {
    /// Runs on Tokio's blocking thread pool.
    Blocking(Arc<BlockingFn>),
    /// Runs as a Tokio task.
    Async(Arc<AsyncFn>),
}

impl TaskBody {
    /// Start the body. Panics inside the body surface as a `JoinError`.
    pub(crate) fn spawn(&self, ctx: TaskContext) -> JoinHandle<anyhow::Result<()>> {
        match self {
            TaskBody::Blocking(f) => {
                let f = Arc::clone(f);
                tokio::task::spawn_blocking(move || f(&ctx))
            }
            TaskBody::Async(f) => tokio::spawn(f(ctx)),
        }
    }
}

impl fmt::Debug for TaskBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskBody::Blocking(_) => f.write_str("TaskBody::Blocking"),
            TaskBody::Async(_) => f.write_str("TaskBody::Async"),
        }
    }
}

/// Mutable lifecycle state of a task.
#[derive(Debug, Default)]
struct TaskRecord {
    started_at: Option<Instant>,
    ended_at: Option<Instant>,
    errors: Vec<TestError>,
    progress: f32,
}

type SharedRecord = Arc<Mutex<TaskRecord>>;

fn lock(record: &SharedRecord) -> MutexGuard<'_, TaskRecord> {
    // A panicking body never holds the lock across user code.
    record.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle given to a running task body.
#[derive(Clone)]
pub struct TaskContext {
    name: Arc<str>,
    record: SharedRecord,
}

impl TaskContext {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Report completion progress in percent (clamped to `0..=100`).
    pub fn set_progress(&self, percent: f32) {
        lock(&self.record).progress = percent.clamp(0.0, 100.0);
    }

    /// Record a failed assertion without aborting the body.
    pub fn fail(&self, message: impl Into<String>) {
        lock(&self.record).errors.push(TestError::new(message));
    }

    /// Record `message` as a failure unless `condition` holds.
    ///
    /// Returns `condition`.
    pub fn check(&self, condition: bool, message: impl Into<String>) -> bool {
        if !condition {
            self.fail(message);
        }
        condition
    }
}

impl fmt::Debug for TaskContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskContext").field("name", &self.name).finish()
    }
}

/// A declared test task.
///
/// Name, tags and barrier flags are fixed at construction. The lifecycle
/// record (timestamps, errors, progress) is written by the scheduler and by
/// the task's own body.
#[derive(Debug)]
pub struct TestTask {
    name: Arc<str>,
    tags: Vec<Tag>,
    barrier_before: bool,
    barrier_after: bool,
    body: TaskBody,
    record: SharedRecord,
}

impl TestTask {
    pub fn with_body(name: impl Into<String>, body: TaskBody) -> Self {
        Self {
            name: Arc::from(name.into()),
            tags: Vec::new(),
            barrier_before: false,
            barrier_after: false,
            body,
            record: SharedRecord::default(),
        }
    }

    /// A task whose body runs on the blocking thread pool.
    pub fn blocking<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&TaskContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::with_body(name, TaskBody::Blocking(Arc::new(body)))
    }

    /// A task whose body is an async function.
    pub fn new_async<F, Fut>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(TaskContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let body = move |ctx: TaskContext| -> BodyFuture { Box::pin(body(ctx)) };
        Self::with_body(name, TaskBody::Async(Arc::new(body)))
    }

    /// Add a plain tag (priority `0.0`, no duration).
    pub fn tag(self, name: impl Into<String>) -> Self {
        self.with_tag(Tag::named(name))
    }

    /// Add a tag. Wildcard tags are query-only and are dropped.
    pub fn with_tag(mut self, tag: Tag) -> Self {
        if tag.is_wildcard() {
            warn!(task = %self.name, "ignoring wildcard tag on task; task tags need a name");
            return self;
        }
        self.tags.push(tag);
        self
    }

    pub fn with_tags(self, tags: impl IntoIterator<Item = Tag>) -> Self {
        tags.into_iter().fold(self, Self::with_tag)
    }

    /// Wait for every running task to finish before starting this one.
    pub fn barrier_before(mut self) -> Self {
        self.barrier_before = true;
        self
    }

    /// Start nothing else until this task has finished.
    pub fn barrier_after(mut self) -> Self {
        self.barrier_after = true;
        self
    }

    /// Run this task alone: both barriers.
    pub fn single_thread(self) -> Self {
        self.barrier_before().barrier_after()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn has_barrier_before(&self) -> bool {
        self.barrier_before
    }

    pub fn has_barrier_after(&self) -> bool {
        self.barrier_after
    }

    pub fn body(&self) -> &TaskBody {
        &self.body
    }

    pub fn errors(&self) -> Vec<TestError> {
        lock(&self.record).errors.clone()
    }

    pub fn has_errors(&self) -> bool {
        !lock(&self.record).errors.is_empty()
    }

    pub fn started_at(&self) -> Option<Instant> {
        lock(&self.record).started_at
    }

    pub fn ended_at(&self) -> Option<Instant> {
        lock(&self.record).ended_at
    }

    pub fn is_started(&self) -> bool {
        self.started_at().is_some()
    }

    pub fn is_ended(&self) -> bool {
        self.ended_at().is_some()
    }

    pub fn progress(&self) -> f32 {
        lock(&self.record).progress
    }

    /// Time spent running: up to now while running, up to the end once ended.
    pub fn elapsed(&self) -> Option<Duration> {
        let record = lock(&self.record);
        let started = record.started_at?;
        Some(match record.ended_at {
            Some(ended) => ended.duration_since(started),
            None => started.elapsed(),
        })
    }

    pub fn context(&self) -> TaskContext {
        TaskContext {
            name: Arc::clone(&self.name),
            record: Arc::clone(&self.record),
        }
    }

    pub(crate) fn mark_started(&self) {
        lock(&self.record).started_at = Some(Instant::now());
    }

    pub(crate) fn mark_ended(&self) {
        lock(&self.record).ended_at = Some(Instant::now());
    }

    pub(crate) fn push_error(&self, error: TestError) {
        lock(&self.record).errors.push(error);
    }
}
