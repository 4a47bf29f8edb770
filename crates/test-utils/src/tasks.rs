#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::anyhow;
use tagdriver::task::TestTask;

/// Lifecycle event seen from inside a task body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Started(String),
    Ended(String),
}

#[derive(Default)]
struct LogInner {
    events: Mutex<Vec<(Event, Instant)>>,
    running: AtomicUsize,
    peak: AtomicUsize,
}

/// Shared recorder for task bodies built by this module.
#[derive(Clone, Default)]
pub struct ExecutionLog {
    inner: Arc<LogInner>,
}

impl ExecutionLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn enter(&self, name: &str) {
        let now = self.inner.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.peak.fetch_max(now, Ordering::SeqCst);
        self.push(Event::Started(name.to_string()));
    }

    fn leave(&self, name: &str) {
        self.push(Event::Ended(name.to_string()));
        self.inner.running.fetch_sub(1, Ordering::SeqCst);
    }

    fn push(&self, event: Event) {
        self.inner
            .events
            .lock()
            .unwrap()
            .push((event, Instant::now()));
    }

    pub fn events(&self) -> Vec<Event> {
        self.inner
            .events
            .lock()
            .unwrap()
            .iter()
            .map(|(e, _)| e.clone())
            .collect()
    }

    /// Task names in the order their bodies started.
    pub fn start_order(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Started(name) => Some(name),
                Event::Ended(_) => None,
            })
            .collect()
    }

    /// Highest number of bodies observed running at once.
    pub fn peak_concurrency(&self) -> usize {
        self.inner.peak.load(Ordering::SeqCst)
    }

    /// Start and end instants of a finished body.
    pub fn interval(&self, name: &str) -> Option<(Instant, Instant)> {
        let events = self.inner.events.lock().unwrap();
        let start = events.iter().find_map(|(e, at)| match e {
            Event::Started(n) if n == name => Some(*at),
            _ => None,
        })?;
        let end = events.iter().find_map(|(e, at)| match e {
            Event::Ended(n) if n == name => Some(*at),
            _ => None,
        })?;
        Some((start, end))
    }
}

/// Async task that records itself in `log` and sleeps for `duration`.
pub fn recording_task(name: &str, log: &ExecutionLog, duration: Duration) -> TestTask {
    let log = log.clone();
    let task_name = name.to_string();
    TestTask::new_async(name, move |_ctx| {
        let log = log.clone();
        let name = task_name.clone();
        async move {
            log.enter(&name);
            tokio::time::sleep(duration).await;
            log.leave(&name);
            Ok::<(), anyhow::Error>(())
        }
    })
}

/// Blocking-pool variant of [`recording_task`].
pub fn blocking_recording_task(name: &str, log: &ExecutionLog, duration: Duration) -> TestTask {
    let log = log.clone();
    let task_name = name.to_string();
    TestTask::blocking(name, move |_ctx| {
        log.enter(&task_name);
        std::thread::sleep(duration);
        log.leave(&task_name);
        Ok(())
    })
}

/// Task whose body succeeds immediately.
pub fn noop_task(name: &str) -> TestTask {
    TestTask::new_async(name, |_ctx| async { Ok::<(), anyhow::Error>(()) })
}

/// Task whose body returns an error.
pub fn failing_task(name: &str, message: &str) -> TestTask {
    let message = message.to_string();
    TestTask::new_async(name, move |_ctx| {
        let message = message.clone();
        async move { Err::<(), _>(anyhow!(message)) }
    })
}

/// Task whose body panics.
pub fn panicking_task(name: &str, message: &str) -> TestTask {
    let message = message.to_string();
    TestTask::blocking(name, move |_ctx| panic!("{}", message))
}
