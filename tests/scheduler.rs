// tests/scheduler.rs
mod common;
use crate::common::{init_tracing, with_timeout};

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tagdriver::filter::{TaskFilter, compile};
use tagdriver::sched::{
    Counts, RunOptions, Scheduler, StatusSink, StatusSnapshot, TaskReport, run,
};
use tagdriver::task::TestTask;
use tagdriver_test_utils::tasks::{
    ExecutionLog, blocking_recording_task, failing_task, noop_task, panicking_task,
    recording_task,
};

const SHORT: Duration = Duration::from_millis(30);

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn runs_every_task_and_reports_success() {
    init_tracing();

    let log = ExecutionLog::new();
    let tasks: Vec<TestTask> = (0..5)
        .map(|i| recording_task(&format!("t{i}"), &log, SHORT))
        .collect();

    let scheduler = Scheduler::new(RunOptions::default().with_max_concurrency(2));
    let report = with_timeout(scheduler.run(tasks)).await;

    assert_eq!(report.total, 5);
    assert_eq!(report.completed, 5);
    assert_eq!(report.failed, 0);
    assert!(report.is_success());
    assert!(report.tasks.iter().all(|t| t.ended_at.is_some()));
    assert_eq!(log.start_order().len(), 5);
    assert_eq!(
        scheduler.counts(),
        Counts {
            running: 0,
            completed: 5,
            failed: 0
        }
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn never_exceeds_max_concurrency() {
    init_tracing();

    let log = ExecutionLog::new();
    let tasks: Vec<TestTask> = (0..10)
        .map(|i| recording_task(&format!("t{i}"), &log, SHORT))
        .collect();

    let report = with_timeout(
        Scheduler::new(RunOptions::default().with_max_concurrency(3)).run(tasks),
    )
    .await;

    assert_eq!(report.completed, 10);
    assert!(log.peak_concurrency() <= 3, "peak was {}", log.peak_concurrency());
    assert!(log.peak_concurrency() > 1, "tasks never overlapped");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn single_slot_runs_tasks_in_queue_order() {
    init_tracing();

    let log = ExecutionLog::new();
    let names = ["e", "b", "d", "a", "c"];
    let tasks: Vec<TestTask> = names
        .iter()
        .map(|n| recording_task(n, &log, Duration::from_millis(5)))
        .collect();

    with_timeout(Scheduler::new(RunOptions::default().with_max_concurrency(1)).run(tasks)).await;

    assert_eq!(log.start_order(), names);
    assert_eq!(log.peak_concurrency(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn blocking_and_async_bodies_mix() {
    init_tracing();

    let log = ExecutionLog::new();
    let tasks = vec![
        blocking_recording_task("blocking-1", &log, SHORT),
        recording_task("async-1", &log, SHORT),
        blocking_recording_task("blocking-2", &log, SHORT),
        recording_task("async-2", &log, SHORT),
    ];

    let report =
        with_timeout(Scheduler::new(RunOptions::default().with_max_concurrency(4)).run(tasks))
            .await;

    assert_eq!(report.completed, 4);
    assert_eq!(report.failed, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn failures_are_isolated_and_counted() {
    init_tracing();

    let log = ExecutionLog::new();
    let soft_fail = TestTask::blocking("soft-fail", |ctx| {
        ctx.check(1 + 1 == 3, "arithmetic is broken");
        ctx.fail("second assertion");
        Ok(())
    });

    let tasks = vec![
        failing_task("returns-error", "boom"),
        recording_task("healthy", &log, SHORT),
        panicking_task("panics", "kaboom"),
        soft_fail,
        noop_task("also-healthy"),
    ];

    let report =
        with_timeout(Scheduler::new(RunOptions::default().with_max_concurrency(2)).run(tasks))
            .await;

    assert_eq!(report.total, 5);
    assert_eq!(report.completed, 5);
    assert_eq!(report.failed, 3);
    assert_eq!(report.failed, report.failed_tasks().count());

    let healthy = report.task("healthy").unwrap();
    assert!(healthy.ended_at.is_some());
    assert!(healthy.errors.is_empty());
    assert!(report.task("also-healthy").unwrap().errors.is_empty());

    let returned = report.task("returns-error").unwrap();
    assert_eq!(
        returned.errors,
        vec!["during the test an error occurred: boom".to_string()]
    );

    let panicked = report.task("panics").unwrap();
    assert_eq!(panicked.errors.len(), 1);
    assert!(panicked.errors[0].contains("kaboom"));

    let soft = report.task("soft-fail").unwrap();
    assert_eq!(
        soft.errors,
        vec![
            "arithmetic is broken".to_string(),
            "second assertion".to_string()
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn filter_selects_tasks_before_running() {
    init_tracing();

    let log = ExecutionLog::new();
    let tasks = vec![
        recording_task("unit", &log, SHORT).tag("fast"),
        recording_task("integration", &log, SHORT).tag("slow"),
        recording_task("untagged", &log, SHORT),
        recording_task("smoke", &log, SHORT).tag("fast").tag("net"),
    ];

    let filter = TaskFilter::new(Some(compile("fast -net").unwrap()));
    let scheduler = Scheduler::new(RunOptions::default().with_filter(filter));
    let report = with_timeout(scheduler.run(tasks)).await;

    let ran: Vec<&str> = report.tasks.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(ran, vec!["unit", "untagged"]);
    assert_eq!(report.total, 2);

    let mut started = log.start_order();
    started.sort();
    assert_eq!(started, vec!["unit".to_string(), "untagged".to_string()]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn empty_queue_finishes_immediately() {
    init_tracing();

    let report = with_timeout(Scheduler::new(RunOptions::default()).run(vec![])).await;
    assert_eq!(report.total, 0);
    assert_eq!(report.completed, 0);
    assert!(report.is_success());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn progress_and_timestamps_are_recorded() {
    init_tracing();

    let task = TestTask::new_async("progressing", |ctx| async move {
        ctx.set_progress(40.0);
        tokio::time::sleep(Duration::from_millis(10)).await;
        ctx.set_progress(250.0);
        Ok::<(), anyhow::Error>(())
    });

    let report = with_timeout(Scheduler::new(RunOptions::default()).run(vec![task])).await;
    let task = report.task("progressing").unwrap();

    assert_eq!(task.progress, 100.0);
    let (start, end) = (task.started_at.unwrap(), task.ended_at.unwrap());
    assert!(end >= start);
    assert!(task.elapsed().unwrap() >= Duration::from_millis(10));
}

#[derive(Default)]
struct RecordingSink {
    finished: Mutex<Vec<String>>,
    reports: Mutex<Vec<(StatusSnapshot, bool)>>,
}

impl StatusSink for RecordingSink {
    fn report(&self, status: &StatusSnapshot, final_report: bool) {
        self.reports
            .lock()
            .unwrap()
            .push((status.clone(), final_report));
    }

    fn task_finished(&self, report: &TaskReport) {
        self.finished.lock().unwrap().push(report.name.clone());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn status_sink_sees_periodic_and_final_reports() {
    init_tracing();

    let log = ExecutionLog::new();
    let tasks = vec![
        recording_task("long", &log, Duration::from_millis(200)),
        recording_task("short", &log, SHORT).barrier_after(),
        recording_task("after", &log, SHORT),
    ];

    let sink = Arc::new(RecordingSink::default());
    let options = RunOptions::default()
        .with_max_concurrency(2)
        .with_status_interval(Duration::from_millis(20));
    let scheduler = Scheduler::new(options).with_status_sink(sink.clone());

    with_timeout(scheduler.run(tasks)).await;

    let mut finished = sink.finished.lock().unwrap().clone();
    finished.sort();
    assert_eq!(finished, vec!["after", "long", "short"]);

    let reports = sink.reports.lock().unwrap();
    let (last, is_final) = reports.last().expect("at least the final report");
    assert!(*is_final);
    assert_eq!(last.completed, 3);
    assert_eq!(last.running, 0);
    assert!(last.active.is_empty());

    // The barrier keeps the controller waiting for ~200ms.
    let periodic: Vec<_> = reports.iter().filter(|(_, f)| !*f).collect();
    assert!(!periodic.is_empty());
    assert!(periodic.iter().any(|(s, _)| !s.active.is_empty()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn convenience_run_returns_failure_count() {
    init_tracing();

    let tasks = vec![
        noop_task("ok"),
        failing_task("bad-1", "first"),
        failing_task("bad-2", "second"),
    ];

    let failed = with_timeout(run(tasks, RunOptions::default())).await;
    assert_eq!(failed, 2);
}

#[test]
fn zero_concurrency_falls_back_to_default() {
    let options = RunOptions::default().with_max_concurrency(0);
    assert!(options.max_concurrency.is_none());
    assert!(options.effective_concurrency() >= 1);

    let options = RunOptions::default().with_max_concurrency(3);
    assert_eq!(options.effective_concurrency(), 3);
}

struct PanickingSink;

impl StatusSink for PanickingSink {
    fn report(&self, _status: &StatusSnapshot, _final_report: bool) {}

    fn task_finished(&self, report: &TaskReport) {
        panic!("sink cannot handle {}", report.name);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn panicking_sink_does_not_stall_the_run() {
    init_tracing();

    let tasks = vec![
        noop_task("first"),
        failing_task("second", "boom").barrier_before(),
        noop_task("third"),
    ];

    let scheduler = Scheduler::new(RunOptions::default().with_max_concurrency(2))
        .with_status_sink(Arc::new(PanickingSink));
    let report = with_timeout(scheduler.run(tasks)).await;

    assert_eq!(report.completed, 3);
    assert_eq!(report.failed, 1);
    assert_eq!(
        scheduler.counts(),
        Counts {
            running: 0,
            completed: 3,
            failed: 1
        }
    );
}
