// tests/command_tasks.rs
#![cfg(unix)]

mod common;
use crate::common::{init_tracing, with_timeout};

use tagdriver::exec::CommandTaskProvider;
use tagdriver::sched::{RunOptions, Scheduler};
use tagdriver::task::TaskProvider;
use tagdriver_test_utils::builders::{ConfigFileBuilder, TaskConfigBuilder};

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn successful_and_failing_commands() -> TestResult {
    init_tracing();

    let cfg = ConfigFileBuilder::new()
        .with_task(TaskConfigBuilder::new("ok", "echo hello").build())
        .with_task(
            TaskConfigBuilder::new("broken", "echo 'disk on fire' >&2; exit 3").build(),
        )
        .build();

    let tasks = CommandTaskProvider::from_config(&cfg).provide()?;
    let report = with_timeout(Scheduler::new(cfg.run_options()).run(tasks)).await;

    assert_eq!(report.completed, 2);
    assert_eq!(report.failed, 1);
    assert!(report.task("ok").unwrap().errors.is_empty());

    let broken = report.task("broken").unwrap();
    assert_eq!(broken.errors.len(), 1);
    let message = &broken.errors[0];
    assert!(message.contains("exited with code 3"), "{message}");
    assert!(message.contains("disk on fire"), "{message}");
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn progress_is_read_from_stdout() -> TestResult {
    init_tracing();

    let cfg = ConfigFileBuilder::new()
        .with_task(
            TaskConfigBuilder::new("steps", "echo 'progress 10%'; echo 'progress 75%'; echo done")
                .progress_regex(r"progress (\d+)%")
                .build(),
        )
        .build();

    let tasks = CommandTaskProvider::from_config(&cfg).provide()?;
    let report = with_timeout(Scheduler::new(RunOptions::default()).run(tasks)).await;

    let steps = report.task("steps").unwrap();
    assert!(steps.errors.is_empty());
    assert_eq!(steps.progress, 75.0);
    Ok(())
}

#[test]
fn provided_tasks_carry_tags_and_barriers() -> TestResult {
    let cfg = ConfigFileBuilder::new()
        .with_task(
            TaskConfigBuilder::new("db", "true")
                .tag("db")
                .tag_with("slow", 1.0, 30.0)
                .single_thread(true)
                .build(),
        )
        .with_task(
            TaskConfigBuilder::new("unit", "true")
                .tag("fast")
                .barrier_before(true)
                .build(),
        )
        .build();

    let tasks = CommandTaskProvider::from_config(&cfg).provide()?;
    assert_eq!(tasks.len(), 2);

    let db = &tasks[0];
    assert_eq!(db.name(), "db");
    assert_eq!(db.tags().len(), 2);
    assert_eq!(db.tags()[1].duration, 30.0);
    assert!(db.has_barrier_before() && db.has_barrier_after());

    let unit = &tasks[1];
    assert!(unit.has_barrier_before());
    assert!(!unit.has_barrier_after());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn filter_from_config_selects_commands() -> TestResult {
    init_tracing();

    let cfg = ConfigFileBuilder::new()
        .filter("-slow")
        .with_task(TaskConfigBuilder::new("quick", "true").tag("fast").build())
        .with_task(TaskConfigBuilder::new("sluggish", "false").tag("slow").build())
        .build();

    let tasks = CommandTaskProvider::from_config(&cfg).provide()?;
    let report = with_timeout(Scheduler::new(cfg.run_options()).run(tasks)).await;

    assert_eq!(report.total, 1);
    assert_eq!(report.tasks[0].name, "quick");
    assert!(report.is_success());
    Ok(())
}
