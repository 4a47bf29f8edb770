// tests/config_validation.rs
mod common;
use crate::common::{init_tracing, tags};

use std::io::Write;
use std::time::Duration;

use tempfile::NamedTempFile;
use tagdriver::config::{ConfigFile, TagConfig, load_and_validate, parse_and_validate};
use tagdriver::errors::{DriverError, FilterError};
use tagdriver::filter::Tag;
use tagdriver_test_utils::builders::{ConfigFileBuilder, TaskConfigBuilder};

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn expect_config_error(result: Result<ConfigFile, DriverError>, needle: &str) {
    match result {
        Err(DriverError::ConfigError(msg)) => {
            assert!(msg.contains(needle), "message {msg:?} lacks {needle:?}")
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn full_config_file_is_loaded() -> TestResult {
    init_tracing();

    let mut file = NamedTempFile::new()?;
    write!(
        file,
        r#"
[config]
max_concurrency = 3
filter = "fast -flaky"
general_priority = 0.5
status_interval_ms = 500

[[task]]
name = "unit"
cmd = "echo unit"
tags = ["fast", {{ name = "core", priority = 2.0, duration = 12.5 }}]

[[task]]
name = "migrations"
cmd = "echo migrate"
tags = ["db"]
single_thread = true
progress_regex = "(\\d+)%"
"#
    )?;

    let cfg = load_and_validate(file.path())?;

    assert_eq!(cfg.config.max_concurrency, Some(3));
    assert_eq!(cfg.config.status_interval_ms, 500);
    assert_eq!(cfg.filter().map(|f| f.source()), Some("fast -flaky"));

    let names: Vec<&str> = cfg.task.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["unit", "migrations"]);

    let unit = &cfg.task[0];
    assert_eq!(
        unit.tags,
        vec![
            TagConfig::Name("fast".into()),
            TagConfig::Detailed {
                name: "core".into(),
                priority: 2.0,
                duration: 12.5
            }
        ]
    );
    assert_eq!(
        unit.task_tags(),
        vec![
            Tag::named("fast"),
            Tag::named("core").with_priority(2.0).with_duration(12.5)
        ]
    );

    let migrations = &cfg.task[1];
    assert!(migrations.effective_barrier_before());
    assert!(migrations.effective_barrier_after());
    assert_eq!(migrations.progress_regex.as_deref(), Some("(\\d+)%"));

    let options = cfg.run_options();
    assert_eq!(options.effective_concurrency(), 3);
    assert_eq!(options.status_interval, Duration::from_millis(500));
    assert_eq!(options.filter.general_priority, 0.5);
    assert!(options.filter.accepts(&[Tag::named("fast").with_priority(1.0)]));
    assert!(!options.filter.accepts(&[Tag::named("fast").with_priority(0.0)]));
    Ok(())
}

#[test]
fn defaults_apply_when_config_section_is_missing() -> TestResult {
    let cfg = parse_and_validate(
        r#"
[[task]]
name = "only"
cmd = "true"
"#,
    )?;

    assert_eq!(cfg.config.max_concurrency, None);
    assert_eq!(cfg.config.status_interval_ms, 2000);
    assert!(cfg.filter().is_none());

    let task = &cfg.task[0];
    assert!(task.tags.is_empty());
    assert!(!task.effective_barrier_before());
    assert!(!task.effective_barrier_after());

    let options = cfg.run_options();
    assert!(options.filter.accepts(&tags(&["anything"])));
    assert!(options.effective_concurrency() >= 1);
    Ok(())
}

#[test]
fn config_without_tasks_is_rejected() {
    expect_config_error(parse_and_validate("[config]\nmax_concurrency = 2\n"), "at least one");
}

#[test]
fn duplicate_task_names_are_rejected() {
    let raw = ConfigFileBuilder::new()
        .with_task(TaskConfigBuilder::new("a", "true").build())
        .with_task(TaskConfigBuilder::new("a", "false").build())
        .build_raw();

    expect_config_error(ConfigFile::try_from(raw), "more than once");
}

#[test]
fn empty_name_and_command_are_rejected() {
    let raw = ConfigFileBuilder::new()
        .with_task(TaskConfigBuilder::new("  ", "true").build())
        .build_raw();
    expect_config_error(ConfigFile::try_from(raw), "non-empty `name`");

    let raw = ConfigFileBuilder::new()
        .with_task(TaskConfigBuilder::new("a", " ").build())
        .build_raw();
    expect_config_error(ConfigFile::try_from(raw), "empty `cmd`");
}

#[test]
fn invalid_tag_names_are_rejected() {
    let raw = ConfigFileBuilder::new()
        .with_task(TaskConfigBuilder::new("a", "true").tag("").build())
        .build_raw();
    expect_config_error(ConfigFile::try_from(raw), "invalid tag name");

    let raw = ConfigFileBuilder::new()
        .with_task(TaskConfigBuilder::new("a", "true").tag("?").build())
        .build_raw();
    expect_config_error(ConfigFile::try_from(raw), "invalid tag name");
}

#[test]
fn zero_limits_are_rejected() {
    let raw = ConfigFileBuilder::new()
        .max_concurrency(0)
        .with_task(TaskConfigBuilder::new("a", "true").build())
        .build_raw();
    expect_config_error(ConfigFile::try_from(raw), "max_concurrency");

    let raw = ConfigFileBuilder::new()
        .status_interval_ms(0)
        .with_task(TaskConfigBuilder::new("a", "true").build())
        .build_raw();
    expect_config_error(ConfigFile::try_from(raw), "status_interval_ms");
}

#[test]
fn bad_progress_regex_is_rejected() {
    let raw = ConfigFileBuilder::new()
        .with_task(TaskConfigBuilder::new("a", "true").progress_regex("(unclosed").build())
        .build_raw();
    expect_config_error(ConfigFile::try_from(raw), "progress_regex");
}

#[test]
fn bad_filter_is_a_filter_error() {
    let raw = ConfigFileBuilder::new()
        .filter("fast <later")
        .with_task(TaskConfigBuilder::new("a", "true").build())
        .build_raw();

    match ConfigFile::try_from(raw) {
        Err(DriverError::FilterError(FilterError::InvalidDuration { token })) => {
            assert_eq!(token, "<later")
        }
        Err(e) => panic!("Expected FilterError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn malformed_toml_is_a_toml_error() {
    match parse_and_validate("[[task]\nname = ") {
        Err(DriverError::TomlError(_)) => {}
        Err(e) => panic!("Expected TomlError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn missing_file_is_an_io_error() {
    match load_and_validate("/definitely/not/here/Tagdriver.toml") {
        Err(DriverError::IoError(_)) => {}
        Err(e) => panic!("Expected IoError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn builder_produces_valid_config() {
    let cfg = ConfigFileBuilder::new()
        .filter("+db")
        .general_priority(1.0)
        .with_task(
            TaskConfigBuilder::new("db", "true")
                .tag_with("db", 2.0, -1.0)
                .barrier_after(true)
                .build(),
        )
        .build();

    assert!(cfg.task[0].effective_barrier_after());
    assert!(!cfg.task[0].effective_barrier_before());
    assert!(cfg.run_options().filter.accepts(&cfg.task[0].task_tags()));
}
