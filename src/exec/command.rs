// src/exec/command.rs

use std::process::Stdio;
use std::sync::Arc;

use anyhow::{Context, bail};
use regex::Regex;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::model::{ConfigFile, TaskConfig};
use crate::errors::{DriverError, Result};
use crate::exec::output;
use crate::task::{TaskContext, TaskProvider, TestTask};

/// Everything a command body needs once the task is running.
#[derive(Debug)]
struct ShellCommand {
    name: String,
    cmd: String,
    progress: Option<Regex>,
}

/// Provides one shell-command task per `[[task]]` entry, in declaration order.
#[derive(Debug, Clone)]
pub struct CommandTaskProvider {
    tasks: Vec<TaskConfig>,
}

impl CommandTaskProvider {
    pub fn new(tasks: Vec<TaskConfig>) -> Self {
        Self { tasks }
    }

    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self::new(cfg.task.clone())
    }
}

impl TaskProvider for CommandTaskProvider {
    fn provide(&self) -> Result<Vec<TestTask>> {
        self.tasks.iter().map(build_task).collect()
    }
}

/// Turn a task entry into a runnable [`TestTask`].
pub fn build_task(tc: &TaskConfig) -> Result<TestTask> {
    let progress = tc
        .progress_regex
        .as_deref()
        .map(Regex::new)
        .transpose()
        .map_err(|e| {
            DriverError::ConfigError(format!(
                "task '{}' has an invalid `progress_regex`: {e}",
                tc.name
            ))
        })?;

    let command = Arc::new(ShellCommand {
        name: tc.name.clone(),
        cmd: tc.cmd.clone(),
        progress,
    });

    let mut task = TestTask::new_async(tc.name.clone(), move |ctx| {
        run_command(Arc::clone(&command), ctx)
    })
    .with_tags(tc.task_tags());

    if tc.effective_barrier_before() {
        task = task.barrier_before();
    }
    if tc.effective_barrier_after() {
        task = task.barrier_after();
    }
    Ok(task)
}

/// Run the command through the platform shell and wait for it.
///
/// A non-zero exit is an error carrying the exit code and the tail of
/// stderr.
async fn run_command(command: Arc<ShellCommand>, ctx: TaskContext) -> anyhow::Result<()> {
    info!(task = %command.name, cmd = %command.cmd, "starting task process");

    // Build a shell command appropriate for the platform.
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(&command.cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(&command.cmd);
        c
    };

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning process for task '{}'", command.name))?;

    let stdout = child
        .stdout
        .take()
        .map(|out| output::spawn_stdout_monitor(out, command.progress.clone(), ctx.clone()));
    let stderr = child
        .stderr
        .take()
        .map(|err| output::spawn_stderr_collector(err, command.name.clone()));

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for process of task '{}'", command.name))?;

    // Let the readers hit EOF so the last progress line is not lost.
    if let Some(handle) = stdout {
        let _ = handle.await;
    }
    let tail = match stderr {
        Some(handle) => handle.await.unwrap_or_default(),
        None => Vec::new(),
    };

    let code = status.code().unwrap_or(-1);
    info!(
        task = %command.name,
        exit_code = code,
        success = status.success(),
        "task process exited"
    );

    if !status.success() {
        if tail.is_empty() {
            bail!("command `{}` exited with code {code}", command.cmd);
        }
        bail!(
            "command `{}` exited with code {code}; stderr:\n{}",
            command.cmd,
            tail.join("\n")
        );
    }

    debug!(task = %command.name, "task process succeeded");
    Ok(())
}
