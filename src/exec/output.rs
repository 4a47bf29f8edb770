// src/exec/output.rs

//! Consumers for a child process's stdout and stderr.
//!
//! Both pipes are always drained so the child never blocks on a full OS
//! buffer. Lines are logged at debug; stdout lines may additionally carry
//! progress, stderr keeps a short tail for the failure message.

use std::collections::VecDeque;

use regex::Regex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{ChildStderr, ChildStdout};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::task::TaskContext;

/// Number of trailing stderr lines kept for error reporting.
pub const STDERR_TAIL_LINES: usize = 10;

/// Read a progress percentage from `line` using the first capture group of
/// `regex`.
pub fn parse_progress(regex: &Regex, line: &str) -> Option<f32> {
    let caps = regex.captures(line)?;
    caps.get(1)?.as_str().trim().parse::<f32>().ok()
}

/// Drain stdout, forwarding progress matches to `ctx`.
pub fn spawn_stdout_monitor(
    stdout: ChildStdout,
    progress: Option<Regex>,
    ctx: TaskContext,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let reader = BufReader::new(stdout);
        let mut lines = reader.lines();

        while let Ok(Some(line)) = lines.next_line().await {
            debug!(task = %ctx.name(), "stdout: {}", line);

            if let Some(percent) = progress.as_ref().and_then(|re| parse_progress(re, &line)) {
                debug!(task = %ctx.name(), percent, "progress reported on stdout");
                ctx.set_progress(percent);
            }
        }

        debug!(task = %ctx.name(), "stdout monitor ended");
    })
}

/// Drain stderr and return its last [`STDERR_TAIL_LINES`] lines.
pub fn spawn_stderr_collector(stderr: ChildStderr, task: String) -> JoinHandle<Vec<String>> {
    tokio::spawn(async move {
        let reader = BufReader::new(stderr);
        let mut lines = reader.lines();
        let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);

        while let Ok(Some(line)) = lines.next_line().await {
            debug!(task = %task, "stderr: {}", line);
            if tail.len() == STDERR_TAIL_LINES {
                tail.pop_front();
            }
            tail.push_back(line);
        }

        tail.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_read_from_first_capture_group() {
        let re = Regex::new(r"progress:\s*(\d+(?:\.\d+)?)%").unwrap();
        assert_eq!(parse_progress(&re, "progress: 42%"), Some(42.0));
        assert_eq!(parse_progress(&re, "progress: 12.5%"), Some(12.5));
        assert_eq!(parse_progress(&re, "nothing here"), None);
    }

    #[test]
    fn regex_without_group_yields_nothing() {
        let re = Regex::new(r"done").unwrap();
        assert_eq!(parse_progress(&re, "done"), None);
    }
}
