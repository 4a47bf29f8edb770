// src/exec/mod.rs

//! Process execution layer.
//!
//! Turns configured `[[task]]` entries into test tasks whose body runs a
//! shell command through `tokio::process::Command`.
//!
//! - [`command`] owns the [`CommandTaskProvider`] and the command body.
//! - [`output`] drains stdout/stderr, reading progress from stdout and
//!   keeping a stderr tail for failure messages.

pub mod command;
pub mod output;

pub use command::{CommandTaskProvider, build_task};
