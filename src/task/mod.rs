// src/task/mod.rs

//! Task model and task providers.
//!
//! - [`test_task`] defines [`TestTask`], its body and the [`TaskContext`]
//!   a running body uses to report progress and failures.
//! - [`error`] defines [`TestError`], the per-task failure record.
//! - [`registry`] provides the [`TaskProvider`] trait and an explicit
//!   factory registry for host applications.

pub mod error;
pub mod registry;
pub mod test_task;

pub use error::TestError;
pub use registry::{TaskProvider, TaskRegistry};
pub use test_task::{BodyFuture, TaskBody, TaskContext, TestTask};
