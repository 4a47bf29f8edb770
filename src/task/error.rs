// src/task/error.rs

use std::any::Any;
use std::sync::Arc;

use thiserror::Error;

/// An error recorded against a task.
///
/// Produced either by the scheduler (the body returned an error or
/// panicked) or by the body itself through
/// [`TaskContext::fail`](crate::task::TaskContext::fail). Both count the
/// same for the run's failure total.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct TestError {
    pub message: String,
    pub cause: Option<Arc<anyhow::Error>>,
}

impl TestError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    /// Wrap an error returned by a task body.
    pub fn from_error(err: anyhow::Error) -> Self {
        Self {
            message: format!("during the test an error occurred: {err:#}"),
            cause: Some(Arc::new(err)),
        }
    }

    /// Wrap the payload of a panicking task body.
    pub fn from_panic(payload: Box<dyn Any + Send + 'static>) -> Self {
        let detail = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::new(format!("during the test the task panicked: {detail}"))
    }
}
