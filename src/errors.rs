// src/errors.rs

//! Crate-wide error types.
//!
//! Setup errors (config, filter syntax) abort before anything runs. Failures
//! inside task bodies never surface here; they are recorded on the task as
//! [`TestError`](crate::task::TestError)s.

use thiserror::Error;

/// Syntax or structure error in a filter expression or condition tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("invalid duration in filter token '{token}' (expected '<NUMBER')")]
    InvalidDuration { token: String },

    #[error("filter token '{token}' is missing a tag name or number")]
    EmptyToken { token: String },

    #[error("counted condition requires at least one match (got 0)")]
    ZeroQuorum,
}

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Filter error: {0}")]
    FilterError(#[from] FilterError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DriverError>;
