// src/config/validate.rs

use std::collections::HashSet;

use regex::Regex;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{DriverError, Result};
use crate::filter::{CompiledFilter, compile};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::DriverError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let filter = validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.task, filter))
    }
}

/// Validate a raw config, returning its compiled filter.
fn validate_raw_config(cfg: &RawConfigFile) -> Result<Option<CompiledFilter>> {
    ensure_has_tasks(cfg)?;
    validate_global_config(cfg)?;
    validate_tasks(cfg)?;

    let filter = cfg.config.filter.as_deref().map(compile).transpose()?;
    Ok(filter)
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(DriverError::ConfigError(
            "config must contain at least one [[task]] entry".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.max_concurrency == Some(0) {
        return Err(DriverError::ConfigError(
            "[config].max_concurrency must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.config.status_interval_ms == 0 {
        return Err(DriverError::ConfigError(
            "[config].status_interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.config.general_priority.is_some_and(f64::is_nan) {
        return Err(DriverError::ConfigError(
            "[config].general_priority must be a number (got NaN)".to_string(),
        ));
    }

    Ok(())
}

fn validate_tasks(cfg: &RawConfigFile) -> Result<()> {
    let mut seen = HashSet::new();

    for task in cfg.task.iter() {
        if task.name.trim().is_empty() {
            return Err(DriverError::ConfigError(
                "every [[task]] needs a non-empty `name`".to_string(),
            ));
        }
        if !seen.insert(task.name.as_str()) {
            return Err(DriverError::ConfigError(format!(
                "task '{}' is declared more than once",
                task.name
            )));
        }
        if task.cmd.trim().is_empty() {
            return Err(DriverError::ConfigError(format!(
                "task '{}' has an empty `cmd`",
                task.name
            )));
        }

        for tag in task.tags.iter() {
            let name = tag.name();
            if name.trim().is_empty() || name == "?" {
                return Err(DriverError::ConfigError(format!(
                    "task '{}' has an invalid tag name '{}'",
                    task.name, name
                )));
            }
        }

        if let Some(pattern) = &task.progress_regex {
            Regex::new(pattern).map_err(|e| {
                DriverError::ConfigError(format!(
                    "task '{}' has an invalid `progress_regex`: {e}",
                    task.name
                ))
            })?;
        }
    }
    Ok(())
}
