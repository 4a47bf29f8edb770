// src/task/registry.rs

//! Explicit task registration.
//!
//! Host applications declare their tasks by registering factory functions.
//! Factories are either *automatic* (always contribute their tasks) or
//! *manual*: manual factories only contribute when explicitly included,
//! which is how tasks needing hand-picked parameters are kept out of the
//! default set.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::errors::{DriverError, Result};
use crate::task::test_task::TestTask;

/// Something that can supply the ordered list of tasks for a run.
pub trait TaskProvider {
    fn provide(&self) -> Result<Vec<TestTask>>;
}

type Factory = Box<dyn Fn() -> Vec<TestTask> + Send + Sync>;

struct Entry {
    name: String,
    manual: bool,
    factory: Factory,
}

/// Ordered collection of task factories.
#[derive(Default)]
pub struct TaskRegistry {
    entries: Vec<Entry>,
    included: HashSet<String>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an automatic factory.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Vec<TestTask> + Send + Sync + 'static,
    {
        self.push(name.into(), false, Box::new(factory))
    }

    /// Register a factory that only contributes once [`include_manual`] is
    /// called for it.
    ///
    /// [`include_manual`]: TaskRegistry::include_manual
    pub fn register_manual<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Vec<TestTask> + Send + Sync + 'static,
    {
        self.push(name.into(), true, Box::new(factory))
    }

    /// Include a manual factory in [`provide`](TaskProvider::provide).
    pub fn include_manual(&mut self, name: &str) -> Result<&mut Self> {
        let manual = self.entries.iter().find(|e| e.name == name).map(|e| e.manual);
        match manual {
            Some(true) => {
                self.included.insert(name.to_string());
                Ok(self)
            }
            Some(false) => Err(DriverError::ConfigError(format!(
                "factory '{name}' is automatic; only manual factories need to be included"
            ))),
            None => Err(DriverError::ConfigError(format!(
                "no factory named '{name}' is registered"
            ))),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names of manual factories that were registered but never included.
    pub fn forgotten_manual(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.manual && !self.included.contains(&e.name))
            .map(|e| e.name.as_str())
            .collect()
    }

    fn push(&mut self, name: String, manual: bool, factory: Factory) -> &mut Self {
        if self.entries.iter().any(|e| e.name == name) {
            warn!(factory = %name, "factory registered twice; both registrations are kept");
        }
        self.entries.push(Entry {
            name,
            manual,
            factory,
        });
        self
    }
}

impl TaskProvider for TaskRegistry {
    fn provide(&self) -> Result<Vec<TestTask>> {
        for name in self.forgotten_manual() {
            warn!(
                factory = %name,
                "manual factory declared but not included for execution"
            );
        }

        let mut tasks = Vec::new();
        for entry in &self.entries {
            if entry.manual && !self.included.contains(&entry.name) {
                continue;
            }
            let produced = (entry.factory)();
            debug!(factory = %entry.name, count = produced.len(), "factory produced tasks");
            tasks.extend(produced);
        }
        Ok(tasks)
    }
}

