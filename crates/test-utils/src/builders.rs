#![allow(dead_code)]

use tagdriver::config::{ConfigFile, ConfigSection, RawConfigFile, TagConfig, TaskConfig};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                task: Vec::new(),
            },
        }
    }

    pub fn with_task(mut self, task: TaskConfig) -> Self {
        self.config.task.push(task);
        self
    }

    pub fn max_concurrency(mut self, max: usize) -> Self {
        self.config.config.max_concurrency = Some(max);
        self
    }

    pub fn filter(mut self, expr: &str) -> Self {
        self.config.config.filter = Some(expr.to_string());
        self
    }

    pub fn general_priority(mut self, priority: f64) -> Self {
        self.config.config.general_priority = Some(priority);
        self
    }

    pub fn status_interval_ms(mut self, ms: u64) -> Self {
        self.config.config.status_interval_ms = ms;
        self
    }

    /// The unvalidated config, for tests exercising validation errors.
    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(name: &str, cmd: &str) -> Self {
        Self {
            task: TaskConfig {
                name: name.to_string(),
                cmd: cmd.to_string(),
                tags: vec![],
                single_thread: false,
                barrier_before: false,
                barrier_after: false,
                progress_regex: None,
            },
        }
    }

    pub fn tag(mut self, name: &str) -> Self {
        self.task.tags.push(TagConfig::Name(name.to_string()));
        self
    }

    pub fn tag_with(mut self, name: &str, priority: f64, duration: f64) -> Self {
        self.task.tags.push(TagConfig::Detailed {
            name: name.to_string(),
            priority,
            duration,
        });
        self
    }

    pub fn single_thread(mut self, val: bool) -> Self {
        self.task.single_thread = val;
        self
    }

    pub fn barrier_before(mut self, val: bool) -> Self {
        self.task.barrier_before = val;
        self
    }

    pub fn barrier_after(mut self, val: bool) -> Self {
        self.task.barrier_after = val;
        self
    }

    pub fn progress_regex(mut self, pattern: &str) -> Self {
        self.task.progress_regex = Some(pattern.to_string());
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}
