// src/filter/task_filter.rs

use crate::filter::parser::CompiledFilter;
use crate::filter::tag::Tag;

/// Decides which declared tasks take part in a run.
///
/// Two gates are applied in order:
/// 1. the general priority: a tagged task needs at least one tag with
///    `priority >= general_priority` (untagged tasks always pass),
/// 2. the compiled filter expression, if any.
#[derive(Debug, Clone)]
pub struct TaskFilter {
    pub general_priority: f64,
    pub condition: Option<CompiledFilter>,
}

impl Default for TaskFilter {
    fn default() -> Self {
        Self {
            general_priority: f64::NEG_INFINITY,
            condition: None,
        }
    }
}

impl TaskFilter {
    pub fn new(condition: Option<CompiledFilter>) -> Self {
        Self {
            condition,
            ..Self::default()
        }
    }

    pub fn with_general_priority(mut self, priority: f64) -> Self {
        self.general_priority = priority;
        self
    }

    pub fn accepts(&self, task_tags: &[Tag]) -> bool {
        if !satisfies_priority(task_tags, self.general_priority) {
            return false;
        }

        match &self.condition {
            Some(filter) => filter.accepts(task_tags),
            None => true,
        }
    }
}

fn satisfies_priority(task_tags: &[Tag], general_priority: f64) -> bool {
    task_tags.is_empty() || task_tags.iter().any(|t| t.priority >= general_priority)
}
