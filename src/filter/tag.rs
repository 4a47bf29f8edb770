// src/filter/tag.rs

//! Tags attached to tasks and tags used as queries inside conditions.

use std::fmt;

use crate::filter::tri::Tri;

/// A named label with a priority and an optional duration.
///
/// Task tags always carry a name (see [`Tag::named`]). Query tags used in
/// conditions may be wildcards (`name == None`) that match any task tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub name: Option<String>,
    pub priority: f64,
    /// Negative means "unconstrained".
    pub duration: f64,
    /// Only meaningful for query tags.
    ///
    /// - `true`: keep tasks whose matching tags do not exceed `duration`.
    /// - `false`: look for tasks whose matching tags exceed `duration`
    ///   (used by exclusion rules hunting for slow tasks).
    pub max_duration: bool,
}

impl Tag {
    /// A task tag with default priority `0.0` and no duration.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            priority: 0.0,
            duration: -1.0,
            max_duration: true,
        }
    }

    /// A query tag that matches any task tag name.
    pub fn wildcard() -> Self {
        Self {
            name: None,
            priority: f64::NEG_INFINITY,
            duration: -1.0,
            max_duration: true,
        }
    }

    pub fn with_priority(mut self, priority: f64) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_max_duration(mut self, max_duration: bool) -> Self {
        self.max_duration = max_duration;
        self
    }

    pub fn is_wildcard(&self) -> bool {
        self.name.is_none()
    }

    pub fn has_duration(&self) -> bool {
        self.duration >= 0.0
    }

    /// Name match used when scanning task tags for this query.
    fn matches_name(&self, task_tag: &Tag) -> bool {
        match &self.name {
            None => true,
            Some(name) => task_tag.name.as_deref() == Some(name.as_str()),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name.as_deref().unwrap_or("?"))?;
        if self.has_duration() {
            write!(f, "<{}", self.duration)?;
        }
        Ok(())
    }
}

/// Does a task carrying `task_tags` satisfy the `query` tag?
///
/// The result is always decided (`Yes` or `No`); `Unknown` is only used
/// internally while scanning.
pub fn tag_satisfies(task_tags: &[Tag], query: &Tag) -> Tri {
    if task_tags.is_empty() {
        return Tri::from(query.is_wildcard());
    }

    let mut priority = Tri::Unknown;
    let mut duration = Tri::Unknown;

    for tag in task_tags.iter().filter(|t| query.matches_name(t)) {
        if tag.priority >= query.priority || !query.max_duration {
            priority = Tri::Yes;
        } else if priority == Tri::Unknown {
            priority = Tri::No;
        }

        if query.max_duration {
            if tag.has_duration() && query.has_duration() && tag.duration > query.duration {
                return Tri::No;
            }
            continue;
        }

        if !query.has_duration() {
            duration = Tri::Yes;
        } else if tag.has_duration() {
            if tag.duration > query.duration {
                duration = Tri::Yes;
            } else if duration == Tri::Unknown {
                duration = Tri::No;
            }
        }
    }

    if query.max_duration {
        priority.or_no()
    } else {
        duration.or_no()
    }
}
