// src/filter/evaluate.rs

//! Recursive evaluation of a [`Condition`] tree against a task's tags.
//!
//! Evaluation is pure: the tree is only read, so the same tree can be
//! shared between threads and evaluated concurrently.

use crate::filter::condition::{Condition, ConditionKind, Quorum};
use crate::filter::tag::{Tag, tag_satisfies};
use crate::filter::tri::Tri;

impl Condition {
    /// Evaluate this condition against the tags of one task.
    pub fn evaluate(&self, task_tags: &[Tag]) -> Tri {
        let result = match self.kind() {
            ConditionKind::Tags { tags, quorum } => evaluate_tags(task_tags, tags, *quorum),
            ConditionKind::Tree { children, quorum } => {
                evaluate_tree(task_tags, children, *quorum)
            }
            ConditionKind::Priority { children } => evaluate_priority(task_tags, children),
            ConditionKind::AlwaysTrue => Tri::Yes,
            ConditionKind::AlwaysFalse => Tri::No,
        };

        if self.is_reversed() { !result } else { result }
    }
}

fn evaluate_tags(task_tags: &[Tag], query: &[Tag], quorum: Quorum) -> Tri {
    if query.is_empty() {
        return Tri::Unknown;
    }

    let required = quorum.required(query.len());
    // Not applicable to tasks that cannot possibly carry enough tags.
    if task_tags.len() < required {
        return Tri::Unknown;
    }

    let mut counter = Counter::default();
    for tag in query {
        counter.add(tag_satisfies(task_tags, tag));
    }
    counter.verdict(required)
}

fn evaluate_tree(task_tags: &[Tag], children: &[Condition], quorum: Quorum) -> Tri {
    if vetoed(task_tags, children) {
        return Tri::No;
    }

    let operands = children.iter().filter(|c| !c.is_excluding()).count();
    if operands == 0 {
        return Tri::Unknown;
    }

    let mut counter = Counter::default();
    for child in children.iter().filter(|c| !c.is_excluding()) {
        let result = child.evaluate(task_tags);
        if quorum == Quorum::All && result == Tri::No {
            return Tri::No;
        }
        counter.add(result);
    }

    match quorum {
        Quorum::All if counter.yes == operands => Tri::Yes,
        Quorum::All => Tri::Unknown,
        Quorum::AtLeast(n) => counter.verdict(n.get()),
    }
}

fn evaluate_priority(task_tags: &[Tag], children: &[Condition]) -> Tri {
    if vetoed(task_tags, children) {
        return Tri::No;
    }

    let mut best = f64::NEG_INFINITY;
    let mut result = Tri::Unknown;

    for child in children.iter().filter(|c| !c.is_excluding()) {
        let band = child.band_priority();
        if band > best {
            let child_result = child.evaluate(task_tags);
            if child_result.is_decided() {
                result = child_result;
                best = band;
            }
        } else if band == best && child.evaluate(task_tags) == Tri::No {
            result = Tri::No;
        }
    }

    result
}

/// `true` if any excluding child evaluates `Yes`.
fn vetoed(task_tags: &[Tag], children: &[Condition]) -> bool {
    children
        .iter()
        .filter(|c| c.is_excluding())
        .any(|c| c.evaluate(task_tags) == Tri::Yes)
}

#[derive(Default)]
struct Counter {
    yes: usize,
    decided: usize,
}

impl Counter {
    fn add(&mut self, result: Tri) {
        if result == Tri::Yes {
            self.yes += 1;
        }
        if result.is_decided() {
            self.decided += 1;
        }
    }

    fn verdict(&self, required: usize) -> Tri {
        if self.decided < required {
            Tri::Unknown
        } else {
            Tri::from(self.yes >= required)
        }
    }
}
