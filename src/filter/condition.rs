// src/filter/condition.rs

//! Condition tree model.
//!
//! A [`Condition`] is an immutable tree. Leaves match tags directly against
//! a task, inner nodes combine the results of their children. Every node
//! carries three modifiers:
//!
//! - `reversed`: flips `Yes`/`No` of the node's own result (`Unknown` stays).
//! - `excluding`: only meaningful for a child of a tree/priority node. If the
//!   child evaluates `Yes`, the parent evaluates `No` regardless of the
//!   other children.
//! - `band_priority`: only meaningful for a child of a priority node.

use std::num::NonZeroUsize;

use crate::errors::FilterError;
use crate::filter::tag::Tag;

/// How many operands of a counted node must be satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quorum {
    /// Every operand.
    All,
    AtLeast(NonZeroUsize),
}

impl Quorum {
    /// `AtLeast(count)`; a zero count is a malformed condition.
    pub fn at_least(count: usize) -> Result<Self, FilterError> {
        NonZeroUsize::new(count)
            .map(Quorum::AtLeast)
            .ok_or(FilterError::ZeroQuorum)
    }

    /// Quorum of one ("any").
    pub fn any() -> Self {
        Quorum::AtLeast(NonZeroUsize::MIN)
    }

    /// Number of satisfied operands needed out of `operands`.
    pub fn required(self, operands: usize) -> usize {
        match self {
            Quorum::All => operands,
            Quorum::AtLeast(n) => n.get(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConditionKind {
    /// Leaf: count query tags satisfied by the task.
    Tags { tags: Vec<Tag>, quorum: Quorum },
    /// Count children that evaluate `Yes`.
    Tree {
        children: Vec<Condition>,
        quorum: Quorum,
    },
    /// Highest decidable band wins; ties must agree.
    Priority { children: Vec<Condition> },
    AlwaysTrue,
    AlwaysFalse,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    kind: ConditionKind,
    reversed: bool,
    excluding: bool,
    band_priority: f64,
}

impl Condition {
    fn from_kind(kind: ConditionKind) -> Self {
        Self {
            kind,
            reversed: false,
            excluding: false,
            band_priority: 0.0,
        }
    }

    pub fn tags(tags: Vec<Tag>, quorum: Quorum) -> Self {
        Self::from_kind(ConditionKind::Tags { tags, quorum })
    }

    /// Single-tag leaf.
    pub fn tag(tag: Tag) -> Self {
        Self::tags(vec![tag], Quorum::any())
    }

    pub fn tree(children: Vec<Condition>, quorum: Quorum) -> Self {
        Self::from_kind(ConditionKind::Tree { children, quorum })
    }

    pub fn priority(children: Vec<Condition>) -> Self {
        Self::from_kind(ConditionKind::Priority { children })
    }

    pub fn always_true() -> Self {
        Self::from_kind(ConditionKind::AlwaysTrue)
    }

    pub fn always_false() -> Self {
        Self::from_kind(ConditionKind::AlwaysFalse)
    }

    pub fn reversed(mut self) -> Self {
        self.reversed = !self.reversed;
        self
    }

    pub fn excluding(mut self) -> Self {
        self.excluding = true;
        self
    }

    pub fn with_band_priority(mut self, priority: f64) -> Self {
        self.band_priority = priority;
        self
    }

    pub fn kind(&self) -> &ConditionKind {
        &self.kind
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    pub fn is_excluding(&self) -> bool {
        self.excluding
    }

    pub fn band_priority(&self) -> f64 {
        self.band_priority
    }
}
