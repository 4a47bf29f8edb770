// src/filter/tri.rs

//! Three-valued logic used by condition evaluation.

use std::ops::Not;

/// Result of evaluating a condition against a task.
///
/// `Unknown` means "this condition has nothing to say about the task" and is
/// kept distinct from an explicit `No` so that nested combinators can tell
/// the two apart. It is only collapsed to a boolean at the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tri {
    Yes,
    No,
    Unknown,
}

impl Tri {
    /// `true` for `Yes` and `No`.
    pub fn is_decided(self) -> bool {
        self != Tri::Unknown
    }

    /// Collapse to a boolean, mapping `Unknown` to `unknown_default`.
    pub fn to_bool(self, unknown_default: bool) -> bool {
        match self {
            Tri::Yes => true,
            Tri::No => false,
            Tri::Unknown => unknown_default,
        }
    }

    /// `Unknown` collapses to `No`.
    pub fn or_no(self) -> Tri {
        match self {
            Tri::Unknown => Tri::No,
            decided => decided,
        }
    }
}

impl Not for Tri {
    type Output = Tri;

    fn not(self) -> Tri {
        match self {
            Tri::Yes => Tri::No,
            Tri::No => Tri::Yes,
            Tri::Unknown => Tri::Unknown,
        }
    }
}

impl From<bool> for Tri {
    fn from(value: bool) -> Self {
        if value { Tri::Yes } else { Tri::No }
    }
}
