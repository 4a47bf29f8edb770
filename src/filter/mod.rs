// src/filter/mod.rs

//! Tag-based task filtering.
//!
//! - [`tri`] holds the three-valued logic type.
//! - [`tag`] defines tags and the single-tag matching rule.
//! - [`condition`] is the condition tree model; [`evaluate`] walks it.
//! - [`parser`] compiles filter expressions such as `"fast -slow <10 io"`.
//! - [`task_filter`] combines a compiled expression with the general
//!   priority gate.

pub mod condition;
pub mod evaluate;
pub mod parser;
pub mod tag;
pub mod task_filter;
pub mod tri;

pub use condition::{Condition, ConditionKind, Quorum};
pub use parser::{CompiledFilter, Token, compile, tokenize};
pub use tag::{Tag, tag_satisfies};
pub use task_filter::TaskFilter;
pub use tri::Tri;
