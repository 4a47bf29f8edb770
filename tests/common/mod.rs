#![allow(dead_code)]

pub use tagdriver_test_utils::{init_tracing, with_timeout};

use tagdriver::filter::Tag;

/// Plain task tags (priority 0, no duration).
pub fn tags(names: &[&str]) -> Vec<Tag> {
    names.iter().map(|n| Tag::named(*n)).collect()
}

/// Names from `candidates` accepted by `filter`, in order.
pub fn accepted<'a>(
    filter: &tagdriver::filter::CompiledFilter,
    candidates: &[(&'a str, Vec<Tag>)],
) -> Vec<&'a str> {
    candidates
        .iter()
        .filter(|(_, t)| filter.accepts(t))
        .map(|(name, _)| *name)
        .collect()
}
