// src/filter/parser.rs

//! Compiler for the compact filter language.
//!
//! ```text
//! tokens := token (SEP token)*          SEP := " " | ","
//! token  := "+" NAME | "-" NAME | "<" NUMBER | "?" | "-?" | NAME
//! ```
//!
//! - `NAME` includes tasks tagged `NAME`.
//! - `-NAME` excludes tasks tagged `NAME`; exclusions veto any inclusion.
//! - `+NAME` is a mandatory tag: tasks carrying it are always included, even
//!   when an exclusion matches them. It also acts as a plain inclusion.
//! - `<N` opens a new duration band: tags that follow only match task tags
//!   whose duration is at most `N` (exclusions: more than `N`). Bands further
//!   to the right take priority over earlier ones.
//! - `?` is a wildcard matching any tag name.
//!
//! With no inclusion rule at all, every task that is not excluded runs.

use std::fmt;

use tracing::debug;

use crate::errors::FilterError;
use crate::filter::condition::{Condition, Quorum};
use crate::filter::tag::Tag;
use crate::filter::tri::Tri;

/// A compiled filter expression.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFilter {
    source: String,
    root: Condition,
}

impl CompiledFilter {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn condition(&self) -> &Condition {
        &self.root
    }

    pub fn evaluate(&self, task_tags: &[Tag]) -> Tri {
        self.root.evaluate(task_tags)
    }

    /// `Unknown` means no rule applies to the task, which admits it.
    pub fn accepts(&self, task_tags: &[Tag]) -> bool {
        self.evaluate(task_tags).to_bool(true)
    }
}

impl fmt::Display for CompiledFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl std::str::FromStr for CompiledFilter {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        compile(s)
    }
}

/// One parsed filter token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Include(Option<String>),
    Exclude(Option<String>),
    Mandatory(Option<String>),
    /// Opens a new duration band.
    MaxDuration(f64),
}

/// Split a filter expression into tokens.
pub fn tokenize(input: &str) -> Result<Vec<Token>, FilterError> {
    input
        .split([' ', ','])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_token)
        .collect()
}

fn parse_token(raw: &str) -> Result<Token, FilterError> {
    let empty = || FilterError::EmptyToken {
        token: raw.to_string(),
    };

    if let Some(rest) = raw.strip_prefix('<') {
        if rest.is_empty() {
            return Err(empty());
        }
        let duration: f64 = rest.parse().map_err(|_| FilterError::InvalidDuration {
            token: raw.to_string(),
        })?;
        if duration.is_nan() {
            return Err(FilterError::InvalidDuration {
                token: raw.to_string(),
            });
        }
        return Ok(Token::MaxDuration(duration));
    }

    let name = |rest: &str| -> Result<Option<String>, FilterError> {
        match rest {
            "" => Err(empty()),
            "?" => Ok(None),
            other => Ok(Some(other.to_string())),
        }
    };

    if let Some(rest) = raw.strip_prefix('-') {
        Ok(Token::Exclude(name(rest)?))
    } else if let Some(rest) = raw.strip_prefix('+') {
        Ok(Token::Mandatory(name(rest)?))
    } else {
        Ok(Token::Include(name(raw)?))
    }
}

/// Tags collected for one duration band.
#[derive(Debug, Default)]
struct Band {
    duration: f64,
    mandatory: Vec<Tag>,
    positive: Vec<Tag>,
    negative: Vec<Tag>,
}

impl Band {
    fn new(duration: f64) -> Self {
        Self {
            duration,
            ..Self::default()
        }
    }

    fn query(&self, name: Option<String>, max_duration: bool) -> Tag {
        Tag {
            name,
            priority: f64::NEG_INFINITY,
            duration: self.duration,
            max_duration,
        }
    }
}

/// Compile a filter expression into a condition tree.
pub fn compile(input: &str) -> Result<CompiledFilter, FilterError> {
    let tokens = tokenize(input)?;
    let bands = collect_bands(tokens);

    let mut mandatory = Vec::new();
    let mut positive = Vec::new();
    let mut negative = Vec::new();

    for (index, band) in bands.into_iter().enumerate() {
        let priority = index as f64;

        if !band.mandatory.is_empty() {
            mandatory.push(Condition::tags(band.mandatory, Quorum::All).excluding());
        }
        if !band.positive.is_empty() {
            let leaves = band.positive.into_iter().map(Condition::tag).collect();
            positive.push(Condition::tree(leaves, Quorum::any()).with_band_priority(priority));
        }
        if !band.negative.is_empty() {
            let leaves = band.negative.into_iter().map(Condition::tag).collect();
            negative.push(
                Condition::tree(leaves, Quorum::any())
                    .with_band_priority(priority)
                    .excluding(),
            );
        }
    }

    // Yes when a mandatory tag matches, Unknown otherwise: every mandatory
    // leaf is an excluding child, so a match vetoes the tree to No, which
    // the reversal turns into Yes.
    let mandatory = Condition::tree(mandatory, Quorum::any()).reversed();

    // Same trick: any matching exclusion band makes this Yes, and as an
    // excluding child it then vetoes the banded section.
    let negative = Condition::priority(negative).reversed().excluding();
    let positive = Condition::priority(positive);
    let banded = Condition::tree(vec![positive, negative], Quorum::any());

    let root = Condition::tree(vec![mandatory, banded], Quorum::any());

    Ok(CompiledFilter {
        source: input.trim().to_string(),
        root,
    })
}

fn collect_bands(tokens: Vec<Token>) -> Vec<Band> {
    let mut bands = vec![Band::new(-1.0)];

    for token in tokens {
        // `bands` is never empty.
        let Some(band) = bands.last_mut() else {
            continue;
        };

        match token {
            Token::MaxDuration(duration) => {
                debug!("test with duration <= '{duration}'");
                bands.push(Band::new(duration));
            }
            Token::Exclude(name) => {
                debug!("test without tag '{}'", display_name(&name));
                let tag = band.query(name, false);
                band.negative.push(tag);
            }
            Token::Mandatory(name) => {
                debug!("test with mandatory tag '{}'", display_name(&name));
                let tag = band.query(name, true);
                band.mandatory.push(tag.clone());
                band.positive.push(tag);
            }
            Token::Include(name) => {
                debug!("test with tag '{}'", display_name(&name));
                let tag = band.query(name, true);
                band.positive.push(tag);
            }
        }
    }

    bands
}

fn display_name(name: &Option<String>) -> &str {
    name.as_deref().unwrap_or("<all tags>")
}
