//! Numeric sibling filters (sector / device)
//!
//! A filter pins one hierarchy level to a set of integers. A group at that
//! level passes when the last run of digits in its name is in the set:
//! `SR03` → 3, `MC-01` → 1, `Q2B` → 2. A name without digits never passes
//! an active filter.

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use regex::Regex;

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\D*$").unwrap());

/// Number embedded in a sibling name, if any
pub fn numeric_token(name: &str) -> Option<u32> {
    NUMBER_RE
        .captures(name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Per-level integer filters applied during address builds
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    by_level: HashMap<String, BTreeSet<u32>>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict `level` to the given numbers. Repeated calls for one level
    /// intersect.
    pub fn restrict(mut self, level: impl Into<String>, values: &[u32]) -> Self {
        let values: BTreeSet<u32> = values.iter().copied().collect();
        self.by_level
            .entry(level.into())
            .and_modify(|existing| existing.retain(|v| values.contains(v)))
            .or_insert(values);
        self
    }

    /// Whether a group named `name` at `level` may be expanded
    pub fn allows(&self, level: &str, name: &str) -> bool {
        match self.by_level.get(level) {
            None => true,
            Some(allowed) => numeric_token(name).is_some_and(|n| allowed.contains(&n)),
        }
    }

    pub fn levels(&self) -> impl Iterator<Item = &str> {
        self.by_level.keys().map(|l| l.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.by_level.is_empty()
    }
}
