//! Channel Types - Level 1 Foundation Types
//!
//! Pure data structures exchanged between the addressing engine and the
//! layers that call it (agent tools, CLI, tests).
//!
//! ## Contents
//!
//! - Hierarchy levels and node kinds
//! - Caller selections (level → value)
//! - Navigation results (options, inspected children)
//! - Channel records and aggregate statistics
//!
//! ## Rules
//!
//! 1. **NO ENGINE LOGIC** - Only data structures, constructors and accessors
//! 2. **NO WORKSPACE DEPENDENCIES**
//! 3. **SERIALIZABLE** - Every type supports serde
//! 4. **THREAD SAFE** - Every type is Send + Sync

use serde::{Deserialize, Serialize};

// ============================================================================
// HIERARCHY
// ============================================================================

/// One named rank in the addressing scheme (system, family, field, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyLevel {
    pub name: String,
    /// Optional levels may be skipped by branches that have no content there
    #[serde(default)]
    pub optional: bool,
}

impl HierarchyLevel {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            optional: false,
        }
    }

    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            optional: true,
        }
    }
}

/// Structural kind of a tree node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Named collection of further children
    Group,
    /// Concrete signal (plus its suffix variants)
    Terminal,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Group => "group",
            NodeKind::Terminal => "terminal",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SELECTIONS
// ============================================================================

/// Selection value that fans out across every eligible child of a level
pub const WILDCARD: &str = "*";

/// Caller-supplied partial assignment of values to hierarchy levels.
///
/// Insertion order is kept for display only; lookups are by level name.
/// A level supplied as an empty string reads exactly like an absent level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selections {
    entries: Vec<(String, String)>,
}

impl Selections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, level: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(level, value);
        self
    }

    /// Set (or replace) the value for a level
    pub fn set(&mut self, level: impl Into<String>, value: impl Into<String>) {
        let level = level.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(l, _)| *l == level) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((level, value)),
        }
    }

    /// Remove a level, returning its previous value
    pub fn remove(&mut self, level: &str) -> Option<String> {
        let pos = self.entries.iter().position(|(l, _)| l == level)?;
        Some(self.entries.remove(pos).1)
    }

    /// Non-empty value for a level
    pub fn get(&self, level: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(l, _)| l == level)
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.is_empty())
    }

    /// Whether the level carries a non-empty value
    pub fn has(&self, level: &str) -> bool {
        self.get(level).is_some()
    }

    /// Iterate over all entries, including empty ones
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(l, v)| (l.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Selections {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut selections = Selections::new();
        for (level, value) in iter {
            selections.set(level, value);
        }
        selections
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for Selections {
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

// ============================================================================
// NAVIGATION RESULTS
// ============================================================================

/// A selectable value at some hierarchy level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildOption {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A child as seen by `inspect`: name plus explicit node kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectedChild {
    pub name: String,
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ============================================================================
// CHANNEL RECORDS
// ============================================================================

/// One (level, value) step of the path leading to a channel
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LevelValue {
    pub level: String,
    pub value: String,
}

impl LevelValue {
    pub fn new(level: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            value: value.into(),
        }
    }
}

/// A concrete, addressable channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRecord {
    /// Fully-qualified address string
    pub address: String,
    /// Levels actually traversed (skipped optional levels are absent)
    pub level_path: Vec<LevelValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Suffix variant this record represents, `None` for the base address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
}

impl ChannelRecord {
    /// Value chosen for a level along this channel's path
    pub fn value_at(&self, level: &str) -> Option<&str> {
        self.level_path
            .iter()
            .find(|lv| lv.level == level)
            .map(|lv| lv.value.as_str())
    }

    /// Selections that reproduce this channel through the builder
    pub fn to_selections(&self) -> Selections {
        self.level_path
            .iter()
            .map(|lv| (lv.level.clone(), lv.value.clone()))
            .collect()
    }
}

// ============================================================================
// STATISTICS
// ============================================================================

/// Number of distinct values observed at one level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCount {
    pub level: String,
    pub count: usize,
}

/// Aggregate counts derived from the channel index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelStatistics {
    pub total_channels: usize,
    /// Terminal nodes (signals) regardless of suffix expansion
    pub terminal_count: usize,
    /// Channels that are suffix variants of a base signal
    pub suffixed_channels: usize,
    /// Schema-ordered distinct value counts
    pub counts_per_level: Vec<LevelCount>,
}

impl ChannelStatistics {
    pub fn count_for(&self, level: &str) -> Option<usize> {
        self.counts_per_level
            .iter()
            .find(|c| c.level == level)
            .map(|c| c.count)
    }
}
