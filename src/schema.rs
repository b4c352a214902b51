//! Hierarchy schema: the ordered levels of the addressing scheme
//!
//! The last level is the terminal level, the rank whose values name signals.
//! Which nodes are signals is decided by node kind, not by depth: a signal may
//! sit directly under any node whose following levels are all optional.

use channel_types::HierarchyLevel;
use serde::Deserialize;

use crate::error::{SchemaError, SchemaResult};

pub const DEFAULT_SEPARATOR: &str = ":";
pub const DEFAULT_SUFFIX_SEPARATOR: &str = "_";

/// Serialized form of the `hierarchy` block of a definition
#[derive(Debug, Clone, Deserialize)]
pub struct HierarchyDef {
    pub levels: Vec<HierarchyLevel>,
    #[serde(default = "default_separator")]
    pub separator: String,
    #[serde(default = "default_suffix_separator")]
    pub suffix_separator: String,
}

fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}

fn default_suffix_separator() -> String {
    DEFAULT_SUFFIX_SEPARATOR.to_string()
}

/// Immutable, validated hierarchy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchySchema {
    levels: Vec<HierarchyLevel>,
    separator: String,
    suffix_separator: String,
}

impl HierarchySchema {
    /// Schema with the default `:` level separator and `_` suffix separator
    pub fn new(levels: Vec<HierarchyLevel>) -> SchemaResult<Self> {
        Self::with_separators(levels, DEFAULT_SEPARATOR, DEFAULT_SUFFIX_SEPARATOR)
    }

    pub fn with_separators(
        levels: Vec<HierarchyLevel>,
        separator: impl Into<String>,
        suffix_separator: impl Into<String>,
    ) -> SchemaResult<Self> {
        let separator = separator.into();
        let suffix_separator = suffix_separator.into();

        let Some(terminal) = levels.last() else {
            return Err(SchemaError::EmptyHierarchy);
        };
        if terminal.optional {
            return Err(SchemaError::OptionalTerminalLevel(terminal.name.clone()));
        }
        for (i, level) in levels.iter().enumerate() {
            if level.name.is_empty() {
                return Err(SchemaError::EmptyLevelName);
            }
            if levels[..i].iter().any(|l| l.name == level.name) {
                return Err(SchemaError::DuplicateLevel(level.name.clone()));
            }
        }
        if separator.is_empty() {
            return Err(SchemaError::InvalidSeparator(separator));
        }
        if suffix_separator.is_empty() || suffix_separator == separator {
            return Err(SchemaError::InvalidSeparator(suffix_separator));
        }

        Ok(Self {
            levels,
            separator,
            suffix_separator,
        })
    }

    pub fn from_def(def: HierarchyDef) -> SchemaResult<Self> {
        Self::with_separators(def.levels, def.separator, def.suffix_separator)
    }

    pub fn levels(&self) -> &[HierarchyLevel] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn level(&self, idx: usize) -> Option<&HierarchyLevel> {
        self.levels.get(idx)
    }

    /// Position of a level by name
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.levels.iter().position(|l| l.name == name)
    }

    pub fn terminal_index(&self) -> usize {
        self.levels.len() - 1
    }

    pub fn terminal_level(&self) -> &HierarchyLevel {
        &self.levels[self.terminal_index()]
    }

    pub fn is_terminal_level(&self, idx: usize) -> bool {
        idx == self.terminal_index()
    }

    /// First required level in `from..to`, if any
    pub fn first_required_between(&self, from: usize, to: usize) -> Option<&HierarchyLevel> {
        self.levels
            .get(from..to)
            .and_then(|range| range.iter().find(|l| !l.optional))
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    pub fn suffix_separator(&self) -> &str {
        &self.suffix_separator
    }

    /// Join address segments, dropping empty ones so that skipped optional
    /// levels never leave a doubled or trailing separator
    pub fn join<S: AsRef<str>>(&self, segments: &[S]) -> String {
        segments
            .iter()
            .map(|s| s.as_ref())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(&self.separator)
    }

    /// Base address plus one suffix variant
    pub fn with_suffix(&self, base: &str, suffix: &str) -> String {
        format!("{}{}{}", base, self.suffix_separator, suffix)
    }

    /// True if the address has no empty segment (doubled, leading or
    /// trailing separator)
    pub fn is_clean(&self, address: &str) -> bool {
        !address.is_empty() && address.split(self.separator.as_str()).all(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn levels() -> Vec<HierarchyLevel> {
        vec![
            HierarchyLevel::required("system"),
            HierarchyLevel::required("device"),
            HierarchyLevel::optional("subdevice"),
            HierarchyLevel::required("signal"),
        ]
    }

    #[test]
    fn test_terminal_level_is_last() {
        let schema = HierarchySchema::new(levels()).unwrap();
        assert_eq!(schema.terminal_level().name, "signal");
        assert_eq!(schema.terminal_index(), 3);
        assert_eq!(schema.index_of("subdevice"), Some(2));
        assert_eq!(schema.index_of("nope"), None);
    }

    #[test]
    fn test_rejects_optional_terminal() {
        let mut lv = levels();
        lv.push(HierarchyLevel::optional("suffix"));
        assert!(matches!(
            HierarchySchema::new(lv),
            Err(SchemaError::OptionalTerminalLevel(name)) if name == "suffix"
        ));
    }

    #[test]
    fn test_rejects_duplicates_and_empty() {
        assert!(matches!(
            HierarchySchema::new(vec![]),
            Err(SchemaError::EmptyHierarchy)
        ));
        let dup = vec![
            HierarchyLevel::required("a"),
            HierarchyLevel::required("a"),
        ];
        assert!(matches!(
            HierarchySchema::new(dup),
            Err(SchemaError::DuplicateLevel(_))
        ));
    }

    #[test]
    fn test_rejects_same_separators() {
        let result = HierarchySchema::with_separators(levels(), ":", ":");
        assert!(matches!(result, Err(SchemaError::InvalidSeparator(_))));
    }

    #[test]
    fn test_join_skips_empty_segments() {
        let schema = HierarchySchema::new(levels()).unwrap();
        let joined = schema.join(&["CTRL", "MC-01", "", "Heartbeat"]);
        assert_eq!(joined, "CTRL:MC-01:Heartbeat");
        assert!(schema.is_clean(&joined));
        assert!(!schema.is_clean("CTRL::Heartbeat"));
        assert!(!schema.is_clean("CTRL:"));
        assert_eq!(schema.with_suffix("A:Mode", "RB"), "A:Mode_RB");
    }

    #[test]
    fn test_first_required_between() {
        let schema = HierarchySchema::new(levels()).unwrap();
        assert_eq!(schema.first_required_between(2, 3), None);
        assert_eq!(
            schema.first_required_between(1, 3).map(|l| l.name.as_str()),
            Some("device")
        );
    }
}
