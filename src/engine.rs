//! Channel finder facade
//!
//! `ChannelFinder` owns the schema, the tree, the derived index and the
//! statistics. Everything is built in one step and never mutated, so one
//! instance can be shared across threads behind an `Arc`.

use std::path::Path;

use channel_types::{
    ChannelRecord, ChannelStatistics, ChildOption, HierarchyLevel, InspectedChild, NodeKind,
    Selections,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::address::{AddressBuilder, FilterSet};
use crate::config::{ChannelFinderConfig, FilterConfig};
use crate::error::{EngineError, NavigationResult, SchemaError, SchemaResult};
use crate::index::{stats, ChannelIndex};
use crate::navigator::Navigator;
use crate::preview::{self, PreviewOptions, PreviewSource};
use crate::schema::{HierarchyDef, HierarchySchema};
use crate::tree::{ChannelTree, TreeBuilder};

/// Top-level shape of a definition document
#[derive(Debug, Deserialize)]
struct Definition {
    hierarchy: HierarchyDef,
    tree: Value,
}

#[derive(Debug, Clone)]
pub struct ChannelFinder {
    schema: HierarchySchema,
    tree: ChannelTree,
    index: ChannelIndex,
    stats: ChannelStatistics,
    filter_levels: FilterConfig,
}

impl ChannelFinder {
    // ========================================================================
    // CONSTRUCTION
    // ========================================================================

    /// Build from a schema and the raw `tree` object
    pub fn new(schema: HierarchySchema, tree: &Value) -> SchemaResult<Self> {
        let tree = TreeBuilder::new(&schema).build(tree)?;
        let index = ChannelIndex::build(&schema, &tree)?;
        let stats = stats::compute(&schema, &index);

        info!(
            levels = schema.len(),
            nodes = tree.len(),
            channels = index.len(),
            "Channel finder ready"
        );

        Ok(Self {
            schema,
            tree,
            index,
            stats,
            filter_levels: FilterConfig::default(),
        })
    }

    /// Build from a parsed definition document
    pub fn from_value(definition: &Value) -> SchemaResult<Self> {
        let definition = Definition::deserialize(definition)?;
        let schema = HierarchySchema::from_def(definition.hierarchy)?;
        Self::new(schema, &definition.tree)
    }

    pub fn from_json_str(json: &str) -> SchemaResult<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(&value)
    }

    pub fn from_path(path: impl AsRef<Path>) -> SchemaResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.display().to_string(),
            source,
        })?;
        info!(path = %path.display(), "Loading channel definition");
        Self::from_json_str(&content)
    }

    /// Load the definition named by the config and apply its filter levels
    pub fn from_config(config: &ChannelFinderConfig) -> Result<Self, EngineError> {
        let path = config.database_path()?;
        Ok(Self::from_path(path)?.with_filter_levels(config.filters.clone()))
    }

    /// Levels that `build_addresses` sector / device filters apply to
    pub fn with_filter_levels(mut self, filter_levels: FilterConfig) -> Self {
        self.filter_levels = filter_levels;
        self
    }

    // ========================================================================
    // NAVIGATION
    // ========================================================================

    fn navigator(&self) -> Navigator<'_> {
        Navigator::new(&self.schema, &self.tree)
    }

    /// Valid values at `level` for a partial selection
    pub fn list_children(
        &self,
        level: &str,
        selections: &Selections,
    ) -> NavigationResult<Vec<ChildOption>> {
        self.navigator().options_at(level, selections)
    }

    /// All children at the reached position, with their kind
    pub fn inspect(
        &self,
        level: &str,
        selections: &Selections,
    ) -> NavigationResult<Vec<InspectedChild>> {
        self.navigator().inspect(level, selections)
    }

    pub fn classify_siblings(
        &self,
        level: &str,
        selections: &Selections,
        names: &[&str],
    ) -> NavigationResult<Vec<(String, NavigationResult<NodeKind>)>> {
        self.navigator().classify_siblings(level, selections, names)
    }

    // ========================================================================
    // ADDRESS BUILDING
    // ========================================================================

    pub fn build_addresses(
        &self,
        selections: &Selections,
        sector_filter: Option<&[u32]>,
        device_filter: Option<&[u32]>,
    ) -> NavigationResult<Vec<String>> {
        let mut filters = FilterSet::new();
        if let Some(sectors) = sector_filter {
            filters = filters.restrict(self.filter_levels.sector_level.clone(), sectors);
        }
        if let Some(devices) = device_filter {
            filters = filters.restrict(self.filter_levels.device_level.clone(), devices);
        }

        AddressBuilder::new(&self.schema, &self.tree)
            .with_filters(filters)
            .build(selections)
    }

    /// Per-sibling build under one prefix; failures stay per sibling
    pub fn build_siblings(
        &self,
        selections: &Selections,
        names: &[&str],
    ) -> Vec<(String, NavigationResult<Vec<String>>)> {
        AddressBuilder::new(&self.schema, &self.tree).build_siblings(selections, names)
    }

    // ========================================================================
    // LOOKUP
    // ========================================================================

    pub fn validate(&self, address: &str) -> bool {
        self.index.contains(address)
    }

    pub fn get(&self, address: &str) -> Option<&ChannelRecord> {
        self.index.get(address)
    }

    pub fn statistics(&self) -> &ChannelStatistics {
        &self.stats
    }

    /// Every channel in traversal order
    pub fn channels(&self) -> impl Iterator<Item = &ChannelRecord> {
        self.index.iter()
    }

    pub fn preview(&self, options: &PreviewOptions) -> String {
        preview::render(
            &PreviewSource {
                schema: &self.schema,
                tree: &self.tree,
                index: &self.index,
                stats: &self.stats,
            },
            options,
        )
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn schema(&self) -> &HierarchySchema {
        &self.schema
    }

    pub fn levels(&self) -> &[HierarchyLevel] {
        self.schema.levels()
    }

    pub fn tree(&self) -> &ChannelTree {
        &self.tree
    }

    pub fn index(&self) -> &ChannelIndex {
        &self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn definition() -> Value {
        json!({
            "hierarchy": {
                "levels": [
                    {"name": "system"},
                    {"name": "sector"},
                    {"name": "device"},
                    {"name": "signal"}
                ]
            },
            "tree": {
                "SR": {"instances": [{
                    "pattern": "S{:02}",
                    "range": [1, 4],
                    "instances": [{
                        "pattern": "BPM{}",
                        "range": [1, 2],
                        "children": {"X": "{name}", "Y": "{name}"}
                    }]
                }]}
            }
        })
    }

    #[test]
    fn test_engine_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ChannelFinder>();
    }

    #[test]
    fn test_build_with_sector_and_device_filters() {
        let finder = ChannelFinder::from_value(&definition()).unwrap();
        let sel = Selections::from([
            ("system", "SR"),
            ("sector", "*"),
            ("device", "*"),
            ("signal", "X"),
        ]);

        assert_eq!(finder.build_addresses(&sel, None, None).unwrap().len(), 8);

        let filtered = finder
            .build_addresses(&sel, Some(&[2, 4]), Some(&[1]))
            .unwrap();
        assert_eq!(filtered, vec!["SR:S02:BPM1:X", "SR:S04:BPM1:X"]);
    }

    #[test]
    fn test_filter_on_missing_level_is_unknown_level() {
        let finder = ChannelFinder::from_value(&definition())
            .unwrap()
            .with_filter_levels(FilterConfig {
                sector_level: "cell".to_string(),
                device_level: "device".to_string(),
            });
        let sel = Selections::from([
            ("system", "SR"),
            ("sector", "S01"),
            ("device", "BPM1"),
            ("signal", "X"),
        ]);
        assert!(matches!(
            finder.build_addresses(&sel, Some(&[1]), None),
            Err(crate::error::NavigationError::UnknownLevel(level)) if level == "cell"
        ));
    }

    #[test]
    fn test_definition_requires_hierarchy() {
        assert!(matches!(
            ChannelFinder::from_json_str(r#"{"tree": {}}"#),
            Err(SchemaError::Json(_))
        ));
        assert!(matches!(
            ChannelFinder::from_json_str("not json"),
            Err(SchemaError::Json(_))
        ));
        assert!(matches!(
            ChannelFinder::from_path("/nonexistent/db.json"),
            Err(SchemaError::Io { .. })
        ));
    }
}
