//! Channel index: every addressable channel, built by one traversal
//!
//! The index is the single source of truth for "does this address exist".
//! It is derived from the tree at construction and never updated.

use std::collections::HashMap;

use channel_types::{ChannelRecord, LevelValue};
use tracing::info;

use crate::error::{SchemaError, SchemaResult};
use crate::schema::HierarchySchema;
use crate::tree::{ChannelTree, Node, NodeId};

/// Read-only `address → record` map, iterable in traversal order
#[derive(Debug, Clone, Default)]
pub struct ChannelIndex {
    records: HashMap<String, ChannelRecord>,
    order: Vec<String>,
    /// Tree path behind each address; only populated while building
    origins: HashMap<String, String>,
}

impl ChannelIndex {
    /// Depth-first traversal of the whole tree
    pub fn build(schema: &HierarchySchema, tree: &ChannelTree) -> SchemaResult<Self> {
        let mut index = Self::default();
        let mut path = Vec::new();
        let mut segments = Vec::new();
        index.visit(schema, tree, tree.root(), &mut path, &mut segments)?;
        index.origins = HashMap::new();

        info!(
            channels = index.len(),
            terminals = tree.terminal_count(),
            "Channel index built"
        );
        Ok(index)
    }

    fn visit(
        &mut self,
        schema: &HierarchySchema,
        tree: &ChannelTree,
        id: NodeId,
        path: &mut Vec<LevelValue>,
        segments: &mut Vec<String>,
    ) -> SchemaResult<()> {
        for &child in tree.children(id) {
            let entry = tree.get(child);
            let Some(level) = entry.level.and_then(|l| schema.level(l)) else {
                continue;
            };
            path.push(LevelValue::new(level.name.clone(), entry.name.clone()));

            match &entry.node {
                Node::Group(_) => {
                    segments.push(entry.name.clone());
                    self.visit(schema, tree, child, path, segments)?;
                    segments.pop();
                }
                Node::Terminal(terminal) => {
                    segments.push(terminal.render_segment(&entry.name));
                    let base = schema.join(segments.as_slice());
                    let origin = tree.path_names(child).join("/");

                    if terminal.include_base {
                        self.insert(
                            schema,
                            base.clone(),
                            path,
                            terminal.description.clone(),
                            None,
                            &origin,
                        )?;
                    }
                    for suffix in &terminal.suffixes {
                        self.insert(
                            schema,
                            schema.with_suffix(&base, suffix),
                            path,
                            terminal.description.clone(),
                            Some(suffix.clone()),
                            &origin,
                        )?;
                    }
                    segments.pop();
                }
            }

            path.pop();
        }
        Ok(())
    }

    fn insert(
        &mut self,
        schema: &HierarchySchema,
        address: String,
        path: &[LevelValue],
        description: Option<String>,
        suffix: Option<String>,
        origin: &str,
    ) -> SchemaResult<()> {
        if !schema.is_clean(&address) {
            return Err(SchemaError::InvalidAddress {
                path: origin.to_string(),
                segment: address,
            });
        }
        if let Some(first) = self.origins.get(&address) {
            return Err(SchemaError::DuplicateAddress {
                address,
                first: first.clone(),
                second: origin.to_string(),
            });
        }

        self.origins.insert(address.clone(), origin.to_string());
        self.order.push(address.clone());
        self.records.insert(
            address.clone(),
            ChannelRecord {
                address,
                level_path: path.to_vec(),
                description,
                suffix,
            },
        );
        Ok(())
    }

    pub fn contains(&self, address: &str) -> bool {
        self.records.contains_key(address)
    }

    pub fn get(&self, address: &str) -> Option<&ChannelRecord> {
        self.records.get(address)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in traversal order
    pub fn iter(&self) -> impl Iterator<Item = &ChannelRecord> {
        self.order.iter().filter_map(|a| self.records.get(a))
    }

    /// Addresses in traversal order
    pub fn addresses(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|a| a.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TreeBuilder;
    use channel_types::HierarchyLevel;
    use serde_json::json;

    fn schema() -> HierarchySchema {
        HierarchySchema::new(vec![
            HierarchyLevel::required("system"),
            HierarchyLevel::required("device"),
            HierarchyLevel::optional("subdevice"),
            HierarchyLevel::required("signal"),
        ])
        .unwrap()
    }

    fn index_for(tree: serde_json::Value) -> SchemaResult<ChannelIndex> {
        let schema = schema();
        let tree = TreeBuilder::new(&schema).build(&tree)?;
        ChannelIndex::build(&schema, &tree)
    }

    #[test]
    fn test_direct_and_nested_signals() {
        let index = index_for(json!({"SYS": {"children": {"DEV": {"children": {
            "Status": "{name}",
            "PSU": {"children": {"Voltage": "{name}"}}
        }}}}}))
        .unwrap();

        let addresses: Vec<_> = index.addresses().collect();
        assert_eq!(addresses, vec!["SYS:DEV:Status", "SYS:DEV:PSU:Voltage"]);

        let status = index.get("SYS:DEV:Status").unwrap();
        let levels: Vec<_> = status.level_path.iter().map(|lv| lv.level.as_str()).collect();
        assert_eq!(levels, vec!["system", "device", "signal"]);

        let voltage = index.get("SYS:DEV:PSU:Voltage").unwrap();
        assert_eq!(voltage.value_at("subdevice"), Some("PSU"));
    }

    #[test]
    fn test_rejects_suffix_leaving_a_dangling_separator() {
        let err = index_for(json!({"SYS": {"children": {"DEV": {"children": {
            "Mode": {"address": "{name}", "suffixes": ["RB:"]}
        }}}}}))
        .unwrap_err();
        assert!(matches!(
            err,
            SchemaError::InvalidAddress { segment, .. } if segment == "SYS:DEV:Mode_RB:"
        ));
    }

    #[test]
    fn test_suffix_expansion_includes_base() {
        let index = index_for(json!({"SYS": {"children": {"DEV": {"children": {
            "Mode": {"address": "{name}", "suffixes": ["RB", "SP"], "description": "Mode"}
        }}}}}))
        .unwrap();

        let addresses: Vec<_> = index.addresses().collect();
        assert_eq!(addresses, vec!["SYS:DEV:Mode", "SYS:DEV:Mode_RB", "SYS:DEV:Mode_SP"]);
        let rb = index.get("SYS:DEV:Mode_RB").unwrap();
        assert_eq!(rb.suffix.as_deref(), Some("RB"));
        assert_eq!(rb.description.as_deref(), Some("Mode"));
        assert_eq!(rb.value_at("signal"), Some("Mode"));
    }

    #[test]
    fn test_suffix_only_terminal() {
        let index = index_for(json!({"SYS": {"children": {"DEV": {"children": {
            "Pos": {"address": "{name}", "suffixes": ["X", "Y"], "include_base": false}
        }}}}}))
        .unwrap();
        assert!(!index.contains("SYS:DEV:Pos"));
        assert!(index.contains("SYS:DEV:Pos_X"));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_templates_render_addresses() {
        let index = index_for(json!({"SYS": {"children": {"DEV": {"children": {
            "Heartbeat": {"address": "HB"}
        }}}}}))
        .unwrap();
        assert!(index.contains("SYS:DEV:HB"));
        assert_eq!(
            index.get("SYS:DEV:HB").unwrap().value_at("signal"),
            Some("Heartbeat")
        );
    }

    #[test]
    fn test_duplicate_address_is_schema_error() {
        let err = index_for(json!({"SYS": {"children": {"DEV": {"children": {
            "A": {"address": "X"},
            "B": {"address": "X"}
        }}}}}))
        .unwrap_err();
        assert!(matches!(
            err,
            SchemaError::DuplicateAddress { address, .. } if address == "SYS:DEV:X"
        ));
    }
}
