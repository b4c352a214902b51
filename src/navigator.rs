//! Navigator - level-by-level discovery of valid selection values
//!
//! Walks the tree consuming one selection per level. An absent optional
//! level does not descend: the walk stays put, which is how a signal that
//! skips the level becomes reachable from its parent.
//!
//! At an intermediate target level only groups are offered. A terminal
//! child at that position belongs to the terminal level and was only
//! visible because the target level is optional on this branch.

use channel_types::{ChildOption, InspectedChild, NodeKind, Selections};
use tracing::debug;

use crate::error::{NavigationError, NavigationResult};
use crate::schema::HierarchySchema;
use crate::tree::{ChannelTree, NodeId};

/// Read-only view over schema and tree
#[derive(Debug, Clone, Copy)]
pub struct Navigator<'a> {
    schema: &'a HierarchySchema,
    tree: &'a ChannelTree,
}

impl<'a> Navigator<'a> {
    pub fn new(schema: &'a HierarchySchema, tree: &'a ChannelTree) -> Self {
        Self { schema, tree }
    }

    pub fn level_index(&self, level: &str) -> NavigationResult<usize> {
        self.schema
            .index_of(level)
            .ok_or_else(|| NavigationError::UnknownLevel(level.to_string()))
    }

    /// Node reached after consuming every level before `target`.
    ///
    /// Levels at or after `target` are ignored. The result is a terminal
    /// when an intermediate selection named a signal.
    pub fn navigate_to(&self, target: usize, selections: &Selections) -> NavigationResult<NodeId> {
        let mut current = self.tree.root();

        for idx in 0..target.min(self.schema.len()) {
            let Some(level) = self.schema.level(idx) else {
                break;
            };

            let Some(value) = selections.get(&level.name) else {
                if level.optional {
                    continue;
                }
                return Err(NavigationError::MissingLevel {
                    level: level.name.clone(),
                });
            };

            if self.tree.is_leaf(current) {
                return Err(NavigationError::PastTerminal {
                    level: level.name.clone(),
                    terminal: self.tree.name(current).to_string(),
                });
            }

            // A group only answers for the level it was defined at
            current = self
                .tree
                .child(current, value)
                .filter(|&child| self.tree.is_leaf(child) || self.at_level(child, idx))
                .ok_or_else(|| NavigationError::UnknownValue {
                    level: level.name.clone(),
                    value: value.to_string(),
                    available: self.eligible_names(current, idx),
                })?;
        }

        Ok(current)
    }

    /// Children of `node` that are valid values at level `idx`
    pub fn eligible_children(&self, node: NodeId, idx: usize) -> Vec<NodeId> {
        let terminal_level = self.schema.is_terminal_level(idx);
        self.tree
            .children(node)
            .iter()
            .copied()
            .filter(|&child| terminal_level || self.at_level(child, idx))
            .collect()
    }

    /// Whether `node` sits at level `idx`
    pub fn at_level(&self, node: NodeId, idx: usize) -> bool {
        self.tree.get(node).level == Some(idx)
    }

    fn eligible_names(&self, node: NodeId, idx: usize) -> Vec<String> {
        self.eligible_children(node, idx)
            .into_iter()
            .map(|c| self.tree.name(c).to_string())
            .collect()
    }

    /// Valid values at `level` given the selections for preceding levels
    pub fn options_at(
        &self,
        level: &str,
        selections: &Selections,
    ) -> NavigationResult<Vec<ChildOption>> {
        let target = self.level_index(level)?;
        let node = self.navigate_to(target, selections)?;

        let options: Vec<ChildOption> = self
            .eligible_children(node, target)
            .into_iter()
            .map(|child| ChildOption {
                name: self.tree.name(child).to_string(),
                description: self.tree.node(child).description().map(str::to_string),
            })
            .collect();

        debug!(level, options = options.len(), "options_at");
        Ok(options)
    }

    /// Every child at the reached position with its node kind
    pub fn inspect(
        &self,
        level: &str,
        selections: &Selections,
    ) -> NavigationResult<Vec<InspectedChild>> {
        let target = self.level_index(level)?;
        let node = self.navigate_to(target, selections)?;

        Ok(self
            .tree
            .children(node)
            .iter()
            .map(|&child| InspectedChild {
                name: self.tree.name(child).to_string(),
                kind: self.tree.kind(child),
                description: self.tree.node(child).description().map(str::to_string),
            })
            .collect())
    }

    /// Classify several sibling names independently at the reached position
    pub fn classify_siblings(
        &self,
        level: &str,
        selections: &Selections,
        names: &[&str],
    ) -> NavigationResult<Vec<(String, NavigationResult<NodeKind>)>> {
        let target = self.level_index(level)?;
        let node = self.navigate_to(target, selections)?;

        Ok(names
            .iter()
            .map(|&name| {
                let kind = self
                    .tree
                    .child(node, name)
                    .map(|child| self.tree.kind(child))
                    .ok_or_else(|| NavigationError::UnknownValue {
                        level: level.to_string(),
                        value: name.to_string(),
                        available: self.tree.child_names(node),
                    });
                (name.to_string(), kind)
            })
            .collect())
    }
}
