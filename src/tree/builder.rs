//! Tree builder - classifies a raw JSON definition into groups and terminals
//!
//! Classification rule, applied to every entry independently:
//! - an object with `address` (or a bare string) is a Terminal
//! - an object with `children` and/or `instances` is a Group
//! - anything else is a `SchemaError`
//!
//! Placement is checked while building: groups occupy consecutive levels,
//! terminals always occupy the terminal level and may only skip optional
//! levels on the way there.

use serde_json::{Map, Value};
use tracing::debug;

use super::instances::InstanceSpec;
use super::node::{ChannelTree, GroupNode, Node, NodeId, TerminalNode, TreeNode};
use crate::error::{SchemaError, SchemaResult};
use crate::schema::HierarchySchema;

const TERMINAL_KEYS: &[&str] = &["address", "suffixes", "description", "include_base"];
const GROUP_KEYS: &[&str] = &["children", "instances", "description"];

/// Arena builder; consumed by `build`
pub struct TreeBuilder<'a> {
    schema: &'a HierarchySchema,
    nodes: Vec<TreeNode>,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(schema: &'a HierarchySchema) -> Self {
        let root = TreeNode {
            name: String::new(),
            parent: None,
            level: None,
            node: Node::Group(GroupNode::new(None)),
        };
        Self {
            schema,
            nodes: vec![root],
        }
    }

    /// Build the tree from the `tree` block of a definition: a mapping of
    /// first-level names to entries
    pub fn build(mut self, tree: &Value) -> SchemaResult<ChannelTree> {
        let Value::Object(entries) = tree else {
            return Err(SchemaError::MalformedEntry {
                path: "<root>".to_string(),
                reason: "tree must be an object mapping names to entries".to_string(),
            });
        };

        let root = NodeId::new(0);
        self.add_children(root, entries, 0, "")?;

        let tree = ChannelTree::from_nodes(self.nodes);
        debug!(
            nodes = tree.len(),
            terminals = tree.terminal_count(),
            "Tree built"
        );
        Ok(tree)
    }

    fn add_children(
        &mut self,
        parent: NodeId,
        entries: &Map<String, Value>,
        level: usize,
        parent_path: &str,
    ) -> SchemaResult<()> {
        for (name, value) in entries {
            self.add_entry(parent, name, value, level, parent_path)?;
        }
        Ok(())
    }

    fn add_entry(
        &mut self,
        parent: NodeId,
        name: &str,
        value: &Value,
        level: usize,
        parent_path: &str,
    ) -> SchemaResult<NodeId> {
        let path = child_path(parent_path, name);
        if name.is_empty() {
            return Err(SchemaError::MalformedEntry {
                path,
                reason: "entry name must not be empty".to_string(),
            });
        }

        match value {
            Value::String(template) => {
                let terminal = TerminalNode::new(template.clone());
                self.add_terminal(parent, name, terminal, level, &path)
            }
            Value::Object(map) if map.contains_key("address") => {
                if map.contains_key("children") || map.contains_key("instances") {
                    return Err(SchemaError::AmbiguousEntry { path });
                }
                let terminal = parse_terminal(map, &path)?;
                self.add_terminal(parent, name, terminal, level, &path)
            }
            Value::Object(map) if map.contains_key("children") || map.contains_key("instances") => {
                self.add_group(parent, name, map, level, &path)
            }
            Value::Object(_) => Err(SchemaError::MalformedEntry {
                path,
                reason: "expected 'address' for a signal or 'children'/'instances' for a group"
                    .to_string(),
            }),
            other => Err(SchemaError::MalformedEntry {
                path,
                reason: format!("expected an object or string, found {}", json_type(other)),
            }),
        }
    }

    fn add_terminal(
        &mut self,
        parent: NodeId,
        name: &str,
        terminal: TerminalNode,
        level: usize,
        path: &str,
    ) -> SchemaResult<NodeId> {
        let terminal_idx = self.schema.terminal_index();
        if level > terminal_idx {
            return Err(SchemaError::MalformedEntry {
                path: path.to_string(),
                reason: "signal nested below the terminal level".to_string(),
            });
        }
        if let Some(skipped) = self.schema.first_required_between(level, terminal_idx) {
            return Err(SchemaError::MisplacedTerminal {
                path: path.to_string(),
                level: skipped.name.clone(),
            });
        }

        let segment = terminal.render_segment(name);
        if !self.schema.is_clean(&segment) {
            return Err(SchemaError::InvalidAddress {
                path: path.to_string(),
                segment,
            });
        }
        if terminal.suffixes.iter().any(|s| s.is_empty()) {
            return Err(SchemaError::EmptySuffix {
                path: path.to_string(),
            });
        }
        if !terminal.include_base && terminal.suffixes.is_empty() {
            return Err(SchemaError::NoAddresses {
                path: path.to_string(),
            });
        }

        self.push(parent, name, Some(terminal_idx), Node::Terminal(terminal), path)
    }

    fn add_group(
        &mut self,
        parent: NodeId,
        name: &str,
        map: &Map<String, Value>,
        level: usize,
        path: &str,
    ) -> SchemaResult<NodeId> {
        if level >= self.schema.terminal_index() {
            return Err(SchemaError::GroupTooDeep {
                path: path.to_string(),
                terminal_level: self.schema.terminal_level().name.clone(),
            });
        }
        if name.contains(self.schema.separator()) || !self.schema.is_clean(name) {
            return Err(SchemaError::InvalidAddress {
                path: path.to_string(),
                segment: name.to_string(),
            });
        }
        check_keys(map, GROUP_KEYS, path)?;

        let description = optional_string(map, "description", path)?;
        let id = self.push(
            parent,
            name,
            Some(level),
            Node::Group(GroupNode::new(description)),
            path,
        )?;

        // Document order decides whether explicit children or instances come first
        for (key, value) in map {
            match key.as_str() {
                "children" => {
                    let Value::Object(children) = value else {
                        return Err(SchemaError::MalformedEntry {
                            path: path.to_string(),
                            reason: "'children' must be an object".to_string(),
                        });
                    };
                    self.add_children(id, children, level + 1, path)?;
                }
                "instances" => self.add_instances(id, value, level + 1, path)?,
                _ => {}
            }
        }

        Ok(id)
    }

    /// Expand an `instances` block into sibling groups under `parent`
    fn add_instances(
        &mut self,
        parent: NodeId,
        value: &Value,
        level: usize,
        parent_path: &str,
    ) -> SchemaResult<()> {
        let invalid = |reason: String| SchemaError::InvalidInstances {
            path: parent_path.to_string(),
            reason,
        };

        let Value::Array(specs) = value else {
            return Err(invalid("'instances' must be an array".to_string()));
        };

        for spec in specs {
            let spec: InstanceSpec =
                serde_json::from_value(spec.clone()).map_err(|e| invalid(e.to_string()))?;
            let names = spec.expand().map_err(invalid)?;

            let mut group = Map::new();
            if let Some(description) = &spec.description {
                group.insert("description".to_string(), Value::String(description.clone()));
            }
            if let Some(children) = &spec.children {
                group.insert("children".to_string(), children.clone());
            }
            if let Some(nested) = &spec.instances {
                group.insert("instances".to_string(), nested.clone());
            }
            if !group.contains_key("children") && !group.contains_key("instances") {
                group.insert("children".to_string(), Value::Object(Map::new()));
            }

            for name in names {
                let path = child_path(parent_path, &name);
                self.add_group(parent, &name, &group, level, &path)?;
            }
        }

        Ok(())
    }

    fn push(
        &mut self,
        parent: NodeId,
        name: &str,
        level: Option<usize>,
        node: Node,
        path: &str,
    ) -> SchemaResult<NodeId> {
        let id = NodeId::new(self.nodes.len());
        let Node::Group(group) = &mut self.nodes[parent.index()].node else {
            return Err(SchemaError::MalformedEntry {
                path: path.to_string(),
                reason: "parent is a signal".to_string(),
            });
        };
        if !group.add_child(name, id) {
            let parent_path = path
                .rsplit_once('/')
                .map(|(p, _)| p.to_string())
                .unwrap_or_else(|| "<root>".to_string());
            return Err(SchemaError::DuplicateChild {
                path: parent_path,
                name: name.to_string(),
            });
        }
        self.nodes.push(TreeNode {
            name: name.to_string(),
            parent: Some(parent),
            level,
            node,
        });
        Ok(id)
    }
}

fn parse_terminal(map: &Map<String, Value>, path: &str) -> SchemaResult<TerminalNode> {
    check_keys(map, TERMINAL_KEYS, path)?;

    let address_template = match map.get("address") {
        Some(Value::String(s)) => s.clone(),
        _ => {
            return Err(SchemaError::MalformedEntry {
                path: path.to_string(),
                reason: "'address' must be a string".to_string(),
            })
        }
    };

    let suffixes = match map.get("suffixes") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                _ => Err(SchemaError::MalformedEntry {
                    path: path.to_string(),
                    reason: "'suffixes' must contain only strings".to_string(),
                }),
            })
            .collect::<SchemaResult<Vec<_>>>()?,
        Some(_) => {
            return Err(SchemaError::MalformedEntry {
                path: path.to_string(),
                reason: "'suffixes' must be an array".to_string(),
            })
        }
    };

    let include_base = match map.get("include_base") {
        None => true,
        Some(Value::Bool(b)) => *b,
        Some(_) => {
            return Err(SchemaError::MalformedEntry {
                path: path.to_string(),
                reason: "'include_base' must be a boolean".to_string(),
            })
        }
    };

    Ok(TerminalNode {
        address_template,
        suffixes,
        description: optional_string(map, "description", path)?,
        include_base,
    })
}

fn check_keys(map: &Map<String, Value>, allowed: &[&str], path: &str) -> SchemaResult<()> {
    match map.keys().find(|k| !allowed.contains(&k.as_str())) {
        Some(key) => Err(SchemaError::MalformedEntry {
            path: path.to_string(),
            reason: format!("unexpected key '{}' (allowed: {})", key, allowed.join(", ")),
        }),
        None => Ok(()),
    }
}

fn optional_string(
    map: &Map<String, Value>,
    key: &str,
    path: &str,
) -> SchemaResult<Option<String>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(SchemaError::MalformedEntry {
            path: path.to_string(),
            reason: format!("'{}' must be a string", key),
        }),
    }
}

fn child_path(parent_path: &str, name: &str) -> String {
    if parent_path.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent_path, name)
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
