//! Tree nodes and the arena that owns them
//!
//! A node is either a `Group` or a `Terminal`, never both. Consumers match
//! on `Node` exhaustively.

use std::collections::HashMap;

use channel_types::NodeKind;

/// Handle into the tree arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) fn new(idx: usize) -> Self {
        Self(idx)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

/// Grouping node: named children in document order
#[derive(Debug, Clone, Default)]
pub struct GroupNode {
    pub description: Option<String>,
    children: Vec<NodeId>,
    by_name: HashMap<String, NodeId>,
}

impl GroupNode {
    pub fn new(description: Option<String>) -> Self {
        Self {
            description,
            children: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Add a child; returns false if the name is already taken
    pub(crate) fn add_child(&mut self, name: &str, id: NodeId) -> bool {
        if self.by_name.contains_key(name) {
            return false;
        }
        self.by_name.insert(name.to_string(), id);
        self.children.push(id);
        true
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn child(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// Signal node: one base address plus suffix variants
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalNode {
    /// Address segment template; `{name}` expands to the node's name
    pub address_template: String,
    pub suffixes: Vec<String>,
    pub description: Option<String>,
    /// Whether the bare base address is itself a channel
    pub include_base: bool,
}

impl TerminalNode {
    pub const NAME_PLACEHOLDER: &'static str = "{name}";

    pub fn new(address_template: impl Into<String>) -> Self {
        Self {
            address_template: address_template.into(),
            suffixes: Vec::new(),
            description: None,
            include_base: true,
        }
    }

    /// Address segment this signal contributes under the given node name
    pub fn render_segment(&self, name: &str) -> String {
        self.address_template.replace(Self::NAME_PLACEHOLDER, name)
    }
}

#[derive(Debug, Clone)]
pub enum Node {
    Group(GroupNode),
    Terminal(TerminalNode),
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Group(_) => NodeKind::Group,
            Node::Terminal(_) => NodeKind::Terminal,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Node::Group(g) => g.description.as_deref(),
            Node::Terminal(t) => t.description.as_deref(),
        }
    }

    pub fn as_group(&self) -> Option<&GroupNode> {
        match self {
            Node::Group(g) => Some(g),
            Node::Terminal(_) => None,
        }
    }

    pub fn as_terminal(&self) -> Option<&TerminalNode> {
        match self {
            Node::Group(_) => None,
            Node::Terminal(t) => Some(t),
        }
    }
}

/// Arena slot: the node plus its position in the hierarchy
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub name: String,
    pub parent: Option<NodeId>,
    /// Schema level this node occupies; `None` for the root
    pub level: Option<usize>,
    pub node: Node,
}

/// Immutable tree of groups and terminals
#[derive(Debug, Clone)]
pub struct ChannelTree {
    nodes: Vec<TreeNode>,
}

impl ChannelTree {
    pub(crate) fn from_nodes(nodes: Vec<TreeNode>) -> Self {
        debug_assert!(!nodes.is_empty(), "arena always holds the root");
        Self { nodes }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn get(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0]
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0].node
    }

    pub fn name(&self, id: NodeId) -> &str {
        &self.nodes[id.0].name
    }

    /// True iff the node is a Terminal
    pub fn is_leaf(&self, id: NodeId) -> bool {
        matches!(self.node(id), Node::Terminal(_))
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.node(id).kind()
    }

    /// Direct children in document order (empty for terminals)
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.node(id) {
            Node::Group(g) => g.children(),
            Node::Terminal(_) => &[],
        }
    }

    pub fn child(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.node(id).as_group().and_then(|g| g.child(name))
    }

    pub fn child_names(&self, id: NodeId) -> Vec<String> {
        self.children(id)
            .iter()
            .map(|c| self.name(*c).to_string())
            .collect()
    }

    /// Names from the root (exclusive) down to `id` (inclusive)
    pub fn path_names(&self, id: NodeId) -> Vec<&str> {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(cur) = current {
            let entry = self.get(cur);
            if entry.parent.is_some() {
                names.push(entry.name.as_str());
            }
            current = entry.parent;
        }
        names.reverse();
        names
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    /// All node ids, root first, in arena order
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn terminal_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n.node, Node::Terminal(_)))
            .count()
    }
}
