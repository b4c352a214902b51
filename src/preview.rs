//! Plain-text preview of a loaded hierarchy
//!
//! Sections are selected by name (`tree`, `stats`, `breakdown`, `samples`
//! or `all`). `depth` and `max_items` bound the tree; negative values mean
//! unlimited. A focus path (`CTRL:MAIN`) roots the tree and the breakdown
//! at that node.

use std::str::FromStr;

use channel_types::ChannelStatistics;

use crate::config::PreviewConfig;
use crate::index::ChannelIndex;
use crate::schema::HierarchySchema;
use crate::tree::{ChannelTree, Node, NodeId};

const BRANCH: &str = "━━";
const INDENT: &str = "   ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewSection {
    Tree,
    Stats,
    Breakdown,
    Samples,
}

impl PreviewSection {
    pub const ALL: [PreviewSection; 4] = [
        PreviewSection::Tree,
        PreviewSection::Stats,
        PreviewSection::Breakdown,
        PreviewSection::Samples,
    ];
}

impl FromStr for PreviewSection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tree" => Ok(Self::Tree),
            "stats" => Ok(Self::Stats),
            "breakdown" => Ok(Self::Breakdown),
            "samples" => Ok(Self::Samples),
            other => Err(format!("Unknown preview section '{}'", other)),
        }
    }
}

/// Parse a comma separated section list; `all` selects every section
pub fn parse_sections(list: &str) -> Result<Vec<PreviewSection>, String> {
    let mut sections: Vec<PreviewSection> = Vec::new();
    for part in list.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if part.eq_ignore_ascii_case("all") {
            return Ok(PreviewSection::ALL.to_vec());
        }
        let section: PreviewSection = part.parse()?;
        if !sections.contains(&section) {
            sections.push(section);
        }
    }
    if sections.is_empty() {
        return Err("No preview sections selected".to_string());
    }
    Ok(sections)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewOptions {
    pub depth: i32,
    pub max_items: i32,
    pub focus: Option<String>,
    pub sections: Vec<PreviewSection>,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            depth: 3,
            max_items: 10,
            focus: None,
            sections: vec![PreviewSection::Tree],
        }
    }
}

impl PreviewOptions {
    pub fn from_config(config: &PreviewConfig) -> Self {
        Self {
            depth: config.depth,
            max_items: config.max_items,
            ..Self::default()
        }
    }

    /// No depth or item limits
    pub fn full(mut self) -> Self {
        self.depth = -1;
        self.max_items = -1;
        self
    }

    fn depth_limit(&self) -> Option<usize> {
        usize::try_from(self.depth).ok()
    }

    fn item_limit(&self) -> Option<usize> {
        usize::try_from(self.max_items).ok()
    }
}

/// Everything a preview reads
pub struct PreviewSource<'a> {
    pub schema: &'a HierarchySchema,
    pub tree: &'a ChannelTree,
    pub index: &'a ChannelIndex,
    pub stats: &'a ChannelStatistics,
}

pub fn render(source: &PreviewSource<'_>, options: &PreviewOptions) -> String {
    let mut out = Vec::new();
    let focus = resolve_focus(source, options.focus.as_deref());

    header(source, options, &mut out);

    let Some(focus) = focus else {
        out.push(String::new());
        out.push(format!(
            "Focus path '{}' not found",
            options.focus.as_deref().unwrap_or_default()
        ));
        return out.join("\n");
    };

    for section in &options.sections {
        out.push(String::new());
        match section {
            PreviewSection::Tree => tree_section(source, options, focus, &mut out),
            PreviewSection::Stats => stats_section(source, &mut out),
            PreviewSection::Breakdown => breakdown_section(source, focus, &mut out),
            PreviewSection::Samples => samples_section(source, options, focus, &mut out),
        }
    }

    out.join("\n")
}

fn resolve_focus(source: &PreviewSource<'_>, focus: Option<&str>) -> Option<NodeId> {
    let mut node = source.tree.root();
    let Some(path) = focus.filter(|f| !f.is_empty()) else {
        return Some(node);
    };
    for name in path.split(source.schema.separator()).filter(|s| !s.is_empty()) {
        node = source.tree.child(node, name)?;
    }
    Some(node)
}

fn header(source: &PreviewSource<'_>, options: &PreviewOptions, out: &mut Vec<String>) {
    let levels: Vec<String> = source
        .schema
        .levels()
        .iter()
        .map(|l| {
            if l.optional {
                format!("[{}]", l.name)
            } else {
                l.name.clone()
            }
        })
        .collect();

    out.push("Channel Finder Preview".to_string());
    out.push(format!("  {:<12} {}", "Levels", levels.join(" → ")));
    out.push(format!("  {:<12} {}", "Channels", source.stats.total_channels));
    out.push(format!("  {:<12} {}", "Depth", limit_label(options.depth)));
    out.push(format!("  {:<12} {}", "Max Items", limit_label(options.max_items)));
    if let Some(focus) = options.focus.as_deref().filter(|f| !f.is_empty()) {
        out.push(format!("  {:<12} {}", "Focus Path", focus));
    }
}

fn limit_label(value: i32) -> String {
    if value < 0 {
        "unlimited".to_string()
    } else {
        value.to_string()
    }
}

fn tree_section(
    source: &PreviewSource<'_>,
    options: &PreviewOptions,
    focus: NodeId,
    out: &mut Vec<String>,
) {
    let title = match source.tree.path_names(focus) {
        names if names.is_empty() => "(root)".to_string(),
        names => names.join(source.schema.separator()),
    };
    out.push(format!("Hierarchy Tree: {}", title));

    let mut truncated = false;
    tree_lines(source, options, focus, 0, &mut truncated, out);

    if truncated {
        out.push(String::new());
        out.push("Tip: use --depth -1 --max-items -1 to view the complete hierarchy".to_string());
    }
}

fn tree_lines(
    source: &PreviewSource<'_>,
    options: &PreviewOptions,
    node: NodeId,
    depth: usize,
    truncated: &mut bool,
    out: &mut Vec<String>,
) {
    let children = source.tree.children(node);
    if children.is_empty() {
        return;
    }
    if options.depth_limit().is_some_and(|limit| depth >= limit) {
        *truncated = true;
        return;
    }

    let shown = options.item_limit().unwrap_or(children.len()).min(children.len());
    let indent = INDENT.repeat(depth);

    for &child in &children[..shown] {
        let entry = source.tree.get(child);
        let line = match &entry.node {
            Node::Group(group) => format!("{}{} {} ({})", indent, BRANCH, entry.name, group.len()),
            Node::Terminal(terminal) if terminal.suffixes.is_empty() => {
                format!("{}{} {}", indent, BRANCH, entry.name)
            }
            Node::Terminal(terminal) => format!(
                "{}{} {} [{}]",
                indent,
                BRANCH,
                entry.name,
                terminal.suffixes.join(", ")
            ),
        };
        out.push(line);
        tree_lines(source, options, child, depth + 1, truncated, out);
    }

    if shown < children.len() {
        *truncated = true;
        out.push(format!("{}... {} more", indent, children.len() - shown));
    }
}

fn stats_section(source: &PreviewSource<'_>, out: &mut Vec<String>) {
    out.push("Hierarchy Level Statistics".to_string());
    for (level, count) in source
        .schema
        .levels()
        .iter()
        .zip(&source.stats.counts_per_level)
    {
        let marker = if level.optional { " (optional)" } else { "" };
        out.push(format!("  {:<16} {:>8}{}", level.name, count.count, marker));
    }
    out.push(format!("  {:<16} {:>8}", "signals", source.stats.terminal_count));
    out.push(format!("  {:<16} {:>8}", "channels", source.stats.total_channels));
}

/// Channels under a node, counting every emitted variant
fn channel_count(tree: &ChannelTree, node: NodeId) -> usize {
    match tree.node(node) {
        Node::Terminal(terminal) => usize::from(terminal.include_base) + terminal.suffixes.len(),
        Node::Group(group) => group
            .children()
            .iter()
            .map(|&c| channel_count(tree, c))
            .sum(),
    }
}

fn breakdown_section(source: &PreviewSource<'_>, focus: NodeId, out: &mut Vec<String>) {
    out.push("Channel Count Breakdown".to_string());
    for &child in source.tree.children(focus) {
        out.push(format!(
            "  {:<16} {:>8}",
            source.tree.name(child),
            channel_count(source.tree, child)
        ));
    }
    out.push(format!("  {:<16} {:>8}", "total", channel_count(source.tree, focus)));
}

fn samples_section(
    source: &PreviewSource<'_>,
    options: &PreviewOptions,
    focus: NodeId,
    out: &mut Vec<String>,
) {
    out.push("Sample Channels".to_string());
    let prefix = source.tree.path_names(focus);
    let matching = source.index.iter().filter(|record| {
        record.level_path.len() >= prefix.len()
            && record
                .level_path
                .iter()
                .zip(&prefix)
                .all(|(step, name)| step.value == *name)
    });
    let limit = options.item_limit().unwrap_or(usize::MAX);
    for record in matching.take(limit) {
        out.push(format!("  {}", record.address));
    }
}
