//! Address builder
//!
//! Consumes the levels of a selection in schema order. A level that is
//! absent (or empty) and optional is skipped without descending, so the
//! same terminal is reached whether or not the caller mentioned it.
//! `*` fans the walk out across every eligible child of a level.

use channel_types::{Selections, WILDCARD};
use tracing::debug;

use super::filter::FilterSet;
use crate::error::{NavigationError, NavigationResult};
use crate::navigator::Navigator;
use crate::schema::HierarchySchema;
use crate::tree::{ChannelTree, NodeId};

/// Selection key that narrows output to one suffix variant when the
/// schema has no level of that name
pub const SUFFIX_SELECTION: &str = "suffix";

/// One partial walk: the node reached and the address segments so far
#[derive(Debug, Clone)]
struct Cursor {
    node: NodeId,
    segments: Vec<String>,
}

impl Cursor {
    fn descend(&self, tree: &ChannelTree, child: NodeId) -> Self {
        let name = tree.name(child);
        let segment = match tree.node(child).as_terminal() {
            Some(terminal) => terminal.render_segment(name),
            None => name.to_string(),
        };
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self {
            node: child,
            segments,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AddressBuilder<'a> {
    schema: &'a HierarchySchema,
    tree: &'a ChannelTree,
    filters: FilterSet,
}

impl<'a> AddressBuilder<'a> {
    pub fn new(schema: &'a HierarchySchema, tree: &'a ChannelTree) -> Self {
        Self {
            schema,
            tree,
            filters: FilterSet::new(),
        }
    }

    pub fn with_filters(mut self, filters: FilterSet) -> Self {
        self.filters = filters;
        self
    }

    /// Every address named by `selections`, base address before suffix
    /// variants, in tree order
    pub fn build(&self, selections: &Selections) -> NavigationResult<Vec<String>> {
        self.check_levels(selections)?;

        let mut frontier = vec![Cursor {
            node: self.tree.root(),
            segments: Vec::new(),
        }];
        let mut bulk = false;
        let navigator = Navigator::new(self.schema, self.tree);

        for (idx, level) in self.schema.levels().iter().enumerate() {
            let value = match selections.get(&level.name) {
                Some(value) => value,
                None if level.optional => continue,
                None => {
                    return Err(NavigationError::MissingLevel {
                        level: level.name.clone(),
                    })
                }
            };
            let at_terminal = self.schema.is_terminal_level(idx);
            let mut next = Vec::new();

            for cursor in &frontier {
                if self.tree.is_leaf(cursor.node) {
                    return Err(NavigationError::PastTerminal {
                        level: level.name.clone(),
                        terminal: self.tree.name(cursor.node).to_string(),
                    });
                }

                if value == WILDCARD {
                    for &child in self.tree.children(cursor.node) {
                        if !navigator.at_level(child, idx) {
                            continue;
                        }
                        let name = self.tree.name(child);
                        if !at_terminal && !self.filters.allows(&level.name, name) {
                            continue;
                        }
                        next.push(cursor.descend(self.tree, child));
                    }
                    continue;
                }

                let Some(child) = self.tree.child(cursor.node, value) else {
                    if bulk {
                        continue;
                    }
                    return Err(NavigationError::UnknownValue {
                        level: level.name.clone(),
                        value: value.to_string(),
                        available: self.available(cursor.node, idx),
                    });
                };

                match (at_terminal, self.tree.is_leaf(child)) {
                    (false, true) => {
                        return Err(NavigationError::TerminalAtLevel {
                            level: level.name.clone(),
                            value: value.to_string(),
                        })
                    }
                    (true, false) => {
                        return Err(NavigationError::Incomplete {
                            level: level.name.clone(),
                            value: value.to_string(),
                        })
                    }
                    (false, false) if !navigator.at_level(child, idx) => {
                        if bulk {
                            continue;
                        }
                        return Err(NavigationError::UnknownValue {
                            level: level.name.clone(),
                            value: value.to_string(),
                            available: self.available(cursor.node, idx),
                        });
                    }
                    _ => {}
                }

                if !at_terminal && !self.filters.allows(&level.name, value) {
                    continue;
                }
                next.push(cursor.descend(self.tree, child));
            }

            bulk |= value == WILDCARD;
            frontier = next;
        }

        let suffix = self.suffix_selection(selections);
        let mut addresses = Vec::new();
        for cursor in &frontier {
            self.emit(cursor, suffix, bulk, &mut addresses)?;
        }

        debug!(
            selections = selections.len(),
            bulk,
            addresses = addresses.len(),
            "build_addresses"
        );

        if addresses.is_empty() {
            return Err(NavigationError::NoMatches);
        }
        Ok(addresses)
    }

    /// Build one address set per sibling name placed at the terminal level.
    ///
    /// Each sibling resolves independently: a signal yields its addresses,
    /// a container yields `Incomplete`, and neither outcome affects the rest.
    pub fn build_siblings(
        &self,
        selections: &Selections,
        names: &[&str],
    ) -> Vec<(String, NavigationResult<Vec<String>>)> {
        let terminal = &self.schema.terminal_level().name;
        names
            .iter()
            .map(|&name| {
                let mut sibling = selections.clone();
                sibling.set(terminal.clone(), name);
                (name.to_string(), self.build(&sibling))
            })
            .collect()
    }

    fn check_levels(&self, selections: &Selections) -> NavigationResult<()> {
        for (level, value) in selections.iter() {
            if value.is_empty() || self.schema.index_of(level).is_some() {
                continue;
            }
            if level == SUFFIX_SELECTION {
                continue;
            }
            return Err(NavigationError::UnknownLevel(level.to_string()));
        }
        for level in self.filters.levels() {
            if self.schema.index_of(level).is_none() {
                return Err(NavigationError::UnknownLevel(level.to_string()));
            }
        }
        Ok(())
    }

    fn suffix_selection<'s>(&self, selections: &'s Selections) -> Option<&'s str> {
        if self.schema.index_of(SUFFIX_SELECTION).is_some() {
            return None;
        }
        selections.get(SUFFIX_SELECTION)
    }

    fn available(&self, node: NodeId, idx: usize) -> Vec<String> {
        Navigator::new(self.schema, self.tree)
            .eligible_children(node, idx)
            .into_iter()
            .map(|c| self.tree.name(c).to_string())
            .collect()
    }

    fn emit(
        &self,
        cursor: &Cursor,
        suffix: Option<&str>,
        bulk: bool,
        out: &mut Vec<String>,
    ) -> NavigationResult<()> {
        let Some(terminal) = self.tree.node(cursor.node).as_terminal() else {
            return Ok(());
        };
        let base = self.schema.join(cursor.segments.as_slice());

        let mut variants = Vec::new();
        match suffix {
            None => {
                if terminal.include_base {
                    variants.push(base.clone());
                }
                for s in &terminal.suffixes {
                    variants.push(self.schema.with_suffix(&base, s));
                }
            }
            Some(WILDCARD) => {
                for s in &terminal.suffixes {
                    variants.push(self.schema.with_suffix(&base, s));
                }
            }
            Some(wanted) => {
                if terminal.suffixes.iter().any(|s| s == wanted) {
                    variants.push(self.schema.with_suffix(&base, wanted));
                } else if !bulk {
                    return Err(NavigationError::UnknownValue {
                        level: SUFFIX_SELECTION.to_string(),
                        value: wanted.to_string(),
                        available: terminal.suffixes.clone(),
                    });
                }
            }
        }

        for address in variants {
            if !self.schema.is_clean(&address) {
                return Err(NavigationError::MalformedAddress(address));
            }
            out.push(address);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TreeBuilder;
    use channel_types::HierarchyLevel;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn fixture() -> (HierarchySchema, ChannelTree) {
        let schema = HierarchySchema::new(vec![
            HierarchyLevel::required("system"),
            HierarchyLevel::required("device"),
            HierarchyLevel::optional("subdevice"),
            HierarchyLevel::required("signal"),
        ])
        .unwrap();
        let tree = TreeBuilder::new(&schema)
            .build(&json!({"SYS": {"instances": [{
                "pattern": "D{:02}",
                "range": [1, 3],
                "children": {
                    "Status": "{name}",
                    "Mode": {"address": "{name}", "suffixes": ["RB", "SP"]},
                    "PSU": {"children": {"Voltage": "{name}"}}
                }
            }]}}))
            .unwrap();
        (schema, tree)
    }

    #[test]
    fn test_skipped_and_empty_optional_are_identical() {
        let (schema, tree) = fixture();
        let builder = AddressBuilder::new(&schema, &tree);
        let omitted =
            Selections::from([("system", "SYS"), ("device", "D01"), ("signal", "Status")]);
        let empty = omitted.clone().with("subdevice", "").with("suffix", "");

        assert_eq!(builder.build(&omitted).unwrap(), vec!["SYS:D01:Status"]);
        assert_eq!(builder.build(&empty).unwrap(), builder.build(&omitted).unwrap());
    }

    #[test]
    fn test_suffix_variants_follow_base() {
        let (schema, tree) = fixture();
        let builder = AddressBuilder::new(&schema, &tree);
        let sel = Selections::from([("system", "SYS"), ("device", "D02"), ("signal", "Mode")]);
        assert_eq!(
            builder.build(&sel).unwrap(),
            vec!["SYS:D02:Mode", "SYS:D02:Mode_RB", "SYS:D02:Mode_SP"]
        );

        let narrowed = sel.clone().with("suffix", "SP");
        assert_eq!(builder.build(&narrowed).unwrap(), vec!["SYS:D02:Mode_SP"]);

        let bogus = sel.with("suffix", "XX");
        assert!(matches!(
            builder.build(&bogus),
            Err(NavigationError::UnknownValue { level, .. }) if level == "suffix"
        ));
    }

    #[test]
    fn test_container_at_terminal_level_is_incomplete() {
        let (schema, tree) = fixture();
        let builder = AddressBuilder::new(&schema, &tree);
        let sel = Selections::from([("system", "SYS"), ("device", "D01"), ("signal", "PSU")]);
        assert_eq!(
            builder.build(&sel).unwrap_err(),
            NavigationError::Incomplete {
                level: "signal".to_string(),
                value: "PSU".to_string()
            }
        );
    }

    #[test]
    fn test_signal_at_optional_level_is_rejected() {
        let (schema, tree) = fixture();
        let builder = AddressBuilder::new(&schema, &tree);
        let sel = Selections::from([
            ("system", "SYS"),
            ("device", "D01"),
            ("subdevice", "Status"),
            ("signal", "Status"),
        ]);
        assert!(matches!(
            builder.build(&sel),
            Err(NavigationError::TerminalAtLevel { .. })
        ));
    }

    #[test]
    fn test_missing_required_and_unknown_levels() {
        let (schema, tree) = fixture();
        let builder = AddressBuilder::new(&schema, &tree);
        let sel = Selections::from([("system", "SYS"), ("signal", "Status")]);
        assert_eq!(
            builder.build(&sel).unwrap_err(),
            NavigationError::MissingLevel {
                level: "device".to_string()
            }
        );

        let sel = Selections::from([
            ("system", "SYS"),
            ("device", "D01"),
            ("signal", "Status"),
            ("colour", "red"),
        ]);
        assert_eq!(
            builder.build(&sel).unwrap_err(),
            NavigationError::UnknownLevel("colour".to_string())
        );
    }

    #[test]
    fn test_wildcard_fans_out_with_filter() {
        let (schema, tree) = fixture();
        let builder = AddressBuilder::new(&schema, &tree)
            .with_filters(FilterSet::new().restrict("device", &[1, 3]));
        let sel = Selections::from([("system", "SYS"), ("device", "*"), ("signal", "Status")]);
        assert_eq!(
            builder.build(&sel).unwrap(),
            vec!["SYS:D01:Status", "SYS:D03:Status"]
        );
    }

    #[test]
    fn test_wildcard_signal_excludes_containers() {
        let (schema, tree) = fixture();
        let builder = AddressBuilder::new(&schema, &tree);
        let sel = Selections::from([("system", "SYS"), ("device", "D01"), ("signal", "*")]);
        assert_eq!(
            builder.build(&sel).unwrap(),
            vec!["SYS:D01:Status", "SYS:D01:Mode", "SYS:D01:Mode_RB", "SYS:D01:Mode_SP"]
        );

        let sel = sel.with("subdevice", "*");
        assert_eq!(builder.build(&sel).unwrap(), vec!["SYS:D01:PSU:Voltage"]);
    }

    #[test]
    fn test_filter_excluding_everything_is_no_match() {
        let (schema, tree) = fixture();
        let builder = AddressBuilder::new(&schema, &tree)
            .with_filters(FilterSet::new().restrict("device", &[9]));
        let sel = Selections::from([("system", "SYS"), ("device", "D01"), ("signal", "Status")]);
        assert_eq!(builder.build(&sel).unwrap_err(), NavigationError::NoMatches);
    }

    #[test]
    fn test_sibling_fan_out_is_independent() {
        let (schema, tree) = fixture();
        let builder = AddressBuilder::new(&schema, &tree);
        let prefix = Selections::from([("system", "SYS"), ("device", "D01")]);
        let results = builder.build_siblings(&prefix, &["Status", "PSU", "Mode"]);

        assert_eq!(results[0].1, Ok(vec!["SYS:D01:Status".to_string()]));
        assert!(matches!(results[1].1, Err(NavigationError::Incomplete { .. })));
        assert_eq!(results[2].1.as_ref().map(Vec::len), Ok(3));
    }
}
