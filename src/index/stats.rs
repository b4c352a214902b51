//! Aggregate statistics over the channel index

use std::collections::HashSet;

use channel_types::{ChannelStatistics, LevelCount};

use super::ChannelIndex;
use crate::schema::HierarchySchema;

/// One pass over the index; per-level counts are distinct path prefixes
/// ending at that level, so `PSU` under two devices counts twice
pub fn compute(schema: &HierarchySchema, index: &ChannelIndex) -> ChannelStatistics {
    let mut per_level: Vec<HashSet<String>> = vec![HashSet::new(); schema.len()];
    let mut terminals: HashSet<String> = HashSet::new();
    let mut suffixed = 0;

    for record in index.iter() {
        if record.suffix.is_some() {
            suffixed += 1;
        }

        let mut prefix = String::new();
        for step in &record.level_path {
            prefix.push('\u{1f}');
            prefix.push_str(&step.value);
            if let Some(idx) = schema.index_of(&step.level) {
                per_level[idx].insert(prefix.clone());
            }
        }
        terminals.insert(prefix);
    }

    ChannelStatistics {
        total_channels: index.len(),
        terminal_count: terminals.len(),
        suffixed_channels: suffixed,
        counts_per_level: schema
            .levels()
            .iter()
            .zip(per_level)
            .map(|(level, values)| LevelCount {
                level: level.name.clone(),
                count: values.len(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TreeBuilder;
    use channel_types::HierarchyLevel;
    use serde_json::json;

    #[test]
    fn test_counts_per_level() {
        let schema = HierarchySchema::new(vec![
            HierarchyLevel::required("system"),
            HierarchyLevel::required("device"),
            HierarchyLevel::optional("subdevice"),
            HierarchyLevel::required("signal"),
        ])
        .unwrap();
        let tree = TreeBuilder::new(&schema)
            .build(&json!({"SYS": {"instances": [{
                "names": ["D1", "D2"],
                "children": {
                    "Status": "{name}",
                    "Mode": {"address": "{name}", "suffixes": ["RB"]},
                    "PSU": {"children": {"Voltage": "{name}"}}
                }
            }]}}))
            .unwrap();
        let index = ChannelIndex::build(&schema, &tree).unwrap();
        let stats = compute(&schema, &index);

        assert_eq!(stats.total_channels, 8);
        assert_eq!(stats.terminal_count, 6);
        assert_eq!(stats.suffixed_channels, 2);
        assert_eq!(stats.count_for("system"), Some(1));
        assert_eq!(stats.count_for("device"), Some(2));
        assert_eq!(stats.count_for("subdevice"), Some(2));
        assert_eq!(stats.count_for("signal"), Some(6));
    }
}
