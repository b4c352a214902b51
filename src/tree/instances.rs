//! Instance expansion: many sibling groups from one naming pattern
//!
//! Facilities number their devices (`MC-01`, `MC-02`, ...) and every
//! instance carries the same sub-structure. An `instances` block names the
//! instances once and shares one `children` template among them.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

/// `{}` or `{:0N}` placeholder in an instance pattern
static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(?::0(\d+))?\}").unwrap());

/// Serialized `instances` entry
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstanceSpec {
    #[serde(default)]
    pub pattern: Option<String>,
    /// Inclusive `[start, end]`
    #[serde(default)]
    pub range: Option<[u32; 2]>,
    #[serde(default)]
    pub names: Option<Vec<String>>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub children: Option<Value>,
    /// Nested instance blocks, expanded inside every generated group
    #[serde(default)]
    pub instances: Option<Value>,
}

impl InstanceSpec {
    /// Instance names in generation order
    pub fn expand(&self) -> Result<Vec<String>, String> {
        match (&self.pattern, &self.range, &self.names) {
            (Some(pattern), Some([start, end]), None) => {
                if start > end {
                    return Err(format!("range start {} is after end {}", start, end));
                }
                (*start..=*end).map(|n| format_instance(pattern, n)).collect()
            }
            (None, None, Some(names)) => {
                if names.iter().any(|n| n.is_empty()) {
                    return Err("instance names must not be empty".to_string());
                }
                Ok(names.clone())
            }
            _ => Err("expected either 'pattern' with 'range', or 'names'".to_string()),
        }
    }
}

/// Render one instance name; the pattern must contain exactly one placeholder
pub fn format_instance(pattern: &str, n: u32) -> Result<String, String> {
    let mut matches = PLACEHOLDER_RE.captures_iter(pattern);
    let Some(caps) = matches.next() else {
        return Err(format!("pattern '{}' has no placeholder", pattern));
    };
    if matches.next().is_some() {
        return Err(format!("pattern '{}' has more than one placeholder", pattern));
    }

    let number = match caps.get(1) {
        Some(width) => {
            let width: usize = width
                .as_str()
                .parse()
                .map_err(|_| format!("bad width in pattern '{}'", pattern))?;
            format!("{:0width$}", n, width = width)
        }
        None => n.to_string(),
    };

    let whole = caps.get(0).map(|m| m.range()).unwrap_or(0..0);
    Ok(format!(
        "{}{}{}",
        &pattern[..whole.start],
        number,
        &pattern[whole.end..]
    ))
}
