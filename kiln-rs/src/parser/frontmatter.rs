//! YAML frontmatter parsing.

use crate::error::{KilnError, Result};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Parsed frontmatter: top-level keys mapped to their YAML values.
pub type Frontmatter = BTreeMap<String, Value>;

/// Frontmatter extraction result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontmatterSplit<'a> {
    /// The raw YAML string (without delimiters).
    pub yaml: Option<&'a str>,
    /// The content after the frontmatter.
    pub content: &'a str,
}

/// Split content into frontmatter and body.
///
/// Frontmatter opens with `---` on the very first line and closes with the
/// next line that is exactly `---`. Anything else is all body.
pub fn split_frontmatter(content: &str) -> FrontmatterSplit<'_> {
    let no_frontmatter = FrontmatterSplit {
        yaml: None,
        content,
    };

    let yaml_start = if content.starts_with("---\n") {
        4
    } else if content.starts_with("---\r\n") {
        5
    } else {
        return no_frontmatter;
    };

    let mut offset = yaml_start;
    for line in content[yaml_start..].split_inclusive('\n') {
        if line.trim_end_matches(['\n', '\r']) == "---" {
            return FrontmatterSplit {
                yaml: Some(content[yaml_start..offset].trim_end_matches(['\n', '\r'])),
                content: &content[offset + line.len()..],
            };
        }
        offset += line.len();
    }

    no_frontmatter
}

/// Parse a raw YAML frontmatter block into a key map.
///
/// Empty YAML is an empty map. Anything that isn't a mapping is rejected.
pub fn parse_frontmatter(yaml: &str, path: &Path) -> Result<Frontmatter> {
    let invalid = |message: String| KilnError::InvalidFrontmatter {
        path: path.to_path_buf(),
        message,
    };

    let value: Value = serde_yaml::from_str(yaml).map_err(|e| invalid(e.to_string()))?;

    match value {
        Value::Null => Ok(Frontmatter::new()),
        Value::Mapping(map) => Ok(map
            .into_iter()
            .filter_map(|(k, v)| scalar_key(&k).map(|key| (key, v)))
            .collect()),
        _ => Err(invalid("frontmatter is not a mapping".to_string())),
    }
}

fn scalar_key(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Tags declared in frontmatter: a `tags` list, or a single string.
pub fn frontmatter_tags(frontmatter: &Frontmatter) -> Vec<String> {
    match frontmatter.get("tags") {
        Some(Value::Sequence(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}
