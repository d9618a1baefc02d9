//! Inline tag parsing (#tag and #tag/subtag).

use crate::parser::code_block::{find_code_block_ranges, is_in_code_block};
use crate::types::Tag;
use regex::Regex;
use std::sync::LazyLock;

// A tag starts the line or follows whitespace. `# Heading` never matches
// because a space can't follow the hash.
static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)(?:^|\s)(#[a-zA-Z0-9_\-/]+)").unwrap());

/// Parse all inline tags from content, skipping code.
pub fn parse_tags(content: &str) -> Vec<Tag> {
    let code_ranges = find_code_block_ranges(content);
    let mut tags = Vec::new();

    for cap in TAG.captures_iter(content) {
        let Some(tag_match) = cap.get(1) else {
            continue;
        };
        let start = tag_match.start();
        let end = tag_match.end();

        if is_in_code_block(start, &code_ranges) {
            continue;
        }

        let name = tag_match.as_str().trim_end_matches('/');
        if name.len() < 2 {
            continue;
        }

        let line = content[..start].matches('\n').count() + 1;
        let line_start = content[..start].rfind('\n').map(|i| i + 1).unwrap_or(0);

        tags.push(Tag {
            name: name.to_string(),
            line,
            start_col: start - line_start,
            end_col: end - line_start,
        });
    }

    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(content: &str) -> Vec<String> {
        parse_tags(content).into_iter().map(|t| t.name).collect()
    }

    #[test]
    fn test_simple_tags() {
        assert_eq!(names("#rust is fun, so is #cli-tools"), vec!["#rust", "#cli-tools"]);
    }

    #[test]
    fn test_nested_tag() {
        assert_eq!(names("filed under #lang/rust"), vec!["#lang/rust"]);
    }

    #[test]
    fn test_heading_is_not_a_tag() {
        assert!(names("# Heading\n## Sub").is_empty());
    }

    #[test]
    fn test_hash_inside_word_is_not_a_tag() {
        assert!(names("issue#12 and C#").is_empty());
    }

    #[test]
    fn test_wikilink_fragment_is_not_a_tag() {
        assert!(names("see [[Note#Section]]").is_empty());
    }

    #[test]
    fn test_tags_in_code_skipped() {
        let content = "#real\n\n```\n#fake\n```\n\n`#alsofake`";
        assert_eq!(names(content), vec!["#real"]);
    }

    #[test]
    fn test_tag_positions() {
        let tags = parse_tags("line one\n  #two");
        assert_eq!(tags[0].line, 2);
        assert_eq!(tags[0].start_col, 2);
        assert_eq!(tags[0].end_col, 6);
    }
}
