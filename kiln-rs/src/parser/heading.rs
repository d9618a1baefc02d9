//! Heading parsing and anchor slug generation.

use crate::parser::code_block::{find_code_block_ranges, is_line_in_fenced_code_block};
use crate::types::Heading;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

// ATX-style heading: # Heading, ## Heading, optional closing hashes
static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.+?)(?:\s+#+)?\s*$").unwrap());

/// Match an ATX heading line, returning its level and text.
pub fn heading_line(line: &str) -> Option<(u8, String)> {
    let cap = HEADING.captures(line)?;
    let level = cap.get(1)?.as_str().len() as u8;
    let text = cap.get(2)?.as_str().trim().to_string();
    Some((level, text))
}

/// Parse all headings from content.
pub fn parse_headings(content: &str) -> Vec<Heading> {
    let code_ranges = find_code_block_ranges(content);
    let mut slugs = SlugCounter::default();
    let mut headings = Vec::new();

    for (line_idx, line) in content.lines().enumerate() {
        let line_num = line_idx + 1;

        if is_line_in_fenced_code_block(line_num, &code_ranges) {
            continue;
        }

        if let Some((level, text)) = heading_line(line) {
            let slug = slugs.unique(&slugify(&text));
            headings.push(Heading {
                text,
                level,
                line: line_num,
                slug,
            });
        }
    }

    headings
}

/// Generate an anchor slug from heading text.
///
/// - Normalize unicode
/// - Convert to lowercase
/// - Whitespace becomes a hyphen
/// - Keep alphanumerics, hyphens and underscores, drop everything else
pub fn slugify(text: &str) -> String {
    let normalized: String = text.nfc().collect();

    let mut slug = String::new();
    let mut last_was_hyphen = false;

    for c in normalized.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
            last_was_hyphen = false;
        } else if (c == '-' || c == '_' || c.is_whitespace()) && !last_was_hyphen && !slug.is_empty() {
            slug.push(if c == '_' { '_' } else { '-' });
            last_was_hyphen = c != '_';
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    slug
}

/// Hands out unique slugs within one document: `a`, `a-1`, `a-2`...
#[derive(Debug, Default)]
pub struct SlugCounter {
    counts: HashMap<String, usize>,
}

impl SlugCounter {
    pub fn unique(&mut self, base_slug: &str) -> String {
        let count = self.counts.entry(base_slug.to_string()).or_insert(0);
        *count += 1;

        if *count == 1 {
            base_slug.to_string()
        } else {
            format!("{}-{}", base_slug, *count - 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_headings() {
        let headings = parse_headings("# Title\n\ntext\n\n## Section One\n### Deep ###");
        assert_eq!(headings.len(), 3);
        assert_eq!(headings[0].level, 1);
        assert_eq!(headings[1].slug, "section-one");
        assert_eq!(headings[2].text, "Deep");
        assert_eq!(headings[2].line, 6);
    }

    #[test]
    fn test_headings_in_code_skipped() {
        let headings = parse_headings("# Real\n\n```\n# Not a heading\n```");
        assert_eq!(headings.len(), 1);
    }

    #[test]
    fn test_duplicate_slugs() {
        let headings = parse_headings("## Notes\n## Notes\n## Notes");
        let slugs: Vec<_> = headings.iter().map(|h| h.slug.as_str()).collect();
        assert_eq!(slugs, vec!["notes", "notes-1", "notes-2"]);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("What's new?"), "whats-new");
        assert_eq!(slugify("  spaced   out  "), "spaced-out");
        assert_eq!(slugify("snake_case stays"), "snake_case-stays");
        assert_eq!(slugify("Ünïcödé"), "ünïcödé");
    }

    #[test]
    fn test_heading_needs_space() {
        assert!(heading_line("#tag").is_none());
        assert_eq!(heading_line("## Two"), Some((2, "Two".to_string())));
    }
}
