//! Wikilink and embed parsing.

use crate::parser::code_block::{find_code_block_ranges, is_in_code_block};
use crate::types::Link;
use regex::Regex;
use std::sync::LazyLock;

// (!?)        - Optional ! for embeds (group 1)
// \[\[(...)\]\] - Everything between the brackets (group 2), split later
static WIKILINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(!?)\[\[([^\]]+)\]\]").unwrap());

/// Parse all wikilinks and embeds from content, skipping code.
pub fn parse_all_links(content: &str) -> Vec<Link> {
    let code_ranges = find_code_block_ranges(content);
    let mut links = Vec::new();

    for cap in WIKILINK.captures_iter(content) {
        let Some(full_match) = cap.get(0) else {
            continue;
        };
        let start = full_match.start();
        let end = full_match.end();

        if is_in_code_block(start, &code_ranges) {
            continue;
        }

        let is_embed = cap.get(1).is_some_and(|m| !m.as_str().is_empty());
        let inner = cap.get(2).map(|m| m.as_str()).unwrap_or("");

        let line = content[..start].matches('\n').count() + 1;
        let line_start = content[..start].rfind('\n').map(|i| i + 1).unwrap_or(0);

        let mut link = Link::from_inner(inner, is_embed);
        link.line = line;
        link.start_col = start - line_start;
        link.end_col = end - line_start;
        links.push(link);
    }

    links
}

/// Whether a target names an image that embeds render as `<img>`.
pub fn is_image_target(target: &str) -> bool {
    let lower = target.to_lowercase();
    [".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp"]
        .iter()
        .any(|ext| lower.ends_with(ext))
}

/// Reduce a raw reference token to the bare target it names.
///
/// `![[My Page#Section|Alias]]` becomes `My Page`.
pub fn clean_link(token: &str) -> String {
    let s = token.strip_prefix('!').unwrap_or(token);
    let s = s.strip_prefix("[[").unwrap_or(s);
    let s = s.strip_suffix("]]").unwrap_or(s);
    let s = s.split('|').next().unwrap_or(s);
    let s = s.split('#').next().unwrap_or(s);
    s.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_link() {
        let links = parse_all_links("See [[My Note]] for details.");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].target, "My Note");
        assert!(links[0].alias.is_none());
        assert!(!links[0].embed);
    }

    #[test]
    fn test_link_with_heading_and_alias() {
        let links = parse_all_links("[[Note#Section|alias]]");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].target, "Note");
        assert_eq!(links[0].heading, Some("Section".to_string()));
        assert_eq!(links[0].alias, Some("alias".to_string()));
        assert_eq!(links[0].raw, "Note#Section|alias");
    }

    #[test]
    fn test_embed_with_block_ref() {
        let embeds = parse_all_links("![[Note#^abc123]]");
        assert_eq!(embeds.len(), 1);
        assert!(embeds[0].embed);
        assert_eq!(embeds[0].block_id, Some("abc123".to_string()));
    }

    #[test]
    fn test_multiple_links() {
        let content = "See [[Note A]] and [[Note B|B]] and ![[image.png]].";
        let links = parse_all_links(content);
        assert_eq!(links.len(), 3);
        assert_eq!(links.iter().filter(|l| l.embed).count(), 1);
        assert_eq!(links[2].target, "image.png");
    }

    #[test]
    fn test_link_in_code_skipped() {
        let content = "See [[real link]]\n\n```\n[[fake link]]\n```\n\nand `[[also fake]]`";
        let links = parse_all_links(content);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].target, "real link");
    }

    #[test]
    fn test_link_positions() {
        let content = "Line 1\nsee [[Link on line 2]]";
        let links = parse_all_links(content);
        assert_eq!(links[0].line, 2);
        assert_eq!(links[0].start_col, 4);
        assert_eq!(links[0].end_col, 22);
    }

    #[test]
    fn test_link_with_path() {
        let links = parse_all_links("[[folder/subfolder/note]]");
        assert_eq!(links[0].target, "folder/subfolder/note");
    }

    #[test]
    fn test_is_image_target() {
        assert!(is_image_target("image.png"));
        assert!(is_image_target("photo.JPG"));
        assert!(!is_image_target("doc.pdf"));
        assert!(!is_image_target("Note"));
    }

    #[test]
    fn test_clean_link() {
        assert_eq!(clean_link("![[My Page#Section|Alias]]"), "My Page");
        assert_eq!(clean_link("[[Folder/Note]]"), "Folder/Note");
        assert_eq!(clean_link("plain"), "plain");
    }
}
