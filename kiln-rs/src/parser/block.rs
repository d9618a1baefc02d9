//! Block-level document model.
//!
//! A note body is split into a flat list of top-level blocks. Each block keeps
//! its raw source so block references (`^id`) can be found by plain text
//! search, and so the renderer can re-parse inline content later.

use crate::parser::code_block::{closes_fence, fence_marker};
use crate::parser::heading::heading_line;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*+]|\d+[.)])\s+").unwrap());

static RULE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ {0,3}(?:(?:-\s*){3,}|(?:\*\s*){3,}|(?:_\s*){3,})$").unwrap());

/// Kind of a top-level block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockKind {
    Heading { level: u8, text: String },
    Paragraph,
    List { ordered: bool },
    Quote,
    Code { lang: Option<String> },
    Rule,
    Table,
}

/// One top-level block with its raw source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block {
    #[serde(flatten)]
    pub kind: BlockKind,
    /// Raw source of the block, without the trailing newline.
    pub raw: String,
    /// Line where the block starts (1-indexed).
    pub line: usize,
}

impl Block {
    pub fn heading_level(&self) -> Option<u8> {
        match self.kind {
            BlockKind::Heading { level, .. } => Some(level),
            _ => None,
        }
    }
}

pub(crate) fn is_list_item(line: &str) -> bool {
    LIST_ITEM.is_match(line)
}

fn is_rule(line: &str) -> bool {
    RULE.is_match(line)
}

fn is_quote(line: &str) -> bool {
    line.trim_start().starts_with('>')
}

fn is_table_row(line: &str) -> bool {
    line.trim_start().starts_with('|')
}

/// Whether `line` starts a new block and so ends a running paragraph.
fn interrupts_paragraph(line: &str) -> bool {
    heading_line(line).is_some()
        || fence_marker(line).is_some()
        || is_quote(line)
        || is_rule(line)
        || is_list_item(line)
}

/// Split markdown content into top-level blocks.
pub fn parse_blocks(content: &str) -> Vec<Block> {
    let lines: Vec<&str> = content.lines().collect();
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        let start = i;

        if line.trim().is_empty() {
            i += 1;
            continue;
        }

        // Fenced code runs to its closing fence, or to the end
        if let Some(marker) = fence_marker(line) {
            let lang = line.trim_start()[marker.len()..].trim();
            i += 1;
            while i < lines.len() && !closes_fence(lines[i], marker) {
                i += 1;
            }
            let end = (i + 1).min(lines.len());
            blocks.push(Block {
                kind: BlockKind::Code {
                    lang: (!lang.is_empty()).then(|| lang.to_string()),
                },
                raw: lines[start..end].join("\n"),
                line: start + 1,
            });
            i = end;
            continue;
        }

        if let Some((level, text)) = heading_line(line) {
            blocks.push(Block {
                kind: BlockKind::Heading { level, text },
                raw: line.to_string(),
                line: start + 1,
            });
            i += 1;
            continue;
        }

        if is_rule(line) {
            blocks.push(Block {
                kind: BlockKind::Rule,
                raw: line.to_string(),
                line: start + 1,
            });
            i += 1;
            continue;
        }

        let (kind, continues): (BlockKind, fn(&str) -> bool) = if is_quote(line) {
            (BlockKind::Quote, is_quote)
        } else if is_table_row(line) {
            (BlockKind::Table, is_table_row)
        } else if is_list_item(line) {
            let ordered = line.trim_start().starts_with(|c: char| c.is_ascii_digit());
            (BlockKind::List { ordered }, |l: &str| {
                is_list_item(l) || l.starts_with(char::is_whitespace)
            })
        } else {
            (BlockKind::Paragraph, |l: &str| !interrupts_paragraph(l))
        };

        i += 1;
        while i < lines.len() && !lines[i].trim().is_empty() && continues(lines[i]) {
            i += 1;
        }

        blocks.push(Block {
            kind,
            raw: lines[start..i].join("\n"),
            line: start + 1,
        });
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(content: &str) -> Vec<BlockKind> {
        parse_blocks(content).into_iter().map(|b| b.kind).collect()
    }

    #[test]
    fn test_mixed_document() {
        let content = "# Title\n\nFirst paragraph\nstill first.\n\n- one\n- two\n  continued\n\n> quoted\n> more\n\n---\n\n| a | b |\n|---|---|\n| 1 | 2 |\n\n```rust\nfn main() {}\n```";
        assert_eq!(
            kinds(content),
            vec![
                BlockKind::Heading {
                    level: 1,
                    text: "Title".to_string()
                },
                BlockKind::Paragraph,
                BlockKind::List { ordered: false },
                BlockKind::Quote,
                BlockKind::Rule,
                BlockKind::Table,
                BlockKind::Code {
                    lang: Some("rust".to_string())
                },
            ]
        );
    }

    #[test]
    fn test_raw_text_and_lines() {
        let blocks = parse_blocks("intro\n\nA paragraph ^abc\nsecond line\n\n## Next");
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[1].raw, "A paragraph ^abc\nsecond line");
        assert_eq!(blocks[1].line, 3);
        assert_eq!(blocks[2].heading_level(), Some(2));
    }

    #[test]
    fn test_heading_interrupts_paragraph() {
        assert_eq!(
            kinds("text\n## Heading\nmore"),
            vec![
                BlockKind::Paragraph,
                BlockKind::Heading {
                    level: 2,
                    text: "Heading".to_string()
                },
                BlockKind::Paragraph,
            ]
        );
    }

    #[test]
    fn test_ordered_list() {
        assert_eq!(kinds("1. first\n2. second"), vec![BlockKind::List { ordered: true }]);
    }

    #[test]
    fn test_heading_inside_fence_is_code() {
        let blocks = parse_blocks("```\n# not heading\n\nstill code\n```\nafter");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].raw, "```\n# not heading\n\nstill code\n```");
        assert_eq!(blocks[1].kind, BlockKind::Paragraph);
    }

    #[test]
    fn test_unclosed_fence() {
        let blocks = parse_blocks("```\ncode forever");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind, BlockKind::Code { lang: None });
    }
}
