//! Code block detection for skipping parsing inside code.

use regex::Regex;
use std::sync::LazyLock;

/// A byte range that is inside a fenced block or an inline code span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlockRange {
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
    /// Line number where the range starts (1-indexed).
    pub start_line: usize,
    /// Line number where the range ends (1-indexed).
    pub end_line: usize,
    /// Whether this is a fenced code block (vs inline code).
    pub is_fenced: bool,
}

// Inline code, double backticks first so they can wrap single ones
static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"``(?:[^`]|`[^`])*``|`[^`\n]+`").unwrap());

/// Returns the fence marker (``` or ~~~, possibly longer) opening a line.
pub fn fence_marker(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    let first = trimmed.chars().next()?;
    if first != '`' && first != '~' {
        return None;
    }
    let len = trimmed.chars().take_while(|&c| c == first).count();
    if len >= 3 { Some(&trimmed[..len]) } else { None }
}

/// Whether `line` closes a fence opened with `marker`.
pub fn closes_fence(line: &str, marker: &str) -> bool {
    let trimmed = line.trim();
    let Some(first) = marker.chars().next() else {
        return false;
    };
    trimmed.len() >= marker.len() && trimmed.chars().all(|c| c == first)
}

/// Find all fenced block and inline code ranges in content.
///
/// An unclosed fence runs to the end of the content.
pub fn find_code_block_ranges(content: &str) -> Vec<CodeBlockRange> {
    let mut ranges = Vec::new();
    let mut offset = 0;
    let mut open: Option<(usize, usize, String)> = None;

    for (idx, line) in content.split_inclusive('\n').enumerate() {
        let line_num = idx + 1;
        let text = line.trim_end_matches(['\n', '\r']);

        match open {
            Some((start, start_line, ref marker)) => {
                if closes_fence(text, marker) {
                    ranges.push(CodeBlockRange {
                        start,
                        end: offset + text.len(),
                        start_line,
                        end_line: line_num,
                        is_fenced: true,
                    });
                    open = None;
                }
            }
            None => {
                if let Some(marker) = fence_marker(text) {
                    open = Some((offset, line_num, marker.to_string()));
                }
            }
        }

        offset += line.len();
    }

    if let Some((start, start_line, _)) = open {
        ranges.push(CodeBlockRange {
            start,
            end: content.len(),
            start_line,
            end_line: content.lines().count().max(start_line),
            is_fenced: true,
        });
    }

    let fenced = ranges.clone();
    for m in INLINE_CODE.find_iter(content) {
        if fenced.iter().any(|r| m.start() < r.end && m.end() > r.start) {
            continue;
        }
        ranges.push(CodeBlockRange {
            start: m.start(),
            end: m.end(),
            start_line: content[..m.start()].matches('\n').count() + 1,
            end_line: content[..m.end()].matches('\n').count() + 1,
            is_fenced: false,
        });
    }

    ranges.sort_by_key(|r| r.start);
    ranges
}

/// Check if a byte offset is inside any code range.
pub fn is_in_code_block(offset: usize, ranges: &[CodeBlockRange]) -> bool {
    ranges.iter().any(|r| offset >= r.start && offset < r.end)
}

/// Check if a line number is inside any fenced code block.
pub fn is_line_in_fenced_code_block(line: usize, ranges: &[CodeBlockRange]) -> bool {
    ranges
        .iter()
        .any(|r| r.is_fenced && line >= r.start_line && line <= r.end_line)
}
