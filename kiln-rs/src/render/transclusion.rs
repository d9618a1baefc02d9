//! Transclusion: inlining another note, whole or a heading/block slice.

use super::inline::render_text;
use super::{escape_html, RenderContext, Renderer};
use crate::note::NoteKind;
use crate::parser::{is_image_target, parse_blocks, split_frontmatter, Block, BlockKind};
use crate::types::Link;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// Reads the raw source of an embed target.
pub trait SourceLoader {
    fn load(&self, path: &Path) -> io::Result<String>;
}

/// Loads sources from the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader;

impl SourceLoader for FsLoader {
    fn load(&self, path: &Path) -> io::Result<String> {
        let bytes = std::fs::read(path)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// In-memory sources keyed by path.
impl SourceLoader for HashMap<PathBuf, String> {
    fn load(&self, path: &Path) -> io::Result<String> {
        self.get(path).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("{} not loaded", path.display()))
        })
    }
}

/// Pick the blocks a fragment names.
///
/// - empty: every block
/// - `#^id`: the first block whose raw text contains `^id`
/// - `#Heading`: that heading (case-insensitive) and the blocks after it, up
///   to the next heading at the same or a shallower level
pub fn select_blocks<'b>(blocks: &'b [Block], fragment: &str) -> Vec<&'b Block> {
    let fragment = fragment.trim_start_matches('#');
    if fragment.is_empty() {
        return blocks.iter().collect();
    }

    if fragment.starts_with('^') {
        return blocks
            .iter()
            .find(|b| b.raw.contains(fragment))
            .into_iter()
            .collect();
    }

    let wanted = fragment.to_lowercase();
    let Some(start) = blocks.iter().position(|b| match &b.kind {
        BlockKind::Heading { text, .. } => text.to_lowercase() == wanted,
        _ => false,
    }) else {
        return Vec::new();
    };
    let level = blocks[start].heading_level().unwrap_or(1);

    let mut selected = vec![&blocks[start]];
    for block in &blocks[start + 1..] {
        if block.heading_level().is_some_and(|l| l <= level) {
            break;
        }
        selected.push(block);
    }
    selected
}

fn broken_embed(href: &str, label: &str) -> String {
    if href.is_empty() {
        return format!("<a class=\"broken-embed\">{}</a>", render_text(label));
    }
    format!(
        "<a href=\"{}\" class=\"broken-embed\">{}</a>",
        escape_html(href),
        render_text(label)
    )
}

impl Renderer<'_> {
    /// Render an embed. Never fails: anything that goes wrong becomes a
    /// broken-embed marker.
    pub(crate) fn render_embed(&self, link: &Link, ctx: &mut RenderContext) -> String {
        let label = link.display_text();
        let Some(resolution) = self.resolver.resolve(&link.reference(), &mut ctx.edges) else {
            log::warn!("Unresolved embed ![[{}]] in {}", link.raw, ctx.edges.source());
            return broken_embed(&link.fragment(), &label);
        };
        let note = &self.resolver.notes()[resolution.note];

        if is_image_target(&note.file_name) {
            let alt = link.alias.clone().unwrap_or_else(|| link.target.clone());
            return format!(
                "<img src=\"{}\" alt=\"{}\">",
                escape_html(&resolution.address),
                escape_html(&alt)
            );
        }

        if note.kind != NoteKind::Markdown {
            return format!(
                "<a href=\"{}\" class=\"internal-link\">{}</a>",
                escape_html(&resolution.href()),
                render_text(&label)
            );
        }

        let Some(source) = self.resolver.index().source(&resolution.address) else {
            log::warn!("No source recorded for {}", resolution.address);
            return broken_embed(&resolution.href(), &label);
        };

        if ctx.stack.iter().any(|p| p == source) {
            log::warn!(
                "Embed cycle at {} while rendering {}",
                source.display(),
                ctx.edges.source()
            );
            return broken_embed(&resolution.href(), &label);
        }
        if ctx.depth() >= self.max_embed_depth {
            log::warn!(
                "Embed depth limit ({}) reached at {}",
                self.max_embed_depth,
                source.display()
            );
            return broken_embed(&resolution.href(), &label);
        }

        let content = match self.loader.load(source) {
            Ok(content) => content,
            Err(e) => {
                log::warn!("Cannot read embed source {}: {}", source.display(), e);
                return broken_embed(&resolution.href(), &label);
            }
        };

        let blocks = parse_blocks(split_frontmatter(&content).content);
        let selected = select_blocks(&blocks, &resolution.fragment);
        if selected.is_empty() {
            log::warn!(
                "No section {:?} in {} for ![[{}]]",
                resolution.fragment,
                note.rel_path,
                link.raw
            );
            return broken_embed(&resolution.href(), &label);
        }

        ctx.stack.push(source.to_path_buf());
        let inner = self.render_blocks(&selected, ctx);
        ctx.stack.pop();

        let dest = escape_html(&resolution.href());
        let title = if resolution.fragment.is_empty() {
            format!(
                "<a href=\"{}\" class=\"markdown-embed-title\">{}</a>",
                dest,
                escape_html(&note.name)
            )
        } else {
            format!(
                "<div class=\"markdown-embed-title\">{}</div>",
                escape_html(resolution.fragment.trim_start_matches('#'))
            )
        };

        format!(
            "<div class=\"markdown-embed\"><div class=\"markdown-embed-header\">{}<a href=\"{}\" class=\"markdown-embed-link\" title=\"Open Original\"><i class=\"\" data-lucide=\"maximize-2\"></i></a></div><div class=\"markdown-embed-content\">{}</div></div>",
            title, dest, inner
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::tests::{make_vault, render};

    fn texts(blocks: Vec<&Block>) -> Vec<String> {
        blocks.iter().map(|b| b.raw.clone()).collect()
    }

    #[test]
    fn test_select_heading_section() {
        let blocks = parse_blocks(
            "# Top\n\nintro\n\n## Section\n\nbody\n\n### Sub\n\nsub body\n\n## Next\n\nafter",
        );
        assert_eq!(
            texts(select_blocks(&blocks, "#section")),
            vec!["## Section", "body", "### Sub", "sub body"]
        );
        assert_eq!(texts(select_blocks(&blocks, "#Sub")), vec!["### Sub", "sub body"]);
    }

    #[test]
    fn test_select_block_id() {
        let blocks = parse_blocks("first\n\nsecond ^ref-1\n\n- item ^ref-1");
        assert_eq!(texts(select_blocks(&blocks, "#^ref-1")), vec!["second ^ref-1"]);
        assert!(select_blocks(&blocks, "#^nope").is_empty());
    }

    #[test]
    fn test_select_all_and_missing() {
        let blocks = parse_blocks("a\n\nb");
        assert_eq!(select_blocks(&blocks, "").len(), 2);
        assert!(select_blocks(&blocks, "#Missing").is_empty());
        assert!(matches!(blocks[0].kind, BlockKind::Paragraph));
    }

    #[test]
    fn test_whole_note_embed() {
        let files = [
            ("A.md", "before\n\n![[B]]"),
            ("B.md", "---\ntitle: b\n---\n# B title\n\nB body [[C]]"),
            ("C.md", "c"),
        ];
        let vault = make_vault(&files);
        let out = render(&vault, &files, "A");

        assert!(out.html.contains("<a href=\"/b\" class=\"markdown-embed-title\">B</a>"));
        assert!(out.html.contains("class=\"markdown-embed-link\" title=\"Open Original\""));
        assert!(out.html.contains("<h1 id=\"b-title\">B title</h1>"));
        assert!(!out.html.contains("title: b"));
        // The nested link is recorded for the embedding note
        let targets: Vec<_> = out.edges.iter().map(|e| e.target.as_str()).collect();
        assert_eq!(targets, vec!["/b", "/c"]);
        assert!(out.edges.iter().all(|e| e.source == "/a"));
    }

    #[test]
    fn test_section_embed() {
        let files = [
            ("A.md", "![[B#Two]]"),
            ("B.md", "## One\n\none\n\n## Two\n\ntwo text\n\n## Three\n\nthree"),
        ];
        let vault = make_vault(&files);
        let html = render(&vault, &files, "A").html;
        assert!(html.contains("<div class=\"markdown-embed-title\">Two</div>"));
        assert!(html.contains("<p>two text</p>"));
        assert!(!html.contains("three"));
        assert!(!html.contains("<p>one</p>"));
    }

    #[test]
    fn test_self_embed_is_guarded() {
        let files = [("Loop.md", "start\n\n![[Loop]]")];
        let vault = make_vault(&files);
        let html = render(&vault, &files, "Loop").html;
        assert!(html.contains("<a href=\"/loop\" class=\"broken-embed\">Loop</a>"));
    }

    #[test]
    fn test_mutual_embed_is_guarded() {
        let files = [("A.md", "a ![[B]]"), ("B.md", "b ![[A]]")];
        let vault = make_vault(&files);
        let html = render(&vault, &files, "A").html;
        assert_eq!(html.matches("markdown-embed-content").count(), 1);
        assert!(html.contains("class=\"broken-embed\">A</a>"));
    }

    #[test]
    fn test_depth_limit() {
        let files = [
            ("N0.md", "![[N1]]"),
            ("N1.md", "![[N2]]"),
            ("N2.md", "![[N3]]"),
            ("N3.md", "end"),
        ];
        let vault = make_vault(&files);
        let index = crate::graph::NoteIndex::build(&vault.notes);
        let loader: HashMap<PathBuf, String> = files
            .iter()
            .map(|(p, c)| (PathBuf::from("/v").join(p), c.to_string()))
            .collect();
        let renderer = Renderer::new(
            crate::graph::LinkResolver::new(&vault.notes, &index),
            &vault.paths,
            &loader,
            2,
        );
        let html = renderer.render_note(&vault.notes[0]).html;
        assert_eq!(html.matches("markdown-embed-content").count(), 2);
        assert!(html.contains("class=\"broken-embed\">N3</a>"));
        assert!(!html.contains("end"));
    }

    #[test]
    fn test_unreadable_and_unresolved() {
        let files = [("A.md", "![[B]] and ![[Ghost]] and ![[Ghost#Part]]"), ("B.md", "")];
        let vault = make_vault(&files);
        // Only A is loadable
        let html = render(&vault, &files[..1], "A").html;
        assert!(html.contains("<a href=\"/b\" class=\"broken-embed\">B</a>"));
        assert!(html.contains("<a class=\"broken-embed\">Ghost</a>"));
        assert!(html.contains("<a href=\"#Part\" class=\"broken-embed\">Ghost#Part</a>"));
        assert!(!html.contains("href=\"\""));
    }

    #[test]
    fn test_unmatched_fragment() {
        let files = [("A.md", "![[B#Nowhere]]"), ("B.md", "# Somewhere")];
        let vault = make_vault(&files);
        let html = render(&vault, &files, "A").html;
        assert!(html.contains("class=\"broken-embed\">B#Nowhere</a>"));
    }
}
