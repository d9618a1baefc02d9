//! Markdown to HTML fragments.
//!
//! Bodies are split into top-level blocks, each block is rendered on its
//! own, and inline content goes through the wikilink/link rewriter in
//! [`inline`]. Embeds re-enter the same pipeline via [`transclusion`].
//! Canvas boards are laid out by [`canvas`].

pub mod canvas;
pub mod inline;
pub mod transclusion;

use crate::graph::{EdgeCollector, GraphEdge, LinkResolver};
use crate::note::Note;
use crate::parser::block::is_list_item;
use crate::parser::{parse_blocks, slugify, Block, BlockKind, SlugCounter};
use crate::paths::Paths;
use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;

pub use transclusion::{select_blocks, FsLoader, SourceLoader};

// Trailing ` ^block-id` marker on a line
static BLOCK_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)\s\^[A-Za-z0-9_-]+\s*$").unwrap());

static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*+]|\d+[.)])\s+").unwrap());

static TABLE_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\|?\s*:?-+:?\s*(?:\|\s*:?-+:?\s*)*\|?$").unwrap());

/// Escape text for HTML content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn strip_block_marker(text: &str) -> String {
    BLOCK_MARKER.replace_all(text, "").into_owned()
}

/// Mutable state for rendering one note.
#[derive(Debug)]
pub struct RenderContext {
    /// Edges issued by the note being rendered, embeds included.
    pub edges: EdgeCollector,
    /// Sources currently being transcluded, outermost first.
    stack: Vec<PathBuf>,
}

impl RenderContext {
    pub fn new(source_address: &str, source_path: impl Into<PathBuf>) -> Self {
        Self {
            edges: EdgeCollector::new(source_address),
            stack: vec![source_path.into()],
        }
    }

    /// Embed nesting depth below the note being rendered.
    pub fn depth(&self) -> usize {
        self.stack.len().saturating_sub(1)
    }
}

/// Output of rendering a single note.
#[derive(Debug, Clone)]
pub struct RenderedNote {
    pub html: String,
    pub edges: Vec<GraphEdge>,
}

/// Renders markdown with vault-aware links and embeds.
pub struct Renderer<'a> {
    resolver: LinkResolver<'a>,
    paths: &'a Paths,
    loader: &'a dyn SourceLoader,
    max_embed_depth: usize,
}

impl<'a> Renderer<'a> {
    pub fn new(
        resolver: LinkResolver<'a>,
        paths: &'a Paths,
        loader: &'a dyn SourceLoader,
        max_embed_depth: usize,
    ) -> Self {
        Self {
            resolver,
            paths,
            loader,
            max_embed_depth,
        }
    }

    /// Render a note body and collect the edges it issues.
    pub fn render_note(&self, note: &Note) -> RenderedNote {
        let mut ctx = RenderContext::new(&note.web_path, &note.path);
        let html = self.render_markdown(&note.body, &mut ctx);
        RenderedNote {
            html,
            edges: ctx.edges.into_edges(),
        }
    }

    /// Render markdown content (no frontmatter) into an HTML fragment.
    pub fn render_markdown(&self, content: &str, ctx: &mut RenderContext) -> String {
        let blocks = parse_blocks(content);
        let refs: Vec<&Block> = blocks.iter().collect();
        self.render_blocks(&refs, ctx)
    }

    pub(crate) fn render_blocks(&self, blocks: &[&Block], ctx: &mut RenderContext) -> String {
        let mut slugs = SlugCounter::default();
        let mut html = String::new();
        for block in blocks {
            html.push_str(&self.render_block(block, ctx, &mut slugs));
            html.push('\n');
        }
        html
    }

    fn render_block(&self, block: &Block, ctx: &mut RenderContext, slugs: &mut SlugCounter) -> String {
        match &block.kind {
            BlockKind::Heading { level, text } => {
                let text = strip_block_marker(text);
                let id = slugs.unique(&slugify(&text));
                format!(
                    "<h{level} id=\"{}\">{}</h{level}>",
                    escape_html(&id),
                    self.render_inline(&text, ctx)
                )
            }
            BlockKind::Paragraph => {
                format!("<p>{}</p>", self.render_inline(&strip_block_marker(&block.raw), ctx))
            }
            BlockKind::List { ordered } => self.render_list(&block.raw, *ordered, ctx),
            BlockKind::Quote => {
                let inner: Vec<&str> = block
                    .raw
                    .lines()
                    .map(|line| {
                        let line = line.trim_start().trim_start_matches('>');
                        line.strip_prefix(' ').unwrap_or(line)
                    })
                    .collect();
                format!(
                    "<blockquote>\n{}</blockquote>",
                    self.render_markdown(&inner.join("\n"), ctx)
                )
            }
            BlockKind::Code { lang } => render_code(&block.raw, lang.as_deref()),
            BlockKind::Rule => "<hr>".to_string(),
            BlockKind::Table => self.render_table(&block.raw, ctx),
        }
    }

    fn render_list(&self, raw: &str, ordered: bool, ctx: &mut RenderContext) -> String {
        let mut items: Vec<String> = Vec::new();
        for line in raw.lines() {
            if is_list_item(line) {
                items.push(LIST_MARKER.replace(line, "").into_owned());
            } else if let Some(last) = items.last_mut() {
                last.push('\n');
                last.push_str(line.trim());
            }
        }

        let tag = if ordered { "ol" } else { "ul" };
        let mut html = format!("<{}>\n", tag);
        for item in items {
            html.push_str(&format!(
                "<li>{}</li>\n",
                self.render_inline(&strip_block_marker(&item), ctx)
            ));
        }
        html.push_str(&format!("</{}>", tag));
        html
    }

    fn render_table(&self, raw: &str, ctx: &mut RenderContext) -> String {
        let lines: Vec<&str> = raw.lines().collect();
        let has_header = lines.len() > 1 && TABLE_SEPARATOR.is_match(lines[1].trim());

        let mut html = String::from("<table>\n");
        if has_header {
            html.push_str("<thead><tr>");
            for cell in split_row(lines[0]) {
                html.push_str(&format!("<th>{}</th>", self.render_inline(cell, ctx)));
            }
            html.push_str("</tr></thead>\n");
        }

        let body = if has_header { &lines[2..] } else { &lines[..] };
        html.push_str("<tbody>\n");
        for line in body {
            html.push_str("<tr>");
            for cell in split_row(line) {
                html.push_str(&format!("<td>{}</td>", self.render_inline(cell, ctx)));
            }
            html.push_str("</tr>\n");
        }
        html.push_str("</tbody>\n</table>");
        html
    }
}

fn split_row(line: &str) -> Vec<&str> {
    let line = line.trim();
    let line = line.strip_prefix('|').unwrap_or(line);
    let line = line.strip_suffix('|').unwrap_or(line);
    line.split('|').map(str::trim).collect()
}

fn render_code(raw: &str, lang: Option<&str>) -> String {
    let lines: Vec<&str> = raw.lines().collect();
    // Drop the opening fence, and the closing one if present
    let mut body = &lines[1.min(lines.len())..];
    if body.last().is_some_and(|l| {
        let t = l.trim();
        !t.is_empty() && (t.chars().all(|c| c == '`') || t.chars().all(|c| c == '~'))
    }) {
        body = &body[..body.len() - 1];
    }

    let class = match lang {
        Some(lang) => format!(" class=\"language-{}\"", escape_html(lang)),
        None => String::new(),
    };
    format!(
        "<pre><code{}>{}</code></pre>",
        class,
        escape_html(&body.join("\n"))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NoteIndex;
    use crate::vault::Vault;
    use std::collections::HashMap;

    pub(crate) fn make_vault(files: &[(&str, &str)]) -> Vault {
        let notes = files
            .iter()
            .map(|(path, content)| {
                if path.ends_with(".png") {
                    Note::asset(path, 1)
                } else {
                    Note::new(path, content)
                }
            })
            .collect();
        Vault::from_notes("/v", Paths::from_parts("", "public", false).unwrap(), notes)
    }

    pub(crate) fn render(vault: &Vault, files: &[(&str, &str)], name: &str) -> RenderedNote {
        let loader: HashMap<PathBuf, String> = files
            .iter()
            .map(|(p, c)| (PathBuf::from("/v").join(p), c.to_string()))
            .collect();
        let index = NoteIndex::build(&vault.notes);
        let renderer = Renderer::new(
            LinkResolver::new(&vault.notes, &index),
            &vault.paths,
            &loader,
            8,
        );
        let note = match vault.find_note(name) {
            Some(i) => &vault.notes[i],
            None => panic!("Expected note {}", name),
        };
        renderer.render_note(note)
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn test_blocks_render() {
        let files = [(
            "Doc.md",
            "# Title\n\nSome *text* here. ^para\n\n## Title\n\n- one\n- two\n\n> quoted\n\n---\n\n```rust\nlet a = 1 < 2;\n```",
        )];
        let vault = make_vault(&files);
        let html = render(&vault, &files, "Doc").html;

        assert!(html.contains("<h1 id=\"title\">Title</h1>"));
        assert!(html.contains("<h2 id=\"title-1\">Title</h2>"));
        assert!(html.contains("<p>Some <em>text</em> here.</p>"));
        assert!(html.contains("<ul>\n<li>one</li>\n<li>two</li>\n</ul>"));
        assert!(html.contains("<blockquote>\n<p>quoted</p>\n</blockquote>"));
        assert!(html.contains("<hr>"));
        assert!(html.contains("<pre><code class=\"language-rust\">let a = 1 &lt; 2;</code></pre>"));
    }

    #[test]
    fn test_table() {
        let files = [("T.md", "| a | b |\n|---|:-:|\n| [[T]] | 2 |")];
        let vault = make_vault(&files);
        let html = render(&vault, &files, "T").html;
        assert!(html.contains("<thead><tr><th>a</th><th>b</th></tr></thead>"));
        assert!(html.contains("<td><a href=\"/t\" class=\"internal-link\">T</a></td><td>2</td>"));
    }
}
