//! `.canvas` boards.
//!
//! A canvas is JSON: positioned nodes (text cards, vault files, web links,
//! groups) plus edges between them. Each node is rendered in place at its
//! coordinates; file nodes are transcluded like `![[embeds]]`. The parsed
//! board is also written out as JSON for a client-side viewer.

use super::inline::render_text;
use super::{escape_html, RenderContext, RenderedNote, Renderer};
use crate::note::Note;
use crate::types::Link;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanvasData {
    #[serde(default)]
    pub nodes: Vec<CanvasNode>,
    #[serde(default)]
    pub edges: Vec<CanvasEdge>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanvasNode {
    #[serde(default)]
    pub id: String,
    /// `text`, `file`, `link` or `group`.
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// `#Heading` or `#^block` narrowing a file node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subpath: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanvasEdge {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "fromNode", default)]
    pub from_node: String,
    #[serde(rename = "toNode", default)]
    pub to_node: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl CanvasData {
    /// Parse a board. Malformed JSON gives an empty board and a warning.
    pub fn parse(json: &str, name: &str) -> Self {
        if json.trim().is_empty() {
            return Self::default();
        }
        match serde_json::from_str(json) {
            Ok(data) => data,
            Err(e) => {
                log::warn!("Invalid canvas {}: {}", name, e);
                Self::default()
            }
        }
    }
}

impl Renderer<'_> {
    /// Render a canvas note and collect the edges its cards issue.
    pub fn render_canvas(&self, note: &Note) -> RenderedNote {
        let data = CanvasData::parse(&note.body, &note.rel_path);
        let mut ctx = RenderContext::new(&note.web_path, &note.path);

        let mut html = String::from("<div class=\"canvas\">\n");
        for node in &data.nodes {
            html.push_str(&self.render_canvas_node(node, &mut ctx));
            html.push('\n');
        }
        html.push_str("</div>\n");

        // `</` inside a script element would end it early
        let json = serde_json::to_string(&data)
            .unwrap_or_default()
            .replace("</", "<\\/");
        html.push_str(&format!(
            "<script type=\"application/json\" class=\"canvas-data\">{}</script>\n",
            json
        ));

        RenderedNote {
            html,
            edges: ctx.edges.into_edges(),
        }
    }

    fn render_canvas_node(&self, node: &CanvasNode, ctx: &mut RenderContext) -> String {
        let content = match (node.kind.as_str(), &node.text, &node.file, &node.url) {
            ("text", Some(text), _, _) => self.render_markdown(text, ctx),
            ("file", _, Some(file), _) => {
                let inner = format!("{}{}", file, node.subpath.as_deref().unwrap_or(""));
                self.render_embed(&Link::from_inner(&inner, true), ctx)
            }
            ("link", _, _, Some(url)) => format!(
                "<a href=\"{}\" class=\"external-link\">{}</a>",
                escape_html(url),
                escape_html(url)
            ),
            ("group", _, _, _) => format!(
                "<div class=\"canvas-group-label\">{}</div>",
                render_text(node.label.as_deref().unwrap_or(""))
            ),
            _ => String::new(),
        };

        let color = node
            .color
            .as_deref()
            .map(|c| format!(" data-color=\"{}\"", escape_html(c)))
            .unwrap_or_default();
        format!(
            "<div class=\"canvas-node canvas-node-{}\" id=\"node-{}\" style=\"left: {}px; top: {}px; width: {}px; height: {}px\"{}>{}</div>",
            escape_html(&node.kind),
            escape_html(&node.id),
            node.x,
            node.y,
            node.width,
            node.height,
            color,
            content
        )
    }
}
