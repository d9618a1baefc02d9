//! Inline rendering: code spans, wikilinks, markdown links and images, emphasis.

use super::{escape_html, RenderContext, Renderer};
use crate::types::Link;
use regex::{Captures, Regex};
use std::sync::LazyLock;

static INLINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?x)
        (?P<code>``(?:[^`]|`[^`])*?``|`[^`\n]+`)
        | \[\[(?P<wiki>[^\]]+)\]\]
        | !\[(?P<alt>[^\]]*)\]\((?P<src>[^)\s]*)(?:\s+"(?P<img_title>[^"]*)")?\)
        | \[(?P<text>[^\]]*)\]\((?P<href>[^)\s]*)(?:\s+"(?P<title>[^"]*)")?\)
        "#,
    )
    .unwrap()
});

static STRONG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*|__([^_]+)__").unwrap());
static EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*]+)\*|\b_([^_]+)_\b").unwrap());
static STRIKE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"~~([^~]+)~~").unwrap());
static HIGHLIGHT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"==([^=]+)==").unwrap());

fn wrap(re: &Regex, text: &str, tag: &str) -> String {
    re.replace_all(text, |caps: &Captures| {
        let inner = caps
            .iter()
            .skip(1)
            .flatten()
            .next()
            .map(|m| m.as_str())
            .unwrap_or("");
        format!("<{tag}>{inner}</{tag}>")
    })
    .into_owned()
}

/// Escape plain text and apply emphasis markers.
pub fn render_text(text: &str) -> String {
    let html = escape_html(text);
    let html = wrap(&STRONG, &html, "strong");
    let html = wrap(&EMPHASIS, &html, "em");
    let html = wrap(&STRIKE, &html, "del");
    wrap(&HIGHLIGHT, &html, "mark")
}

fn title_attr(title: Option<&str>) -> String {
    match title {
        Some(t) if !t.is_empty() => format!(" title=\"{}\"", escape_html(t)),
        _ => String::new(),
    }
}

impl Renderer<'_> {
    /// Render one run of inline markdown.
    pub fn render_inline(&self, text: &str, ctx: &mut RenderContext) -> String {
        let mut html = String::new();
        let mut pending = String::new();
        let mut last = 0;

        for caps in INLINE.captures_iter(text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            pending.push_str(&text[last..whole.start()]);
            last = whole.end();

            if let Some(code) = caps.name("code") {
                html.push_str(&render_text(&pending));
                pending.clear();
                let inner = code.as_str().trim_matches('`').trim();
                html.push_str(&format!("<code>{}</code>", escape_html(inner)));
            } else if let Some(inner) = caps.name("wiki") {
                // A `!` glued to the end of the preceding text makes this an embed
                let embed = pending.ends_with('!');
                if embed {
                    pending.pop();
                }
                html.push_str(&render_text(&pending));
                pending.clear();

                let link = Link::from_inner(inner.as_str(), embed);
                if embed {
                    html.push_str(&self.render_embed(&link, ctx));
                } else {
                    html.push_str(&self.render_wikilink(&link, ctx));
                }
            } else if caps.name("src").is_some() {
                html.push_str(&render_text(&pending));
                pending.clear();
                let src = self.rewrite_destination(caps.name("src").map_or("", |m| m.as_str()));
                html.push_str(&format!(
                    "<img src=\"{}\" alt=\"{}\"{}>",
                    escape_html(&src),
                    escape_html(caps.name("alt").map_or("", |m| m.as_str())),
                    title_attr(caps.name("img_title").map(|m| m.as_str())),
                ));
            } else {
                html.push_str(&render_text(&pending));
                pending.clear();
                let href = self.rewrite_destination(caps.name("href").map_or("", |m| m.as_str()));
                html.push_str(&format!(
                    "<a href=\"{}\"{}>{}</a>",
                    escape_html(&href),
                    title_attr(caps.name("title").map(|m| m.as_str())),
                    render_text(caps.name("text").map_or("", |m| m.as_str())),
                ));
            }
        }

        pending.push_str(&text[last..]);
        html.push_str(&render_text(&pending));
        html
    }

    fn render_wikilink(&self, link: &Link, ctx: &mut RenderContext) -> String {
        let label = render_text(&link.display_text());
        match self.resolver.resolve(&link.reference(), &mut ctx.edges) {
            Some(resolution) => format!(
                "<a href=\"{}\" class=\"internal-link\">{}</a>",
                escape_html(&resolution.href()),
                label
            ),
            None => {
                log::debug!("Unresolved link [[{}]] in {}", link.raw, ctx.edges.source());
                let fragment = link.fragment();
                if fragment.is_empty() {
                    format!("<a class=\"broken-link\">{}</a>", label)
                } else {
                    format!(
                        "<a href=\"{}\" class=\"broken-link\">{}</a>",
                        escape_html(&fragment),
                        label
                    )
                }
            }
        }
    }

    /// Rewrite a standard markdown destination to a public address.
    ///
    /// External URLs and bare anchors stay as written. Vault files resolve to
    /// their address without recording a graph edge.
    pub fn rewrite_destination(&self, dest: &str) -> String {
        if dest.contains("://") || dest.starts_with("mailto:") || dest.starts_with('#') || dest.is_empty() {
            return dest.to_string();
        }

        let decoded = urlencoding::decode(dest)
            .map(|d| d.into_owned())
            .unwrap_or_else(|_| dest.to_string());

        if let Some(resolution) = self.resolver.find(&decoded) {
            return resolution.href();
        }
        if decoded.starts_with('/') {
            return self.paths.join(dest);
        }
        dest.to_string()
    }
}
