//! The generation pipeline: scan, link, render, write.

use crate::config::BuildConfig;
use crate::error::{KilnError, Result};
use crate::graph::{BacklinkIndex, Graph, GraphBuilder, GraphEdge, LinkResolver, NoteIndex};
use crate::note::{Note, NoteKind};
use crate::query::{render_base, BaseFile};
use crate::render::{escape_html, FsLoader, Renderer, SourceLoader};
use crate::vault::Vault;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const GRAPH_FILE: &str = "graph.json";

/// One rendered page.
#[derive(Debug, Clone)]
pub struct Page {
    /// Index into [`Vault::notes`].
    pub note: usize,
    pub out_path: PathBuf,
    pub html: String,
}

/// A fully built site, ready to be written.
#[derive(Debug)]
pub struct Site {
    pub config: BuildConfig,
    pub vault: Vault,
    pub pages: Vec<Page>,
    pub graph: Graph,
}

/// Counts reported after writing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriteSummary {
    pub pages: usize,
    pub folders: usize,
    pub tags: usize,
    pub assets: usize,
}

impl Site {
    /// Scan the vault and build every page.
    pub fn build(config: BuildConfig) -> Result<Self> {
        let vault = Vault::scan(&config)?;
        Ok(Self::from_vault(config, vault, &FsLoader))
    }

    /// Build from an already assembled vault, reading embed sources through
    /// `loader`.
    pub fn from_vault(config: BuildConfig, mut vault: Vault, loader: &dyn SourceLoader) -> Self {
        let backlinks = BacklinkIndex::build(&vault.notes);
        let added = backlinks.apply(&mut vault.notes);
        log::info!("Recorded {} backlinks", added);

        let index = NoteIndex::build(&vault.notes);
        let resolver = LinkResolver::new(&vault.notes, &index);
        let renderer = Renderer::new(resolver, &vault.paths, loader, config.max_embed_depth);

        let header = site_header(&config, &vault);
        let mut pages = Vec::new();
        let mut edges: Vec<GraphEdge> = Vec::new();
        for (i, note) in vault.notes.iter().enumerate() {
            let body = match note.kind {
                NoteKind::Markdown => {
                    let rendered = renderer.render_note(note);
                    edges.extend(rendered.edges);
                    rendered.html
                }
                NoteKind::Base => match BaseFile::parse(&note.body, &note.path) {
                    Ok(base) => render_base(&vault.notes, &base),
                    Err(e) => {
                        log::warn!("{}", e);
                        continue;
                    }
                },
                NoteKind::Canvas => {
                    let rendered = renderer.render_canvas(note);
                    edges.extend(rendered.edges);
                    rendered.html
                }
                NoteKind::Asset => continue,
            };

            let html = format!(
                "{}{}<article class=\"note\">\n<h1 class=\"note-title\">{}</h1>\n{}{}</article>\n",
                header,
                breadcrumbs_html(&vault, note),
                escape_html(&note.name),
                body,
                backlinks_html(note, resolver)
            );
            pages.push(Page {
                note: i,
                out_path: note.out_path.clone(),
                html,
            });
        }
        log::info!("Rendered {} pages, recorded {} links", pages.len(), edges.len());

        let graph = GraphBuilder::build(&vault, &edges);
        Self {
            config,
            vault,
            pages,
            graph,
        }
    }

    /// Write pages, folder and tag listings, assets and `graph.json`.
    pub fn write(&self) -> Result<WriteSummary> {
        let out = &self.config.output_dir;
        fs::create_dir_all(out).map_err(|source| KilnError::OutputDir {
            path: out.clone(),
            source,
        })?;

        let header = site_header(&self.config, &self.vault);
        let mut summary = WriteSummary::default();

        for page in &self.pages {
            write_file(&page.out_path, page.html.as_bytes())?;
            summary.pages += 1;
        }

        for folder in self.vault.folders.values() {
            if folder.index_note.is_some() {
                continue;
            }
            let mut items: Vec<(String, String)> = folder
                .folders
                .iter()
                .filter_map(|child| self.vault.folders.get(child))
                .map(|child| (child.web_path.clone(), format!("{}/", child.name)))
                .collect();
            items.extend(folder.notes.iter().map(|&i| {
                let note = &self.vault.notes[i];
                (note.web_path.clone(), note.name.clone())
            }));
            let html = header.clone() + &listing_html("folder", &folder.name, &items);
            write_file(&folder.out_path, html.as_bytes())?;
            summary.folders += 1;
        }

        for tag in self.vault.tags.values() {
            let items: Vec<(String, String)> = tag
                .notes
                .iter()
                .map(|&i| {
                    let note = &self.vault.notes[i];
                    (note.web_path.clone(), note.name.clone())
                })
                .collect();
            let html = header.clone() + &listing_html("tag", &format!("#{}", tag.name), &items);
            write_file(&tag.out_path, html.as_bytes())?;
            summary.tags += 1;
        }

        for note in &self.vault.notes {
            if note.kind != NoteKind::Asset {
                continue;
            }
            if let Some(parent) = note.out_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(&note.path, &note.out_path)?;
            summary.assets += 1;
        }

        let graph = serde_json::to_string(&self.graph)?;
        write_file(&out.join(GRAPH_FILE), graph.as_bytes())?;

        log::info!(
            "Wrote {} pages, {} folder pages, {} tag pages and {} assets to {}",
            summary.pages,
            summary.folders,
            summary.tags,
            summary.assets,
            out.display()
        );
        Ok(summary)
    }

    /// The rendered page of a note, if it has one.
    pub fn page(&self, note: usize) -> Option<&Page> {
        self.pages.iter().find(|p| p.note == note)
    }
}

fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    log::debug!("Wrote {}", path.display());
    Ok(())
}

fn site_header(config: &BuildConfig, vault: &Vault) -> String {
    format!(
        "<header class=\"site-header\"><a href=\"{}\" class=\"site-name\">{}</a></header>\n",
        escape_html(vault.paths.prefix()),
        escape_html(&config.site_name)
    )
}

fn breadcrumbs_html(vault: &Vault, note: &Note) -> String {
    let crumbs = vault.breadcrumbs(note);
    if crumbs.is_empty() {
        return String::new();
    }
    let links: Vec<String> = crumbs
        .iter()
        .map(|c| {
            format!(
                "<a href=\"{}\">{}</a>",
                escape_html(&c.url),
                escape_html(&c.label)
            )
        })
        .collect();
    format!("<nav class=\"breadcrumbs\">{}</nav>\n", links.join(" / "))
}

fn backlinks_html(note: &Note, resolver: LinkResolver<'_>) -> String {
    if note.backlinks.is_empty() {
        return String::new();
    }
    let mut html = String::from("<ul class=\"backlinks\">\n");
    for reference in &note.backlinks {
        let name = reference.trim_start_matches("[[").trim_end_matches("]]");
        let item = match resolver.find(name) {
            Some(resolution) => format!(
                "<a href=\"{}\" class=\"internal-link\">{}</a>",
                escape_html(&resolution.href()),
                escape_html(name)
            ),
            None => escape_html(name),
        };
        html.push_str(&format!("<li>{}</li>\n", item));
    }
    html.push_str("</ul>\n");
    html
}

fn listing_html(kind: &str, title: &str, items: &[(String, String)]) -> String {
    let mut html = format!(
        "<article class=\"{kind}-page\">\n<h1 class=\"note-title\">{}</h1>\n<ul class=\"{kind}-items\">\n",
        escape_html(title)
    );
    for (href, label) in items {
        html.push_str(&format!(
            "<li><a href=\"{}\" class=\"internal-link\">{}</a></li>\n",
            escape_html(href),
            escape_html(label)
        ));
    }
    html.push_str("</ul>\n</article>\n");
    html
}
