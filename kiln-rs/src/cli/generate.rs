//! Generate command implementation.

use crate::cli::args::GenerateArgs;
use crate::cli::output::Output;
use crate::config::BuildConfig;
use crate::error::Result;
use crate::note::NoteKind;
use crate::site::{Site, WriteSummary};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub output_dir: String,
    pub dry_run: bool,
    pub pages: usize,
    pub folders: usize,
    pub tags: usize,
    pub assets: usize,
    pub graph_nodes: usize,
    pub graph_links: usize,
}

pub fn run(config: &BuildConfig, args: &GenerateArgs, output: &Output) -> Result<()> {
    let site = Site::build(config.clone())?;

    let summary = if args.dry_run {
        WriteSummary {
            pages: site.pages.len(),
            folders: site
                .vault
                .folders
                .values()
                .filter(|f| f.index_note.is_none())
                .count(),
            tags: site.vault.tags.len(),
            assets: site
                .vault
                .notes
                .iter()
                .filter(|n| n.kind == NoteKind::Asset)
                .count(),
        }
    } else {
        site.write()?
    };

    output.info(&format!(
        "{} {} pages into {}",
        if args.dry_run { "Would write" } else { "Wrote" },
        summary.pages,
        config.output_dir.display()
    ));

    output.print(&GenerateResponse {
        output_dir: config.output_dir.display().to_string(),
        dry_run: args.dry_run,
        pages: summary.pages,
        folders: summary.folders,
        tags: summary.tags,
        assets: summary.assets,
        graph_nodes: site.graph.nodes.len(),
        graph_links: site.graph.links.len(),
    })
}
