//! Graph command implementation.

use crate::cli::args::GraphArgs;
use crate::cli::output::Output;
use crate::config::BuildConfig;
use crate::error::Result;
use crate::graph::Graph;
use crate::site::Site;

pub fn run(config: &BuildConfig, args: &GraphArgs, output: &Output) -> Result<()> {
    let site = Site::build(config.clone())?;

    let Some(ref query) = args.note else {
        return output.print(&site.graph);
    };

    let address = site.vault.require_note(query)?.web_path.clone();
    let links: Vec<_> = site
        .graph
        .outgoing(&address)
        .chain(site.graph.incoming(&address))
        .cloned()
        .collect();
    let nodes = site
        .graph
        .nodes
        .iter()
        .filter(|n| {
            n.id == address || links.iter().any(|e| e.source == n.id || e.target == n.id)
        })
        .cloned()
        .collect();

    output.print(&Graph { nodes, links })
}
