//! Resolve command implementation.

use crate::cli::args::ResolveArgs;
use crate::cli::output::Output;
use crate::config::BuildConfig;
use crate::error::{KilnError, Result};
use crate::graph::{LinkResolver, NoteIndex};
use crate::vault::Vault;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub token: String,
    pub path: String,
    pub address: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub fragment: String,
    pub href: String,
    /// Every note sharing the target's name, in disambiguation order.
    pub candidates: Vec<String>,
}

pub fn run(config: &BuildConfig, args: &ResolveArgs, output: &Output) -> Result<()> {
    let vault = Vault::scan(config)?;
    let index = NoteIndex::build(&vault.notes);
    let resolver = LinkResolver::new(&vault.notes, &index);

    let token = args.token.trim_start_matches('!');
    let token = token.trim_start_matches("[[").trim_end_matches("]]");
    let token = token.split('|').next().unwrap_or(token);

    let resolution = resolver
        .find(token)
        .ok_or_else(|| KilnError::NoteNotFound(args.token.clone()))?;

    let name = &vault.notes[resolution.note].name;
    let candidates = index
        .candidates(&name.to_lowercase())
        .unwrap_or_default()
        .iter()
        .map(|&i| vault.notes[i].rel_path.clone())
        .collect();

    let response = ResolveResponse {
        token: args.token.clone(),
        path: vault.notes[resolution.note].rel_path.clone(),
        href: resolution.href(),
        address: resolution.address,
        fragment: resolution.fragment,
        candidates,
    };
    output.print(&response)
}
