//! Backlinks command implementation.

use crate::cli::args::BacklinksArgs;
use crate::cli::output::Output;
use crate::config::BuildConfig;
use crate::error::Result;
use crate::graph::BacklinkIndex;
use crate::vault::Vault;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct BacklinksResponse {
    pub note: String,
    pub count: usize,
    /// `[[Name]]` references, one per linking note.
    pub backlinks: Vec<String>,
}

pub fn run(config: &BuildConfig, args: &BacklinksArgs, output: &Output) -> Result<()> {
    let mut vault = Vault::scan(config)?;
    BacklinkIndex::build(&vault.notes).apply(&mut vault.notes);

    let note = vault.require_note(&args.note)?;
    let response = BacklinksResponse {
        note: note.rel_path.clone(),
        count: note.backlinks.len(),
        backlinks: note.backlinks.clone(),
    };
    output.print(&response)
}
