//! View command implementation.

use crate::cli::args::ViewArgs;
use crate::cli::output::Output;
use crate::config::BuildConfig;
use crate::error::{KilnError, Result};
use crate::note::NoteKind;
use crate::query::{apply_view, render_view, BaseFile};
use crate::vault::Vault;

pub fn run(config: &BuildConfig, args: &ViewArgs, output: &Output) -> Result<()> {
    let vault = Vault::scan(config)?;
    let note = vault.require_note(&args.file)?;
    if note.kind != NoteKind::Base {
        return Err(KilnError::InvalidBase {
            path: note.path.clone(),
            message: "not a .base file".to_string(),
        });
    }

    let base = BaseFile::parse(&note.body, &note.path)?;
    let view = match args.name {
        Some(ref name) => Some(
            base.view(Some(name.as_str()))
                .ok_or_else(|| KilnError::InvalidBase {
                    path: note.path.clone(),
                    message: format!("no view named {:?}", name),
                })?,
        ),
        None => base.view(None),
    };

    let result = apply_view(&vault.notes, &base, view);
    if args.html {
        output.print_raw(&render_view(&result));
        Ok(())
    } else {
        output.print(&result)
    }
}
