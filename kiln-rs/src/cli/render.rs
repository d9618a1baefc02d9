//! Render command implementation.

use crate::cli::args::RenderArgs;
use crate::cli::output::Output;
use crate::config::BuildConfig;
use crate::error::{KilnError, Result};
use crate::site::Site;

pub fn run(config: &BuildConfig, args: &RenderArgs, output: &Output) -> Result<()> {
    let site = Site::build(config.clone())?;
    let page = site
        .vault
        .find_note(&args.note)
        .and_then(|i| site.page(i))
        .ok_or_else(|| KilnError::NoteNotFound(args.note.clone()))?;
    output.print_raw(&page.html);
    Ok(())
}
