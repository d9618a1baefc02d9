//! Backlink inversion.
//!
//! Uses its own name map, separate from [`NoteIndex`](super::NoteIndex): one
//! note per lower-cased name, last one wins. Backlinks therefore ignore folder
//! qualifiers that the resolver would honor.

use crate::note::{Note, NoteKind};
use std::collections::HashMap;

/// Reduce a link token to the key the backlink map is keyed by.
///
/// `![[Folder/My Note.md#Part|alias]]` becomes `my note`.
pub fn clean_reference(token: &str) -> String {
    let s = token.trim();
    let s = s.strip_prefix('!').unwrap_or(s);
    let s = s.strip_prefix("[[").unwrap_or(s);
    let s = s.strip_suffix("]]").unwrap_or(s);
    let s = s.split('|').next().unwrap_or(s);
    let s = s.split('#').next().unwrap_or(s);
    let s = s.rsplit('/').next().unwrap_or(s).trim();
    let lower = s.to_lowercase();
    match lower.strip_suffix(".md") {
        Some(stem) => stem.to_string(),
        None => lower,
    }
}

/// Last-write-wins name map used only for backlinks.
#[derive(Debug, Clone, Default)]
pub struct BacklinkIndex {
    by_name: HashMap<String, usize>,
}

impl BacklinkIndex {
    pub fn build(notes: &[Note]) -> Self {
        let mut by_name = HashMap::new();
        for (i, note) in notes.iter().enumerate() {
            let key = match note.kind {
                NoteKind::Markdown => note.name.to_lowercase(),
                _ => note.file_name.to_lowercase(),
            };
            by_name.insert(key, i);
        }
        Self { by_name }
    }

    /// The note a token points at, if any.
    pub fn lookup(&self, token: &str) -> Option<usize> {
        self.by_name.get(&clean_reference(token)).copied()
    }

    /// Fill every note's `backlinks` list. Returns how many were added.
    pub fn apply(&self, notes: &mut [Note]) -> usize {
        let mut incoming: Vec<Vec<String>> = vec![Vec::new(); notes.len()];

        for (source, note) in notes.iter().enumerate() {
            let reference = note.reference();
            // Embeds are listed among the links as well
            for token in &note.links {
                let Some(target) = self.lookup(token) else {
                    continue;
                };
                if target == source {
                    continue;
                }
                if !incoming[target].contains(&reference) {
                    incoming[target].push(reference.clone());
                }
            }
        }

        let mut added = 0;
        for (note, backlinks) in notes.iter_mut().zip(incoming) {
            added += backlinks.len();
            note.backlinks = backlinks;
        }
        log::debug!("Added {} backlinks", added);
        added
    }
}
