//! Name index over the notes of one build.

use crate::note::Note;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Maps lower-cased note names to every note carrying that name.
///
/// Candidates keep the order of the note slice they were built from, which
/// the vault sorts by relative path. Disambiguation relies on that order.
#[derive(Debug, Clone, Default)]
pub struct NoteIndex {
    candidates: HashMap<String, Vec<usize>>,
    /// Public address to source file, for re-reading embed targets.
    sources: HashMap<String, PathBuf>,
}

impl NoteIndex {
    pub fn build(notes: &[Note]) -> Self {
        let mut index = NoteIndex::default();
        for (i, note) in notes.iter().enumerate() {
            index
                .candidates
                .entry(note.name.to_lowercase())
                .or_default()
                .push(i);
            index
                .sources
                .insert(note.web_path.clone(), note.path.clone());
        }
        log::debug!(
            "Indexed {} notes under {} names",
            notes.len(),
            index.candidates.len()
        );
        index
    }

    /// Candidates for a lower-cased name, in index order.
    pub fn candidates(&self, key: &str) -> Option<&[usize]> {
        self.candidates.get(key).map(Vec::as_slice)
    }

    /// On-disk source of the note published at `address`.
    pub fn source(&self, address: &str) -> Option<&Path> {
        self.sources.get(address).map(PathBuf::as_path)
    }

    /// Number of distinct names.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}
