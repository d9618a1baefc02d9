//! Reference token resolution.
//!
//! A token such as `Folder/Note#Heading` resolves in these steps:
//! 1. Split off the `#fragment` (kept verbatim, `^` included)
//! 2. Drop a `.md`, `.canvas` or `.base` extension
//! 3. Look up the lower-cased last segment, then the whole lower-cased path
//! 4. Pick one candidate:
//!    - with a folder qualifier, the first whose path ends with it (else the first)
//!    - bare, the root-level candidate (else the shortest path, first wins ties)

use crate::graph::index::NoteIndex;
use crate::graph::link_graph::GraphEdge;
use crate::note::Note;

/// Split a token at its first `#`. The fragment keeps the `#`.
pub fn split_fragment(token: &str) -> (&str, &str) {
    match token.find('#') {
        Some(i) => (&token[..i], &token[i..]),
        None => (token, ""),
    }
}

fn strip_content_ext(dest: &str) -> &str {
    for ext in [".md", ".canvas", ".base"] {
        let cut = dest.len().saturating_sub(ext.len());
        if dest.is_char_boundary(cut) && dest[cut..].eq_ignore_ascii_case(ext) {
            return &dest[..cut];
        }
    }
    dest
}

/// A resolved reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Index of the target in the note slice.
    pub note: usize,
    /// Public address of the target.
    pub address: String,
    /// `#Heading`, `#^block` or empty.
    pub fragment: String,
}

impl Resolution {
    /// Address plus fragment, ready for an `href`.
    pub fn href(&self) -> String {
        format!("{}{}", self.address, self.fragment)
    }
}

/// Collects the edges one note issues while it's being rendered.
#[derive(Debug, Clone, Default)]
pub struct EdgeCollector {
    source: String,
    edges: Vec<GraphEdge>,
}

impl EdgeCollector {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            edges: Vec::new(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Record `source -> target`. Self-loops are dropped.
    pub fn record(&mut self, target: &str) {
        if self.source.is_empty() || target.is_empty() {
            return;
        }
        if self.source.to_lowercase() == target.to_lowercase() {
            return;
        }
        self.edges.push(GraphEdge {
            source: self.source.clone(),
            target: target.to_string(),
        });
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn into_edges(self) -> Vec<GraphEdge> {
        self.edges
    }
}

/// Resolves reference tokens against the note index.
#[derive(Debug, Clone, Copy)]
pub struct LinkResolver<'a> {
    notes: &'a [Note],
    index: &'a NoteIndex,
}

impl<'a> LinkResolver<'a> {
    pub fn new(notes: &'a [Note], index: &'a NoteIndex) -> Self {
        Self { notes, index }
    }

    pub fn notes(&self) -> &'a [Note] {
        self.notes
    }

    pub fn index(&self) -> &'a NoteIndex {
        self.index
    }

    /// Resolve a token without recording anything.
    pub fn find(&self, token: &str) -> Option<Resolution> {
        let token = token.trim().replace('\\', "/");
        let (dest, fragment) = split_fragment(&token);
        let dest = strip_content_ext(dest.trim());
        let lower_dest = dest.to_lowercase();

        let name = lower_dest.rsplit('/').next().unwrap_or(&lower_dest);
        let candidates = self
            .index
            .candidates(name)
            .or_else(|| self.index.candidates(&lower_dest))?;
        let first = *candidates.first()?;

        let chosen = if dest.contains('/') {
            candidates
                .iter()
                .copied()
                .find(|&i| self.comparable_path(i).ends_with(&lower_dest))
                .unwrap_or(first)
        } else {
            self.prefer_shallow(candidates)
        };

        Some(Resolution {
            note: chosen,
            address: self.notes[chosen].web_path.clone(),
            fragment: fragment.to_string(),
        })
    }

    /// Resolve a token and record the edge for content targets.
    pub fn resolve(&self, token: &str, edges: &mut EdgeCollector) -> Option<Resolution> {
        let resolution = self.find(token)?;
        if self.notes[resolution.note].kind.is_content() {
            edges.record(&resolution.address);
        }
        Some(resolution)
    }

    /// Lower-cased relative path, minus the extension for content files.
    fn comparable_path(&self, i: usize) -> String {
        let note = &self.notes[i];
        let rel = if note.kind.is_content() {
            &note.rel_path[..note.rel_path.len() - note.ext.len()]
        } else {
            note.rel_path.as_str()
        };
        rel.to_lowercase()
    }

    fn prefer_shallow(&self, candidates: &[usize]) -> usize {
        if let Some(&root) = candidates
            .iter()
            .find(|&&i| !self.notes[i].rel_path.contains('/'))
        {
            return root;
        }

        let mut best = candidates[0];
        for &i in &candidates[1..] {
            if self.notes[i].rel_path.len() < self.notes[best].rel_path.len() {
                best = i;
            }
        }
        best
    }
}
