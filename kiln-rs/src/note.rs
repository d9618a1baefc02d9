//! Note records produced by the vault scanner.

use crate::error::Result;
use crate::parser::{
    frontmatter_tags, parse_all_links, parse_frontmatter, parse_tags, split_frontmatter,
    Frontmatter,
};
use crate::paths::is_content_ext;
use chrono::{DateTime, Local, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// What a vault file is, decided by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteKind {
    Markdown,
    Canvas,
    Base,
    Asset,
}

impl NoteKind {
    pub fn from_ext(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            ".md" => NoteKind::Markdown,
            ".canvas" => NoteKind::Canvas,
            ".base" => NoteKind::Base,
            _ => NoteKind::Asset,
        }
    }

    /// Markdown, canvas and base files become pages; assets are copied.
    pub fn is_content(self) -> bool {
        !matches!(self, NoteKind::Asset)
    }
}

/// One file in the vault.
#[derive(Debug, Clone, Serialize)]
pub struct Note {
    /// Location on disk.
    #[serde(skip)]
    pub path: PathBuf,
    /// Path relative to the vault root, always with forward slashes.
    pub rel_path: String,
    /// Extension including the dot (`.md`), or empty.
    pub ext: String,
    pub kind: NoteKind,
    /// Display name: the file name, minus the extension for content kinds.
    pub name: String,
    /// File name with extension.
    pub file_name: String,
    /// Parent folder relative path, `.` at the vault root.
    pub folder: String,
    pub size: u64,
    pub created: NaiveDateTime,
    pub modified: NaiveDateTime,
    pub frontmatter: Frontmatter,
    /// Markdown body without frontmatter (raw YAML for `.base` files).
    #[serde(skip)]
    pub body: String,
    /// Outgoing `[[...]]` tokens. Embeds appear here too, without the `!`.
    pub links: Vec<String>,
    pub embeds: Vec<String>,
    pub tags: BTreeSet<String>,
    /// `[[Name]]` references to the notes linking here.
    pub backlinks: Vec<String>,
    /// Public address, filled in when the vault is assembled.
    pub web_path: String,
    #[serde(skip)]
    pub out_path: PathBuf,
}

impl Note {
    /// Record for a file with no parsed content.
    fn bare(rel_path: &str, size: u64) -> Self {
        let rel_path = rel_path.trim_start_matches("./").to_string();
        let (folder, file_name) = match rel_path.rsplit_once('/') {
            Some((dir, file)) => (dir.to_string(), file.to_string()),
            None => (".".to_string(), rel_path.clone()),
        };
        let ext = match file_name.rfind('.') {
            Some(i) if i > 0 => file_name[i..].to_string(),
            _ => String::new(),
        };
        let kind = NoteKind::from_ext(&ext);
        let name = if kind.is_content() {
            file_name[..file_name.len() - ext.len()].to_string()
        } else {
            file_name.clone()
        };

        Self {
            path: PathBuf::from(&rel_path),
            rel_path,
            ext,
            kind,
            name,
            file_name,
            folder,
            size,
            created: NaiveDateTime::default(),
            modified: NaiveDateTime::default(),
            frontmatter: Frontmatter::new(),
            body: String::new(),
            links: Vec::new(),
            embeds: Vec::new(),
            tags: BTreeSet::new(),
            backlinks: Vec::new(),
            web_path: String::new(),
            out_path: PathBuf::new(),
        }
    }

    /// Build a note from its relative path and raw content.
    ///
    /// Markdown content is split into frontmatter and body and scanned for
    /// links, embeds and tags. Other content kinds keep the raw text as body.
    pub fn new(rel_path: &str, content: &str) -> Self {
        let mut note = Self::bare(rel_path, content.len() as u64);
        match note.kind {
            NoteKind::Markdown => note.read_markdown(content),
            NoteKind::Canvas | NoteKind::Base => note.body = content.to_string(),
            NoteKind::Asset => {}
        }
        note
    }

    /// Build a record for a binary asset.
    pub fn asset(rel_path: &str, size: u64) -> Self {
        Self::bare(rel_path, size)
    }

    /// Load a file from disk, including its timestamps.
    pub fn load(vault_root: &Path, relative_path: &Path) -> Result<Self> {
        let full_path = vault_root.join(relative_path);
        let rel_path = to_rel_string(relative_path);
        let metadata = std::fs::metadata(&full_path)?;

        let ext = relative_path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let mut note = if is_content_ext(&ext) {
            let content = match String::from_utf8(std::fs::read(&full_path)?) {
                Ok(content) => content,
                Err(e) => {
                    log::warn!("{} is not valid UTF-8, replacing invalid bytes", rel_path);
                    String::from_utf8_lossy(e.as_bytes()).into_owned()
                }
            };
            let mut note = Self::new(&rel_path, &content);
            note.size = metadata.len();
            note
        } else {
            Self::asset(&rel_path, metadata.len())
        };

        let modified = metadata.modified().ok().map(local_time);
        let created = metadata.created().ok().map(local_time);
        note.modified = modified.unwrap_or_default();
        note.created = created.or(modified).unwrap_or_default();
        note.path = full_path;
        Ok(note)
    }

    /// Override the timestamps.
    pub fn with_times(mut self, created: NaiveDateTime, modified: NaiveDateTime) -> Self {
        self.created = created;
        self.modified = modified;
        self
    }

    /// Point the record at its on-disk location.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    fn read_markdown(&mut self, content: &str) {
        let split = split_frontmatter(content);
        if let Some(yaml) = split.yaml {
            match parse_frontmatter(yaml, Path::new(&self.rel_path)) {
                Ok(frontmatter) => self.frontmatter = frontmatter,
                Err(e) => log::warn!("{}", e),
            }
        }
        self.body = split.content.trim().to_string();

        for link in parse_all_links(&self.body) {
            let token = link.token();
            if link.embed {
                self.embeds.push(token.clone());
            }
            self.links.push(token);
        }

        self.tags.extend(frontmatter_tags(&self.frontmatter));
        self.tags
            .extend(parse_tags(&self.body).into_iter().map(|tag| tag.name));
    }

    /// Whether this note carries `tag`, ignoring case and a leading `#`.
    pub fn has_tag(&self, tag: &str) -> bool {
        let wanted = tag.trim_start_matches('#').to_lowercase();
        self.tags
            .iter()
            .any(|t| t.trim_start_matches('#').to_lowercase() == wanted)
    }

    /// The note's `[[Name]]` reference as it appears in backlink lists.
    pub fn reference(&self) -> String {
        format!("[[{}]]", self.name)
    }
}

/// Relative path as a forward-slash string.
pub fn to_rel_string(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .filter(|c| c != ".")
        .collect::<Vec<_>>()
        .join("/")
}

fn local_time(time: SystemTime) -> NaiveDateTime {
    DateTime::<Local>::from(time).naive_local()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_markdown_note() {
        let content = "---\ntitle: Hello\ntags: [project]\n---\n\n# Hello\n\nSee [[Other|o]] and ![[pic.png]] #draft\n";
        let note = Note::new("Projects/Hello World.md", content);

        assert_eq!(note.kind, NoteKind::Markdown);
        assert_eq!(note.name, "Hello World");
        assert_eq!(note.file_name, "Hello World.md");
        assert_eq!(note.folder, "Projects");
        assert_eq!(note.ext, ".md");
        assert!(note.body.starts_with("# Hello"));
        assert_eq!(note.links, vec!["[[Other|o]]", "[[pic.png]]"]);
        assert_eq!(note.embeds, vec!["[[pic.png]]"]);
        assert!(note.tags.contains("project"));
        assert!(note.tags.contains("#draft"));
        assert_eq!(note.frontmatter["title"].as_str(), Some("Hello"));
    }

    #[test]
    fn test_root_note_folder() {
        let note = Note::new("index.md", "home");
        assert_eq!(note.folder, ".");
        assert_eq!(note.name, "index");
    }

    #[test]
    fn test_invalid_frontmatter_is_not_fatal() {
        let note = Note::new("bad.md", "---\nkey: [unclosed\n---\nbody [[Link]]");
        assert!(note.frontmatter.is_empty());
        assert_eq!(note.body, "body [[Link]]");
        assert_eq!(note.links, vec!["[[Link]]"]);
    }

    #[test]
    fn test_asset_keeps_extension_in_name() {
        let note = Note::asset("img/Cat.PNG", 10);
        assert_eq!(note.kind, NoteKind::Asset);
        assert_eq!(note.name, "Cat.PNG");
        assert_eq!(note.ext, ".PNG");
    }

    #[test]
    fn test_canvas_and_base_drop_extension() {
        assert_eq!(Note::new("Board.canvas", "{}").name, "Board");
        let base = Note::new("Views/Tasks.base", "views: []");
        assert_eq!(base.name, "Tasks");
        assert_eq!(base.kind, NoteKind::Base);
        assert_eq!(base.body, "views: []");
    }

    #[test]
    fn test_has_tag() {
        let note = Note::new("a.md", "#Foo and #foobar");
        assert!(note.has_tag("foo"));
        assert!(note.has_tag("#FOO"));
        assert!(!note.has_tag("fo"));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/Note.md"), "text [[A]]").unwrap();

        let note = Note::load(dir.path(), Path::new("sub/Note.md")).unwrap();
        assert_eq!(note.rel_path, "sub/Note.md");
        assert_eq!(note.size, 10);
        assert_eq!(note.path, dir.path().join("sub/Note.md"));
        assert!(note.modified > NaiveDateTime::default());
        assert!(note.created > NaiveDateTime::default());
    }
}
