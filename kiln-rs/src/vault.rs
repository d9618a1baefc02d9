//! Vault scanning: notes, folders and tags for one build.

use crate::config::{BuildConfig, VAULT_CONFIG_FILE};
use crate::error::{KilnError, Result};
use crate::note::{to_rel_string, Note};
use crate::paths::{slug_path, Paths};
use crate::types::Breadcrumb;
use glob::glob;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A directory in the vault. The vault root has no folder record.
#[derive(Debug, Clone, Serialize)]
pub struct Folder {
    pub rel_path: String,
    pub name: String,
    pub web_path: String,
    #[serde(skip)]
    pub out_path: PathBuf,
    /// Indexes into [`Vault::notes`] of content files directly inside.
    pub notes: Vec<usize>,
    /// Relative paths of direct sub-folders, sorted by name.
    pub folders: Vec<String>,
    /// Index of the folder's own `index` note, which stands in for a folder page.
    pub index_note: Option<usize>,
}

/// Every note carrying one tag.
#[derive(Debug, Clone, Serialize)]
pub struct TagPage {
    /// Tag name without the `#`.
    pub name: String,
    pub web_path: String,
    #[serde(skip)]
    pub out_path: PathBuf,
    pub notes: Vec<usize>,
}

/// All files of a vault, with computed addresses.
#[derive(Debug, Clone)]
pub struct Vault {
    pub root: PathBuf,
    pub paths: Paths,
    /// Sorted by relative path.
    pub notes: Vec<Note>,
    pub folders: BTreeMap<String, Folder>,
    pub tags: BTreeMap<String, TagPage>,
}

impl Vault {
    /// Walk the vault directory and build every record.
    pub fn scan(config: &BuildConfig) -> Result<Self> {
        let root = &config.input_dir;
        if !root.is_dir() {
            return Err(KilnError::VaultNotFound(root.clone()));
        }
        let paths = Paths::new(config)?;
        let skip_dir = std::fs::canonicalize(&config.output_dir).ok();

        let pattern_str = format!("{}/**/*", glob::Pattern::escape(&root.to_string_lossy()));

        let mut notes = Vec::new();
        let mut dirs = Vec::new();

        for entry in glob(&pattern_str)? {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    log::warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            let Ok(relative) = path.strip_prefix(root) else {
                continue;
            };
            if is_hidden(relative) || relative == Path::new(VAULT_CONFIG_FILE) {
                continue;
            }
            if let Some(ref skip) = skip_dir {
                if std::fs::canonicalize(&path).is_ok_and(|p| p.starts_with(skip)) {
                    continue;
                }
            }

            if path.is_dir() {
                dirs.push(to_rel_string(relative));
                continue;
            }

            let note = Note::load(root, relative)?;
            log::debug!("Scanned {} ({:?})", note.rel_path, note.kind);
            notes.push(note);
        }

        let vault = Self::assemble(root.clone(), paths, notes, dirs);
        log::info!(
            "Scanned {} files, {} folders, {} tags",
            vault.notes.len(),
            vault.folders.len(),
            vault.tags.len()
        );
        Ok(vault)
    }

    /// Build a vault from in-memory records.
    pub fn from_notes(root: impl Into<PathBuf>, paths: Paths, notes: Vec<Note>) -> Self {
        Self::assemble(root.into(), paths, notes, Vec::new())
    }

    fn assemble(root: PathBuf, paths: Paths, mut notes: Vec<Note>, dirs: Vec<String>) -> Self {
        notes.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));

        for note in notes.iter_mut() {
            let slug = slug_path(&note.rel_path);
            note.web_path = paths.page_address(&slug, &note.ext);
            note.out_path = paths.page_output(&slug, &note.ext);
            if note.path.is_relative() {
                note.path = root.join(&note.rel_path);
            }
        }

        // Folders: every scanned directory plus every ancestor of a note
        let mut folder_paths: Vec<String> = dirs;
        for note in &notes {
            let mut folder = note.folder.as_str();
            while folder != "." {
                folder_paths.push(folder.to_string());
                folder = match folder.rsplit_once('/') {
                    Some((parent, _)) => parent,
                    None => ".",
                };
            }
        }

        let mut folders: BTreeMap<String, Folder> = BTreeMap::new();
        for rel_path in folder_paths {
            if folders.contains_key(&rel_path) {
                continue;
            }
            let slug = slug_path(&rel_path);
            let name = rel_path.rsplit('/').next().unwrap_or(&rel_path).to_string();
            folders.insert(
                rel_path.clone(),
                Folder {
                    web_path: paths.folder_address(&slug),
                    out_path: paths.folder_output(&slug),
                    rel_path,
                    name,
                    notes: Vec::new(),
                    folders: Vec::new(),
                    index_note: None,
                },
            );
        }

        for (i, note) in notes.iter().enumerate() {
            if !note.kind.is_content() {
                continue;
            }
            if let Some(folder) = folders.get_mut(&note.folder) {
                folder.notes.push(i);
                if note.name.eq_ignore_ascii_case("index") {
                    folder.index_note = Some(i);
                }
            }
        }

        let children: Vec<(String, String)> = folders
            .values()
            .filter_map(|f| {
                let (parent, _) = f.rel_path.rsplit_once('/')?;
                Some((parent.to_string(), f.rel_path.clone()))
            })
            .collect();
        for (parent, child) in children {
            if let Some(folder) = folders.get_mut(&parent) {
                folder.folders.push(child);
            }
        }
        for folder in folders.values_mut() {
            folder
                .folders
                .sort_by(|a, b| folder_name(a).cmp(folder_name(b)));
        }

        let mut tags: BTreeMap<String, TagPage> = BTreeMap::new();
        for (i, note) in notes.iter().enumerate() {
            for tag in &note.tags {
                let name = tag.trim_start_matches('#');
                if name.is_empty() {
                    continue;
                }
                let page = tags.entry(name.to_string()).or_insert_with(|| TagPage {
                    name: name.to_string(),
                    web_path: paths.tag_address(name),
                    out_path: paths.tag_output(name),
                    notes: Vec::new(),
                });
                if !page.notes.contains(&i) {
                    page.notes.push(i);
                }
            }
        }

        Self {
            root,
            paths,
            notes,
            folders,
            tags,
        }
    }

    /// Navigation from the site root to a note.
    pub fn breadcrumbs(&self, note: &Note) -> Vec<Breadcrumb> {
        let mut crumbs = vec![Breadcrumb {
            label: "Home".to_string(),
            url: self.paths.prefix().to_string(),
        }];

        if note.folder != "." {
            let mut current = String::new();
            for part in note.folder.split('/') {
                if !current.is_empty() {
                    current.push('/');
                }
                current.push_str(part);
                crumbs.push(Breadcrumb {
                    label: part.to_string(),
                    url: self.paths.folder_address(&slug_path(&current)),
                });
            }
        }

        if !note.name.eq_ignore_ascii_case("index") {
            crumbs.push(Breadcrumb {
                label: note.name.clone(),
                url: note.web_path.clone(),
            });
        }

        crumbs
    }

    /// Find a note by relative path (with or without extension) or by name.
    pub fn find_note(&self, query: &str) -> Option<usize> {
        let query = query.trim().trim_start_matches("./");
        let lower = query.to_lowercase();

        self.notes
            .iter()
            .position(|n| n.rel_path == query)
            .or_else(|| {
                self.notes.iter().position(|n| {
                    n.kind.is_content()
                        && n.rel_path[..n.rel_path.len() - n.ext.len()].eq_ignore_ascii_case(query)
                })
            })
            .or_else(|| {
                self.notes
                    .iter()
                    .position(|n| n.name.to_lowercase() == lower)
            })
    }

    /// Like [`Vault::find_note`], but a miss is an error.
    pub fn require_note(&self, query: &str) -> Result<&Note> {
        self.find_note(query)
            .map(|i| &self.notes[i])
            .ok_or_else(|| KilnError::NoteNotFound(query.to_string()))
    }
}

fn is_hidden(relative: &Path) -> bool {
    relative
        .components()
        .any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
}

fn folder_name(rel_path: &str) -> &str {
    rel_path.rsplit('/').next().unwrap_or(rel_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigOverrides;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn make_vault(notes: Vec<Note>) -> Vault {
        let paths = Paths::from_parts("", "public", false).unwrap();
        Vault::from_notes("/vault", paths, notes)
    }

    #[test]
    fn test_notes_sorted_with_addresses() {
        let vault = make_vault(vec![
            Note::new("b/Second Note.md", ""),
            Note::new("a.md", ""),
            Note::asset("img/cat.png", 3),
        ]);
        let rels: Vec<_> = vault.notes.iter().map(|n| n.rel_path.as_str()).collect();
        assert_eq!(rels, vec!["a.md", "b/Second Note.md", "img/cat.png"]);
        assert_eq!(vault.notes[1].web_path, "/b/second-note");
        assert_eq!(vault.notes[2].web_path, "/img/cat.png");
        assert_eq!(vault.notes[1].path, PathBuf::from("/vault/b/Second Note.md"));
    }

    #[test]
    fn test_folders_and_children() {
        let vault = make_vault(vec![
            Note::new("docs/guides/Setup.md", ""),
            Note::new("docs/Intro.md", ""),
            Note::new("docs/api/index.md", ""),
            Note::asset("docs/logo.png", 1),
        ]);

        let keys: Vec<_> = vault.folders.keys().cloned().collect();
        assert_eq!(keys, vec!["docs", "docs/api", "docs/guides"]);

        let docs = &vault.folders["docs"];
        assert_eq!(docs.web_path, "/docs");
        assert_eq!(docs.folders, vec!["docs/api", "docs/guides"]);
        // The asset isn't a folder child
        assert_eq!(docs.notes.len(), 1);
        assert_eq!(vault.notes[docs.notes[0]].name, "Intro");

        let api = &vault.folders["docs/api"];
        assert!(api.index_note.is_some());
    }

    #[test]
    fn test_tags_merge_with_and_without_hash() {
        let vault = make_vault(vec![
            Note::new("a.md", "---\ntags: [rust]\n---\nbody"),
            Note::new("b.md", "about #rust and #cli"),
        ]);
        let keys: Vec<_> = vault.tags.keys().cloned().collect();
        assert_eq!(keys, vec!["cli", "rust"]);
        assert_eq!(vault.tags["rust"].notes, vec![0, 1]);
        assert_eq!(vault.tags["rust"].web_path, "/tags/rust");
    }

    #[test]
    fn test_breadcrumbs() {
        let vault = make_vault(vec![
            Note::new("Docs/My Guides/Setup.md", ""),
            Note::new("Docs/index.md", ""),
        ]);
        let setup = &vault.notes[vault.find_note("Setup").unwrap()];
        let crumbs = vault.breadcrumbs(setup);
        let pairs: Vec<_> = crumbs.iter().map(|c| (c.label.as_str(), c.url.as_str())).collect();
        assert_eq!(
            pairs,
            vec![
                ("Home", "/"),
                ("Docs", "/docs"),
                ("My Guides", "/docs/my-guides"),
                ("Setup", "/docs/my-guides/setup"),
            ]
        );

        let index = &vault.notes[vault.find_note("Docs/index").unwrap()];
        assert_eq!(vault.breadcrumbs(index).len(), 2);
    }

    #[test]
    fn test_find_note() {
        let vault = make_vault(vec![Note::new("x/Alpha.md", ""), Note::new("Beta.md", "")]);
        assert_eq!(vault.find_note("x/Alpha.md"), Some(0));
        assert_eq!(vault.find_note("x/alpha"), Some(0));
        assert_eq!(vault.find_note("beta"), Some(1));
        assert!(vault.find_note("gamma").is_none());
        assert!(matches!(vault.require_note("gamma"), Err(KilnError::NoteNotFound(_))));
    }

    #[test]
    fn test_scan_skips_hidden_and_output() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join(".obsidian")).unwrap();
        std::fs::create_dir_all(root.join("notes/empty")).unwrap();
        std::fs::create_dir_all(root.join("public")).unwrap();
        std::fs::write(root.join(".obsidian/app.json"), "{}").unwrap();
        std::fs::write(root.join("notes/One.md"), "# One\n[[Two]]").unwrap();
        std::fs::write(root.join("Two.md"), "two").unwrap();
        std::fs::write(root.join("public/old.html"), "stale").unwrap();
        std::fs::write(root.join(VAULT_CONFIG_FILE), "site_name = \"T\"").unwrap();

        let overrides = ConfigOverrides {
            output_dir: Some(root.join("public")),
            ..ConfigOverrides::default()
        };
        let config = BuildConfig::load_with_global(root, None, &overrides).unwrap();
        let vault = Vault::scan(&config).unwrap();

        let rels: Vec<_> = vault.notes.iter().map(|n| n.rel_path.as_str()).collect();
        assert_eq!(rels, vec!["Two.md", "notes/One.md"]);
        assert!(vault.folders.contains_key("notes/empty"));
        assert!(!vault.folders.contains_key("public"));
        assert_eq!(vault.notes[1].links, vec!["[[Two]]"]);
    }

    #[test]
    fn test_scan_survives_invalid_utf8() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        std::fs::write(root.join("Good.md"), "fine").unwrap();
        std::fs::write(root.join("Latin1.md"), b"caf\xe9 [[Good]]").unwrap();

        let config =
            BuildConfig::load_with_global(root, None, &ConfigOverrides::default()).unwrap();
        let vault = Vault::scan(&config).unwrap();

        let latin1 = &vault.notes[vault.find_note("Latin1").unwrap()];
        assert_eq!(latin1.body, "caf\u{FFFD} [[Good]]");
        assert_eq!(latin1.links, vec!["[[Good]]"]);
    }
}
