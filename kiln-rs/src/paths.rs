//! Public addresses and output locations.
//!
//! Every vault path is slugified segment by segment (lower-case, spaces to
//! `-`). Addresses are prefixed with the path part of the configured base URL;
//! output paths live under the output directory.

use crate::config::BuildConfig;
use crate::error::{KilnError, Result};
use std::path::PathBuf;
use url::Url;

/// Extensions of files that become HTML pages.
pub const CONTENT_EXTENSIONS: [&str; 3] = [".md", ".canvas", ".base"];

/// Whether `ext` (with its dot) is one of the page-producing extensions.
pub fn is_content_ext(ext: &str) -> bool {
    CONTENT_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext))
}

/// Slugify one path segment: `My Note.md` becomes `my-note.md`.
pub fn slug_segment(segment: &str) -> String {
    segment.to_lowercase().replace(' ', "-")
}

/// Slugify every segment of a forward-slash relative path.
pub fn slug_path(rel_path: &str) -> String {
    rel_path
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .map(slug_segment)
        .collect::<Vec<_>>()
        .join("/")
}

/// Join URL path parts, dropping empty and `.` segments. Always absolute.
pub fn join_url(prefix: &str, rel: &str) -> String {
    let segments: Vec<&str> = prefix
        .split('/')
        .chain(rel.split('/'))
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();
    format!("/{}", segments.join("/"))
}

/// Extract the address prefix from a base URL.
///
/// `https://x.com/notes/` gives `/notes`, an empty base gives `/`. A value
/// that isn't an absolute URL is taken as a bare path.
pub fn path_prefix(base_url: &str) -> Result<String> {
    let base_url = base_url.trim();
    if base_url.is_empty() {
        return Ok("/".to_string());
    }

    let path = match Url::parse(base_url) {
        Ok(url) => url.path().to_string(),
        Err(url::ParseError::RelativeUrlWithoutBase) => base_url.to_string(),
        Err(e) => {
            return Err(KilnError::ConfigError(format!(
                "invalid base_url {:?}: {}",
                base_url, e
            )));
        }
    };

    Ok(join_url(&path, ""))
}

/// Address and output-path calculator for one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    prefix: String,
    output_dir: PathBuf,
    flat_urls: bool,
}

impl Paths {
    pub fn new(config: &BuildConfig) -> Result<Self> {
        Self::from_parts(&config.base_url, config.output_dir.clone(), config.flat_urls)
    }

    pub fn from_parts(base_url: &str, output_dir: impl Into<PathBuf>, flat_urls: bool) -> Result<Self> {
        Ok(Self {
            prefix: path_prefix(base_url)?,
            output_dir: output_dir.into(),
            flat_urls,
        })
    }

    /// The site root address.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn output_dir(&self) -> &PathBuf {
        &self.output_dir
    }

    /// Join a vault-absolute path (`/docs/a`) onto the prefix.
    pub fn join(&self, rel: &str) -> String {
        join_url(&self.prefix, rel)
    }

    /// Public address of a file, given its slug path and extension.
    ///
    /// Content extensions are dropped and `index` pages collapse onto their
    /// folder. Assets keep their extension.
    pub fn page_address(&self, slug_path: &str, ext: &str) -> String {
        if !is_content_ext(ext) {
            return self.join(slug_path);
        }

        let stem = strip_ext(slug_path, ext);
        if stem.eq_ignore_ascii_case("index") {
            return self.prefix.clone();
        }
        match stem.strip_suffix("/index") {
            Some(folder) => self.join(folder),
            None => self.join(stem),
        }
    }

    pub fn folder_address(&self, slug_path: &str) -> String {
        self.join(slug_path)
    }

    /// `#example` lives at `/tags/example`.
    pub fn tag_address(&self, tag: &str) -> String {
        self.join(&format!("tags/{}", tag.trim_start_matches('#')))
    }

    /// Where a file lands in the output directory.
    pub fn page_output(&self, slug_path: &str, ext: &str) -> PathBuf {
        if !is_content_ext(ext) {
            return self.output_dir.join(slug_path);
        }

        let stem = strip_ext(slug_path, ext);
        if stem.eq_ignore_ascii_case("index") {
            return self.output_dir.join("index.html");
        }
        if let Some(folder) = stem.strip_suffix("/index") {
            return self.output_dir.join(folder).join("index.html");
        }
        if self.flat_urls {
            self.output_dir.join(stem).join("index.html")
        } else {
            self.output_dir.join(format!("{}.html", stem))
        }
    }

    pub fn folder_output(&self, slug_path: &str) -> PathBuf {
        self.output_dir.join(slug_path).join("index.html")
    }

    pub fn tag_output(&self, tag: &str) -> PathBuf {
        let name = tag.trim_start_matches('#');
        let tags = self.output_dir.join("tags");
        if self.flat_urls {
            tags.join(name).join("index.html")
        } else {
            tags.join(format!("{}.html", name))
        }
    }
}

fn strip_ext<'a>(path: &'a str, ext: &str) -> &'a str {
    let cut = path.len().saturating_sub(ext.len());
    if path.is_char_boundary(cut) && path[cut..].eq_ignore_ascii_case(ext) {
        &path[..cut]
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn paths(base_url: &str, flat: bool) -> Paths {
        Paths::from_parts(base_url, "public", flat).unwrap()
    }

    #[test]
    fn test_slug_path() {
        assert_eq!(slug_path("My Folder/Cool File.md"), "my-folder/cool-file.md");
        assert_eq!(slug_segment("A B C"), "a-b-c");
    }

    #[test]
    fn test_path_prefix() {
        assert_eq!(path_prefix("").unwrap(), "/");
        assert_eq!(path_prefix("https://example.com").unwrap(), "/");
        assert_eq!(path_prefix("https://example.com/notes/").unwrap(), "/notes");
        assert_eq!(path_prefix("/docs").unwrap(), "/docs");
        assert!(path_prefix("https://[broken").is_err());
    }

    #[test]
    fn test_page_addresses() {
        let p = paths("", false);
        assert_eq!(p.page_address("index.md", ".md"), "/");
        assert_eq!(p.page_address("docs/index.md", ".md"), "/docs");
        assert_eq!(p.page_address("docs/my-note.md", ".md"), "/docs/my-note");
        assert_eq!(p.page_address("board.canvas", ".canvas"), "/board");
        assert_eq!(p.page_address("img/cat.png", ".png"), "/img/cat.png");
    }

    #[test]
    fn test_addresses_with_prefix() {
        let p = paths("https://example.com/notes", false);
        assert_eq!(p.page_address("index.md", ".md"), "/notes");
        assert_eq!(p.page_address("a.md", ".md"), "/notes/a");
        assert_eq!(p.folder_address("docs"), "/notes/docs");
        assert_eq!(p.tag_address("#rust"), "/notes/tags/rust");
    }

    #[test]
    fn test_outputs() {
        let p = paths("", false);
        assert_eq!(p.page_output("index.md", ".md"), Path::new("public/index.html"));
        assert_eq!(p.page_output("docs/a.md", ".md"), Path::new("public/docs/a.html"));
        assert_eq!(p.page_output("docs/index.md", ".md"), Path::new("public/docs/index.html"));
        assert_eq!(p.page_output("img/cat.png", ".png"), Path::new("public/img/cat.png"));
        assert_eq!(p.folder_output("docs"), Path::new("public/docs/index.html"));
        assert_eq!(p.tag_output("#rust"), Path::new("public/tags/rust.html"));
    }

    #[test]
    fn test_flat_outputs() {
        let p = paths("", true);
        assert_eq!(p.page_output("docs/a.md", ".md"), Path::new("public/docs/a/index.html"));
        assert_eq!(p.page_output("index.md", ".md"), Path::new("public/index.html"));
        assert_eq!(p.tag_output("rust"), Path::new("public/tags/rust/index.html"));
    }
}
