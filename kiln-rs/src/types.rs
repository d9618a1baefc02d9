//! Shared types for Kiln.

use serde::{Deserialize, Serialize};

/// A wikilink or embed found in a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// The text between `[[` and `]]`, untouched.
    pub raw: String,

    /// The target note reference (may carry a folder qualifier or extension).
    pub target: String,

    /// Optional display alias (the part after |).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    /// Optional heading reference (the part after #, when it doesn't start with ^).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,

    /// Optional block reference (the part after #^).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,

    /// Whether this is an embed (![[...]]) rather than a link.
    pub embed: bool,

    /// Line number where this link appears (1-indexed).
    pub line: usize,

    /// Start column in the line (0-indexed).
    pub start_col: usize,

    /// End column in the line (0-indexed, exclusive).
    pub end_col: usize,
}

impl Link {
    /// Split the inner text of a `[[...]]` token into its parts.
    pub fn from_inner(inner: &str, embed: bool) -> Self {
        let (reference, alias) = match inner.split_once('|') {
            Some((r, a)) => (r, Some(a.trim().to_string())),
            None => (inner, None),
        };

        let (target, heading, block_id) = match reference.split_once('#') {
            Some((t, frag)) => match frag.strip_prefix('^') {
                Some(id) => (t, None, Some(id.trim().to_string())),
                None => (t, Some(frag.trim().to_string()), None),
            },
            None => (reference, None, None),
        };

        Self {
            raw: inner.to_string(),
            target: target.trim().to_string(),
            alias,
            heading,
            block_id,
            embed,
            line: 0,
            start_col: 0,
            end_col: 0,
        }
    }

    /// The reference token handed to the resolver: target plus fragment, no alias.
    pub fn reference(&self) -> String {
        format!("{}{}", self.target, self.fragment())
    }

    /// The `#Heading` or `#^block` fragment, or an empty string.
    pub fn fragment(&self) -> String {
        if let Some(ref block_id) = self.block_id {
            format!("#^{}", block_id)
        } else if let Some(ref heading) = self.heading {
            format!("#{}", heading)
        } else {
            String::new()
        }
    }

    /// Returns the display text for this link.
    pub fn display_text(&self) -> String {
        match self.alias {
            Some(ref alias) => alias.clone(),
            None => self.reference(),
        }
    }

    /// The token as recorded on a note: `[[inner]]`, never with the embed bang.
    pub fn token(&self) -> String {
        format!("[[{}]]", self.raw)
    }
}

/// A tag found in a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// The full tag including # (e.g., "#rust" or "#lang/rust").
    pub name: String,

    /// Line number where this tag appears (1-indexed).
    pub line: usize,

    /// Start column in the line (0-indexed).
    pub start_col: usize,

    /// End column in the line (0-indexed, exclusive).
    pub end_col: usize,
}

/// A heading found in a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// The heading text (without the # prefix).
    pub text: String,

    /// The heading level (1-6).
    pub level: u8,

    /// Line number where this heading appears (1-indexed).
    pub line: usize,

    /// The slug used as the heading's anchor id.
    pub slug: String,
}

/// A navigation step from the site root down to a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breadcrumb {
    pub label: String,
    pub url: String,
}
