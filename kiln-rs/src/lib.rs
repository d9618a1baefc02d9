//! Kiln - turns an Obsidian-style markdown vault into a linked static site.
//!
//! # Overview
//!
//! A build runs in one sequential pass:
//! - the vault is scanned into [`Note`] records with public addresses
//! - backlinks are inverted onto their targets
//! - every markdown note is rendered, resolving `[[links]]` and `![[embeds]]`
//!   and recording the edges of the knowledge graph
//! - `.base` files are evaluated with the [`query`] language
//! - pages, listings and `graph.json` are written out
//!
//! # Example
//!
//! ```no_run
//! use kiln::{BuildConfig, ConfigOverrides, Site};
//!
//! let config = BuildConfig::load("/path/to/vault", &ConfigOverrides::default()).unwrap();
//! let site = Site::build(config).unwrap();
//! site.write().unwrap();
//! println!("{} pages, {} graph links", site.pages.len(), site.graph.links.len());
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod note;
pub mod parser;
pub mod paths;
pub mod query;
pub mod render;
pub mod site;
pub mod types;
pub mod vault;

// Re-export main types at crate root
pub use config::{BuildConfig, ConfigOverrides};
pub use error::{KilnError, Result};
pub use graph::{Graph, LinkResolver, NoteIndex};
pub use note::{Note, NoteKind};
pub use site::Site;
pub use types::*;
pub use vault::Vault;
