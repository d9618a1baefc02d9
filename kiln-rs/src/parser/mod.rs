//! Parsers for Obsidian-flavoured markdown.

pub mod block;
pub mod code_block;
pub mod frontmatter;
pub mod heading;
pub mod tag;
pub mod wikilink;

pub use block::{parse_blocks, Block, BlockKind};
pub use code_block::{find_code_block_ranges, CodeBlockRange};
pub use frontmatter::{frontmatter_tags, parse_frontmatter, split_frontmatter, Frontmatter};
pub use heading::{parse_headings, slugify, SlugCounter};
pub use tag::parse_tags;
pub use wikilink::{clean_link, is_image_target, parse_all_links};
