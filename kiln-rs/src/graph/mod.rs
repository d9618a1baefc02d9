//! Vault link graph: name index, reference resolution, backlinks and graph export.

pub mod backlinks;
pub mod index;
mod link_graph;
pub mod resolution;

pub use backlinks::{clean_reference, BacklinkIndex};
pub use index::NoteIndex;
pub use link_graph::{Graph, GraphBuilder, GraphEdge, GraphNode};
pub use resolution::{split_fragment, EdgeCollector, LinkResolver, Resolution};
