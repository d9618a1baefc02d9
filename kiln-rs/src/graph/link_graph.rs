//! Graph assembly for the front-end visualization.

use crate::vault::Vault;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A note, folder or tag in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Public address, unique across the graph.
    pub id: String,
    pub label: String,
    pub url: String,
    /// Rendered size. Uniform for now.
    #[serde(rename = "val")]
    pub weight: u32,
    /// File extension (`.md`, `.png`), `folder` or `tag`.
    #[serde(rename = "type")]
    pub kind: String,
}

/// A directed connection between two addresses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
}

/// The whole graph, serialized as `graph.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphEdge>,
}

impl Graph {
    /// Edges leaving `address`.
    pub fn outgoing<'a>(&'a self, address: &'a str) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.links.iter().filter(move |e| e.source == address)
    }

    /// Edges arriving at `address`.
    pub fn incoming<'a>(&'a self, address: &'a str) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.links.iter().filter(move |e| e.target == address)
    }
}

/// Builds the graph from the vault and the edges recorded while rendering.
pub struct GraphBuilder<'a> {
    vault: &'a Vault,
    graph: Graph,
    seen: HashSet<String>,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(vault: &'a Vault) -> Self {
        Self {
            vault,
            graph: Graph::default(),
            seen: HashSet::new(),
        }
    }

    /// Assemble nodes for every file, folder and tag, then the edges: tag
    /// membership, folder children, and finally the recorded note links.
    pub fn build(vault: &'a Vault, note_edges: &[GraphEdge]) -> Graph {
        let mut builder = Self::new(vault);
        builder.add_nodes();
        builder.add_tag_edges();
        builder.add_folder_edges();
        for edge in note_edges {
            builder.push_edge(&edge.source, &edge.target);
        }

        let graph = builder.graph;
        log::info!(
            "Graph has {} nodes and {} links",
            graph.nodes.len(),
            graph.links.len()
        );
        graph
    }

    fn add_nodes(&mut self) {
        let vault = self.vault;
        for note in &vault.notes {
            self.push_node(&note.web_path, &note.name, &note.ext);
        }
        for folder in vault.folders.values() {
            self.push_node(&folder.web_path, &folder.name, "folder");
        }
        for tag in vault.tags.values() {
            self.push_node(&tag.web_path, &format!("#{}", tag.name), "tag");
        }
    }

    // A folder's index note shares its address; the first node wins.
    fn push_node(&mut self, address: &str, label: &str, kind: &str) {
        if !self.seen.insert(address.to_string()) {
            return;
        }
        self.graph.nodes.push(GraphNode {
            id: address.to_string(),
            label: label.to_string(),
            url: address.to_string(),
            weight: 1,
            kind: kind.to_string(),
        });
    }

    fn add_tag_edges(&mut self) {
        let vault = self.vault;
        for tag in vault.tags.values() {
            for &i in &tag.notes {
                self.push_edge(&tag.web_path, &vault.notes[i].web_path);
            }
        }
    }

    fn add_folder_edges(&mut self) {
        let vault = self.vault;
        for folder in vault.folders.values() {
            for &i in &folder.notes {
                self.push_edge(&folder.web_path, &vault.notes[i].web_path);
            }
            for child in &folder.folders {
                if let Some(sub) = vault.folders.get(child) {
                    self.push_edge(&folder.web_path, &sub.web_path);
                }
            }
        }
    }

    fn push_edge(&mut self, source: &str, target: &str) {
        if source.eq_ignore_ascii_case(target) {
            return;
        }
        self.graph.links.push(GraphEdge {
            source: source.to_string(),
            target: target.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::Note;
    use crate::paths::Paths;
    use pretty_assertions::assert_eq;

    fn make_vault() -> Vault {
        let notes = vec![
            Note::new("docs/Guide.md", "#howto"),
            Note::new("docs/index.md", ""),
            Note::new("docs/api/Ref.md", ""),
            Note::asset("docs/pic.png", 1),
            Note::new("Home.md", ""),
        ];
        Vault::from_notes("/v", Paths::from_parts("", "public", false).unwrap(), notes)
    }

    fn edge(source: &str, target: &str) -> GraphEdge {
        GraphEdge {
            source: source.to_string(),
            target: target.to_string(),
        }
    }

    #[test]
    fn test_nodes() {
        let vault = make_vault();
        let graph = GraphBuilder::build(&vault, &[]);
        let nodes: Vec<_> = graph
            .nodes
            .iter()
            .map(|n| (n.id.as_str(), n.kind.as_str()))
            .collect();
        assert_eq!(
            nodes,
            vec![
                ("/home", ".md"),
                ("/docs/guide", ".md"),
                ("/docs/api/ref", ".md"),
                ("/docs", ".md"),
                ("/docs/pic.png", ".png"),
                ("/docs/api", "folder"),
                ("/tags/howto", "tag"),
            ]
        );
        assert!(graph.nodes.iter().all(|n| n.weight == 1));
    }

    #[test]
    fn test_edge_order() {
        let vault = make_vault();
        let graph = GraphBuilder::build(&vault, &[edge("/home", "/docs/guide")]);
        assert_eq!(
            graph.links,
            vec![
                edge("/tags/howto", "/docs/guide"),
                edge("/docs", "/docs/guide"),
                edge("/docs", "/docs/api"),
                edge("/docs/api", "/docs/api/ref"),
                edge("/home", "/docs/guide"),
            ]
        );
        assert_eq!(graph.incoming("/docs/guide").count(), 3);
        assert_eq!(graph.outgoing("/home").count(), 1);
    }

    #[test]
    fn test_json_shape() {
        let vault = make_vault();
        let graph = GraphBuilder::build(&vault, &[]);
        let json = serde_json::to_value(&graph).unwrap();
        assert!(json["links"].is_array());
        assert_eq!(json["nodes"][0]["val"], 1);
        assert_eq!(json["nodes"][0]["type"], ".md");
        assert_eq!(json["nodes"][0]["label"], "Home");
    }
}
