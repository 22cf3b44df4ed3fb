//! Graph lookup collaborator.
//!
//! The router's graph tool delegates to a [`GraphBackend`] — a 1-hop
//! neighbor lookup. The in-tree [`StaticGraph`] serves demos and tests
//! from a config-supplied edge list; a real backend attaches by
//! implementing the trait.

use std::collections::HashMap;

use crate::config::GraphConfig;

/// 1-hop neighbor lookup capability.
pub trait GraphBackend: Send + Sync {
    fn name(&self) -> &str;

    /// All nodes one hop from `node_id`. Unknown nodes yield an empty list.
    fn neighbors(&self, node_id: &str) -> anyhow::Result<Vec<String>>;
}

/// In-memory backend over a static, undirected edge list.
pub struct StaticGraph {
    adjacency: HashMap<String, Vec<String>>,
}

impl StaticGraph {
    pub fn from_edges(edges: &[(String, String)]) -> Self {
        let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();
        for (from, to) in edges {
            adjacency.entry(from.clone()).or_default().push(to.clone());
            adjacency.entry(to.clone()).or_default().push(from.clone());
        }
        for neighbors in adjacency.values_mut() {
            neighbors.sort();
            neighbors.dedup();
        }
        Self { adjacency }
    }

    pub fn from_config(config: &GraphConfig) -> Self {
        Self::from_edges(&config.edges)
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }
}

impl GraphBackend for StaticGraph {
    fn name(&self) -> &str {
        "static"
    }

    fn neighbors(&self, node_id: &str) -> anyhow::Result<Vec<String>> {
        Ok(self.adjacency.get(node_id).cloned().unwrap_or_default())
    }
}

/// First whitespace token carrying one of the configured node prefixes,
/// with trailing punctuation stripped.
pub fn extract_node_id(query: &str, node_prefixes: &[String]) -> Option<String> {
    query
        .split_whitespace()
        .map(|token| token.trim_matches(|c: char| !c.is_alphanumeric()))
        .find(|token| {
            !token.is_empty()
                && node_prefixes
                    .iter()
                    .any(|prefix| token.to_lowercase().starts_with(&prefix.to_lowercase()))
        })
        .map(|token| token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edges() -> Vec<(String, String)> {
        vec![
            ("player100".to_string(), "team200".to_string()),
            ("player100".to_string(), "player101".to_string()),
        ]
    }

    #[test]
    fn test_neighbors_are_undirected_and_sorted() {
        let graph = StaticGraph::from_edges(&edges());
        assert_eq!(
            graph.neighbors("player100").unwrap(),
            vec!["player101", "team200"]
        );
        assert_eq!(graph.neighbors("team200").unwrap(), vec!["player100"]);
    }

    #[test]
    fn test_unknown_node_yields_empty() {
        let graph = StaticGraph::from_edges(&edges());
        assert!(graph.neighbors("player999").unwrap().is_empty());
    }

    #[test]
    fn test_extract_node_id() {
        let prefixes = vec!["player".to_string(), "team".to_string()];
        assert_eq!(
            extract_node_id("who is related to player100?", &prefixes),
            Some("player100".to_string())
        );
        assert_eq!(
            extract_node_id("show the team200 neighbors", &prefixes),
            Some("team200".to_string())
        );
        assert_eq!(extract_node_id("no ids in here", &prefixes), None);
    }
}
