//! Graph snapshot types.
//!
//! Nodes and edges refer to each other only by [`NodeId`]. A [`KnowledgeGraph`]
//! is immutable once built; a rebuild produces a new value.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Vault-relative document path.
pub type NodeId = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeNode {
    pub id: NodeId,
    pub path: String,
    pub title: String,
    /// Vault layer, `1..=5`.
    pub layer: u8,
    pub tags: Vec<String>,
    pub created: NaiveDate,
    pub updated: NaiveDate,
    pub mtime: DateTime<Utc>,
    #[serde(default)]
    pub accessed_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagerank: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cf: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeType {
    Link,
    ParentOf,
    ChildOf,
    Sibling,
    Relationship,
}

impl EdgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Link => "LINK",
            Self::ParentOf => "PARENT_OF",
            Self::ChildOf => "CHILD_OF",
            Self::Sibling => "SIBLING",
            Self::Relationship => "RELATIONSHIP",
        }
    }
}

impl std::fmt::Display for EdgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEdge {
    pub from: NodeId,
    pub to: NodeId,
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    /// In `[0.0, 1.0]`.
    pub weight: f64,
}

/// One immutable graph snapshot.
///
/// Serializes as `{nodes: [...], edges: [...], builtAt, nodeCount, edgeCount}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "GraphFile", from = "GraphFile")]
pub struct KnowledgeGraph {
    nodes: BTreeMap<NodeId, KnowledgeNode>,
    edges: Vec<KnowledgeEdge>,
    built_at: DateTime<Utc>,
    /// node id → indices into `edges` leaving it, in edge order.
    outgoing: HashMap<NodeId, Vec<usize>>,
    /// node id → indices into `edges` entering it, in edge order.
    incoming: HashMap<NodeId, Vec<usize>>,
}

impl KnowledgeGraph {
    /// Assemble a snapshot, dropping edges whose endpoints are absent and
    /// clamping weights into `[0, 1]`. Edges keep their given order.
    pub fn new(
        nodes: BTreeMap<NodeId, KnowledgeNode>,
        edges: Vec<KnowledgeEdge>,
        built_at: DateTime<Utc>,
    ) -> Self {
        let edges = edges
            .into_iter()
            .filter(|e| nodes.contains_key(&e.from) && nodes.contains_key(&e.to))
            .map(|mut e| {
                e.weight = if e.weight.is_finite() { e.weight.clamp(0.0, 1.0) } else { 0.0 };
                e
            })
            .collect::<Vec<KnowledgeEdge>>();

        let mut outgoing: HashMap<NodeId, Vec<usize>> = HashMap::new();
        let mut incoming: HashMap<NodeId, Vec<usize>> = HashMap::new();
        for (i, edge) in edges.iter().enumerate() {
            outgoing.entry(edge.from.clone()).or_default().push(i);
            incoming.entry(edge.to.clone()).or_default().push(i);
        }

        Self {
            nodes,
            edges,
            built_at,
            outgoing,
            incoming,
        }
    }

    pub fn node(&self, id: &str) -> Option<&KnowledgeNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Nodes in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = &KnowledgeNode> {
        self.nodes.values()
    }

    pub fn edges(&self) -> &[KnowledgeEdge] {
        &self.edges
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Edges leaving `id`, in edge order.
    pub fn outgoing(&self, id: &str) -> impl Iterator<Item = &KnowledgeEdge> {
        self.outgoing
            .get(id)
            .into_iter()
            .flatten()
            .map(|&i| &self.edges[i])
    }

    /// Edges entering `id`, in edge order.
    pub fn incoming(&self, id: &str) -> impl Iterator<Item = &KnowledgeEdge> {
        self.incoming
            .get(id)
            .into_iter()
            .flatten()
            .map(|&i| &self.edges[i])
    }
}

/// On-disk shape of a [`KnowledgeGraph`].
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphFile {
    nodes: Vec<KnowledgeNode>,
    edges: Vec<KnowledgeEdge>,
    built_at: DateTime<Utc>,
    node_count: usize,
    edge_count: usize,
}

impl From<KnowledgeGraph> for GraphFile {
    fn from(graph: KnowledgeGraph) -> Self {
        let node_count = graph.nodes.len();
        let edge_count = graph.edges.len();
        Self {
            nodes: graph.nodes.into_values().collect(),
            edges: graph.edges,
            built_at: graph.built_at,
            node_count,
            edge_count,
        }
    }
}

impl From<GraphFile> for KnowledgeGraph {
    fn from(file: GraphFile) -> Self {
        if file.node_count != file.nodes.len() || file.edge_count != file.edges.len() {
            tracing::warn!(
                declared_nodes = file.node_count,
                declared_edges = file.edge_count,
                "snapshot counts disagree with contents, recounting"
            );
        }
        let nodes = file
            .nodes
            .into_iter()
            .map(|n| (n.id.clone(), n))
            .collect();
        KnowledgeGraph::new(nodes, file.edges, file.built_at)
    }
}

/// One reached node in a spreading-activation query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationResult {
    pub node_id: NodeId,
    pub score: f64,
    pub hops: usize,
    /// Node ids from the seed to this node, inclusive.
    pub path: Vec<NodeId>,
}
