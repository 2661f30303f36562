//! Direct neighbourhood lookups for a single node.

use serde::Serialize;

use crate::error::{IndexError, IndexResult};
use crate::graph::types::{EdgeType, KnowledgeEdge, KnowledgeGraph, NodeId};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Neighbor {
    pub id: NodeId,
    pub title: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Neighborhood {
    pub id: NodeId,
    /// Documents this one links to.
    pub outbound: Vec<Neighbor>,
    /// Documents linking to this one.
    pub inbound: Vec<Neighbor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parents: Option<Vec<Neighbor>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Neighbor>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub siblings: Option<Vec<Neighbor>>,
}

pub fn navigate(graph: &KnowledgeGraph, id: &str, include_hierarchy: bool) -> IndexResult<Neighborhood> {
    if !graph.contains(id) {
        return Err(IndexError::NodeNotFound { id: id.to_string() });
    }

    let outbound = linked(graph, graph.outgoing(id), EdgeType::Link, |e| &e.to);
    let inbound = linked(graph, graph.incoming(id), EdgeType::Link, |e| &e.from);

    let (parents, children, siblings) = if include_hierarchy {
        (
            Some(linked(graph, graph.outgoing(id), EdgeType::ChildOf, |e| &e.to)),
            Some(linked(graph, graph.outgoing(id), EdgeType::ParentOf, |e| &e.to)),
            Some(linked(graph, graph.outgoing(id), EdgeType::Sibling, |e| &e.to)),
        )
    } else {
        (None, None, None)
    };

    Ok(Neighborhood {
        id: id.to_string(),
        outbound,
        inbound,
        parents,
        children,
        siblings,
    })
}

fn linked<'g>(
    graph: &'g KnowledgeGraph,
    edges: impl Iterator<Item = &'g KnowledgeEdge>,
    edge_type: EdgeType,
    other_end: impl Fn(&'g KnowledgeEdge) -> &'g NodeId,
) -> Vec<Neighbor> {
    let mut out: Vec<Neighbor> = edges
        .filter(|e| e.edge_type == edge_type)
        .filter_map(|e| {
            let node = graph.node(other_end(e))?;
            Some(Neighbor {
                id: node.id.clone(),
                title: node.title.clone(),
                weight: e.weight,
            })
        })
        .collect();
    out.sort_by(|a, b| a.id.cmp(&b.id));
    out
}
