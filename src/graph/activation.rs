//! Spreading-activation query engine.
//!
//! Seeds start at activation 1.0. Activation flows along outgoing edges level by
//! level: leaving a node with score `s` at hop `h` over an edge of weight `w`
//! yields `s × w × decay^(h+1)` at the target. Each node keeps the single best
//! path that reached it (highest score, then fewer hops, then smaller seed id,
//! then lexicographically smaller path). Queries never mutate the graph.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::config::QueryDefaults;
use crate::error::{IndexError, IndexResult};
use crate::graph::types::{ActivationResult, KnowledgeGraph, KnowledgeNode, NodeId};

#[derive(Debug, Clone, PartialEq)]
pub struct ActivationConfig {
    pub max_results: usize,
    /// In `(0, 1]`.
    pub decay: f64,
    /// In `[0, 1]`.
    pub threshold: f64,
    pub max_hops: usize,
    /// Layers allowed in the result list. Other layers still carry activation.
    pub layer_filter: Option<BTreeSet<u8>>,
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self::from_defaults(&QueryDefaults::default())
    }
}

impl ActivationConfig {
    pub fn from_defaults(defaults: &QueryDefaults) -> Self {
        Self {
            max_results: defaults.max_results,
            decay: defaults.decay,
            threshold: defaults.threshold,
            max_hops: defaults.max_hops,
            layer_filter: None,
        }
    }

    pub fn validate(&self) -> IndexResult<()> {
        if !(self.decay > 0.0 && self.decay <= 1.0) {
            return Err(IndexError::InvalidQuery(format!(
                "decay must be in (0, 1], got {}",
                self.decay
            )));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(IndexError::InvalidQuery(format!(
                "threshold must be in [0, 1], got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

/// Ranked results plus the number of distinct nodes the traversal reached.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationResponse {
    pub results: Vec<ActivationResult>,
    pub explored_nodes: usize,
}

/// Resolve seed terms to node ids, ascending.
///
/// A term matching a node path exactly (with or without `.md`) resolves to that
/// node only. Otherwise it matches every node whose title contains the term or
/// that carries the term as a tag, case-insensitively. Unmatched terms are ignored.
pub fn resolve_seeds(graph: &KnowledgeGraph, terms: &[String]) -> BTreeSet<NodeId> {
    let mut seeds = BTreeSet::new();
    for term in terms {
        let term = term.trim();
        if term.is_empty() {
            continue;
        }
        if graph.contains(term) {
            seeds.insert(term.to_string());
            continue;
        }
        let with_ext = format!("{term}.md");
        if graph.contains(&with_ext) {
            seeds.insert(with_ext);
            continue;
        }

        let needle = term.to_lowercase();
        let tag = needle.trim_start_matches('#');
        seeds.extend(
            graph
                .nodes()
                .filter(|n| {
                    n.title.to_lowercase().contains(&needle)
                        || n.tags.iter().any(|t| t.to_lowercase() == tag)
                })
                .map(|n| n.id.clone()),
        );
    }
    seeds
}

/// A path reaching a node.
#[derive(Debug, Clone)]
struct Candidate {
    score: f64,
    hops: usize,
    /// Seed first, reached node last.
    path: Vec<NodeId>,
}

impl Candidate {
    fn seed(&self) -> &str {
        &self.path[0]
    }

    /// `Less` when `self` is the preferred path.
    fn preference(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.hops.cmp(&other.hops))
            .then_with(|| self.seed().cmp(other.seed()))
            .then_with(|| self.path.cmp(&other.path))
    }

    fn beats(&self, other: &Self) -> bool {
        self.preference(other) == Ordering::Less
    }
}

/// Run a spreading-activation query against one snapshot.
pub fn spread_activation(
    graph: &KnowledgeGraph,
    seed_terms: &[String],
    config: &ActivationConfig,
) -> IndexResult<ActivationResponse> {
    config.validate()?;

    let seeds = resolve_seeds(graph, seed_terms);
    if seeds.is_empty() {
        tracing::debug!(terms = ?seed_terms, "no seeds resolved");
        return Ok(ActivationResponse {
            results: Vec::new(),
            explored_nodes: 0,
        });
    }

    let mut best: HashMap<NodeId, Candidate> = HashMap::new();
    let mut frontier: BTreeMap<NodeId, Candidate> = BTreeMap::new();
    for seed in &seeds {
        let start = Candidate {
            score: 1.0,
            hops: 0,
            path: vec![seed.clone()],
        };
        best.insert(seed.clone(), start.clone());
        frontier.insert(seed.clone(), start);
    }

    for hop in 0..config.max_hops {
        let factor = config.decay.powi(hop as i32 + 1);
        let mut next: BTreeMap<NodeId, Candidate> = BTreeMap::new();

        for (node, current) in &frontier {
            for edge in graph.outgoing(node) {
                let score = current.score * edge.weight * factor;
                let mut path = current.path.clone();
                path.push(edge.to.clone());
                let candidate = Candidate {
                    score,
                    hops: hop + 1,
                    path,
                };

                let known = best.get(&edge.to);
                // A path with fewer hops and at least this score extends at
                // least as well, so this one need not be expanded.
                let dominated = known.is_some_and(|b| b.hops <= hop && b.score >= score);
                if known.map_or(true, |b| candidate.beats(b)) {
                    best.insert(edge.to.clone(), candidate.clone());
                }

                if score < config.threshold || dominated {
                    continue;
                }
                match next.get(&edge.to) {
                    Some(queued) if !candidate.beats(queued) => {}
                    _ => {
                        next.insert(edge.to.clone(), candidate);
                    }
                }
            }
        }

        if next.is_empty() {
            break;
        }
        frontier = next;
    }

    let explored_nodes = best.len();
    let mut ranked: Vec<(&KnowledgeNode, Candidate)> = best
        .into_iter()
        .filter(|(_, c)| c.score >= config.threshold)
        .filter_map(|(id, c)| graph.node(&id).map(|n| (n, c)))
        .filter(|(n, _)| {
            config
                .layer_filter
                .as_ref()
                .map_or(true, |layers| layers.contains(&n.layer))
        })
        .collect();

    ranked.sort_by(|(na, a), (nb, b)| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| hint(nb.pagerank).total_cmp(&hint(na.pagerank)))
            .then_with(|| hint(nb.cf).total_cmp(&hint(na.cf)))
            .then_with(|| a.hops.cmp(&b.hops))
            .then_with(|| na.id.cmp(&nb.id))
    });
    ranked.truncate(config.max_results);

    let results: Vec<ActivationResult> = ranked
        .into_iter()
        .map(|(node, c)| ActivationResult {
            node_id: node.id.clone(),
            score: c.score,
            hops: c.hops,
            path: c.path,
        })
        .collect();

    tracing::debug!(
        seeds = seeds.len(),
        explored = explored_nodes,
        returned = results.len(),
        "spreading activation complete"
    );

    Ok(ActivationResponse {
        results,
        explored_nodes,
    })
}

fn hint(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}
