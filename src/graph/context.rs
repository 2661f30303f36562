//! Token-bounded context assembly from ranked activation results.

use serde::Serialize;

use crate::config::ContextConfig;
use crate::error::IndexResult;
use crate::graph::activation::{spread_activation, ActivationConfig};
use crate::graph::types::{ActivationResult, KnowledgeGraph};
use crate::vault::DocumentSource;

/// Rough token estimate used for budgeting.
const CHARS_PER_TOKEN: usize = 4;
const BLOCK_SEPARATOR: &str = "\n";

#[derive(Debug, Clone, PartialEq)]
pub struct ContextOptions {
    pub token_budget: usize,
    /// Full bodies instead of excerpts.
    pub include_full: bool,
    pub excerpt_chars: usize,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self::from_config(&ContextConfig::default())
    }
}

impl ContextOptions {
    pub fn from_config(config: &ContextConfig) -> Self {
        Self {
            token_budget: config.token_budget,
            include_full: false,
            excerpt_chars: config.excerpt_chars,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextResponse {
    pub context: String,
    pub document_count: usize,
    pub estimated_tokens: usize,
    /// Ranked documents left out because the budget ran out.
    pub truncated_count: usize,
}

pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// Render ranked results into one markdown document without exceeding the
/// token budget. Results are taken in order; the first one that does not fit
/// stops assembly.
pub fn assemble_context(
    results: &[ActivationResult],
    graph: &KnowledgeGraph,
    source: &dyn DocumentSource,
    options: &ContextOptions,
) -> ContextResponse {
    let mut context = String::new();
    let mut chars = 0usize;
    let mut document_count = 0usize;
    let mut truncated_count = 0usize;

    for (i, result) in results.iter().enumerate() {
        let Some(node) = graph.node(&result.node_id) else {
            continue;
        };
        let body = source.body(&node.id).unwrap_or_default();
        let text = if options.include_full {
            body.trim().to_string()
        } else {
            excerpt(&body, options.excerpt_chars)
        };
        let block = format!(
            "## {}\npath: {} | layer: {} | score: {:.3}\n\n{}\n",
            node.title, node.path, node.layer, result.score, text
        );

        let sep = if context.is_empty() { 0 } else { BLOCK_SEPARATOR.len() };
        let next_chars = chars + sep + block.chars().count();
        if next_chars.div_ceil(CHARS_PER_TOKEN) > options.token_budget {
            truncated_count = results.len() - i;
            break;
        }

        if sep > 0 {
            context.push_str(BLOCK_SEPARATOR);
        }
        context.push_str(&block);
        chars = next_chars;
        document_count += 1;
    }

    ContextResponse {
        estimated_tokens: estimate_tokens(&context),
        context,
        document_count,
        truncated_count,
    }
}

/// Run a free-text query and assemble context from its results.
///
/// The whole query is tried as a single seed first; if it resolves nothing,
/// each word of three or more characters becomes a seed instead.
pub fn context_for_query(
    graph: &KnowledgeGraph,
    source: &dyn DocumentSource,
    query: &str,
    activation: &ActivationConfig,
    options: &ContextOptions,
) -> IndexResult<ContextResponse> {
    let mut response = spread_activation(graph, &[query.to_string()], activation)?;
    if response.results.is_empty() {
        let words = query_words(query);
        if !words.is_empty() {
            tracing::debug!(words = words.len(), "falling back to per-word seeds");
            response = spread_activation(graph, &words, activation)?;
        }
    }
    Ok(assemble_context(&response.results, graph, source, options))
}

fn query_words(query: &str) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    for word in query.split(|c: char| !c.is_alphanumeric() && c != '-' && c != '_') {
        if word.chars().count() >= 3 && !words.iter().any(|w| w.eq_ignore_ascii_case(word)) {
            words.push(word.to_string());
        }
    }
    words
}

fn excerpt(body: &str, max_chars: usize) -> String {
    let body = body.trim();
    match body.char_indices().nth(max_chars) {
        None => body.to_string(),
        Some((cut, _)) => format!("{}...", body[..cut].trim_end()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::types::{EdgeType, KnowledgeEdge, KnowledgeNode};
    use chrono::{NaiveDate, Utc};
    use std::collections::HashMap;

    fn node(id: &str, title: &str) -> KnowledgeNode {
        KnowledgeNode {
            id: id.into(),
            path: id.into(),
            title: title.into(),
            layer: 2,
            tags: vec!["t".into()],
            created: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            updated: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            mtime: Utc::now(),
            accessed_count: 0,
            pagerank: None,
            cf: None,
            domain: None,
            person: None,
            expires: None,
        }
    }

    fn fixture() -> (KnowledgeGraph, HashMap<String, String>) {
        let nodes = [node("a.md", "Alpha Note"), node("b.md", "Beta Note"), node("c.md", "Gamma Note")]
            .into_iter()
            .map(|n| (n.id.clone(), n))
            .collect();
        let edges = vec![
            KnowledgeEdge { from: "a.md".into(), to: "b.md".into(), edge_type: EdgeType::Link, weight: 0.8 },
            KnowledgeEdge { from: "b.md".into(), to: "c.md".into(), edge_type: EdgeType::Link, weight: 0.8 },
        ];
        let graph = KnowledgeGraph::new(nodes, edges, Utc::now());
        let bodies = [
            ("a.md", "alpha body ".repeat(20)),
            ("b.md", "beta body ".repeat(20)),
            ("c.md", "gamma body ".repeat(20)),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        (graph, bodies)
    }

    fn result(id: &str, score: f64) -> ActivationResult {
        ActivationResult { node_id: id.into(), score, hops: 0, path: vec![id.into()] }
    }

    #[test]
    fn token_estimate_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn excerpt_cuts_on_char_boundary() {
        assert_eq!(excerpt("short", 10), "short");
        assert_eq!(excerpt("héllo wörld", 5), "héllo...");
    }

    #[test]
    fn empty_results_give_empty_context() {
        let (graph, bodies) = fixture();
        let resp = assemble_context(&[], &graph, &bodies, &ContextOptions::default());
        assert_eq!(resp.context, "");
        assert_eq!(resp.document_count, 0);
        assert_eq!(resp.estimated_tokens, 0);
        assert_eq!(resp.truncated_count, 0);
    }

    #[test]
    fn blocks_carry_title_metadata_and_body() {
        let (graph, bodies) = fixture();
        let resp = assemble_context(&[result("a.md", 1.0)], &graph, &bodies, &ContextOptions::default());
        assert!(resp.context.starts_with("## Alpha Note\npath: a.md | layer: 2 | score: 1.000\n"));
        assert!(resp.context.contains("alpha body"));
        assert_eq!(resp.document_count, 1);
    }

    #[test]
    fn budget_is_never_exceeded() {
        let (graph, bodies) = fixture();
        let results = vec![result("a.md", 1.0), result("b.md", 0.5), result("c.md", 0.2)];
        let options = ContextOptions { token_budget: 120, include_full: true, excerpt_chars: 400 };
        let resp = assemble_context(&results, &graph, &bodies, &options);
        assert!(resp.estimated_tokens <= 120);
        assert_eq!(resp.document_count + resp.truncated_count, 3);
        assert!(resp.truncated_count > 0);
    }

    #[test]
    fn assembly_stops_at_first_block_that_does_not_fit() {
        let (graph, _) = fixture();
        let bodies: HashMap<String, String> = [
            ("a.md", "x".repeat(400)),
            ("b.md", "y".repeat(400)),
            ("c.md", "z".to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        // a alone is ~114 tokens, a + c ~127, a + b ~227
        let options = ContextOptions { token_budget: 150, include_full: true, excerpt_chars: 0 };
        let results = vec![result("a.md", 1.0), result("b.md", 0.5), result("c.md", 0.2)];

        let resp = assemble_context(&results, &graph, &bodies, &options);
        assert_eq!(resp.document_count, 1);
        assert_eq!(resp.truncated_count, 2);
        assert!(!resp.context.contains("Gamma Note"));
        assert!(resp.estimated_tokens <= 150);
    }

    #[test]
    fn tiny_budget_admits_nothing() {
        let (graph, bodies) = fixture();
        let options = ContextOptions { token_budget: 1, ..ContextOptions::default() };
        let resp = assemble_context(&[result("a.md", 1.0), result("b.md", 0.5)], &graph, &bodies, &options);
        assert_eq!(resp.document_count, 0);
        assert_eq!(resp.truncated_count, 2);
        assert_eq!(resp.estimated_tokens, 0);
    }

    #[test]
    fn query_falls_back_to_words() {
        let (graph, bodies) = fixture();
        let resp = context_for_query(
            &graph,
            &bodies,
            "tell me about gamma",
            &ActivationConfig::default(),
            &ContextOptions::default(),
        )
        .unwrap();
        assert_eq!(resp.document_count, 1);
        assert!(resp.context.contains("Gamma Note"));
    }

    #[test]
    fn whole_query_seed_is_preferred() {
        let (graph, bodies) = fixture();
        let resp = context_for_query(&graph, &bodies, "Alpha Note", &ActivationConfig::default(), &ContextOptions::default())
            .unwrap();
        assert!(resp.context.starts_with("## Alpha Note"));
        assert_eq!(resp.document_count, 3);
    }
}
