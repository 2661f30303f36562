//! Graph health summary: size, age, and how much of it is stale.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;

use crate::error::IndexResult;
use crate::graph::staleness;
use crate::graph::types::KnowledgeGraph;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Freshness {
    pub percent: f64,
    pub rebuild_recommended: bool,
}

impl Freshness {
    /// `total` nodes of which `stale` are stale. An empty graph is fully fresh.
    pub fn compute(total: usize, stale: usize, threshold: f64) -> Self {
        if total == 0 {
            return Self {
                percent: 100.0,
                rebuild_recommended: false,
            };
        }
        let total = total as f64;
        let stale = stale as f64;
        Self {
            percent: 100.0 * ((total - stale) / total).max(0.0),
            rebuild_recommended: stale / total > threshold,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub node_count: usize,
    pub edge_count: usize,
    pub last_built_at: Option<DateTime<Utc>>,
    pub stale_node_count: usize,
    pub freshness_percent: f64,
    pub rebuild_recommended: bool,
}

/// Summarize the current snapshot. A missing graph reports zero counts.
pub fn graph_status(
    graph: Option<&KnowledgeGraph>,
    conn: &Connection,
    rebuild_threshold: f64,
) -> IndexResult<StatusResponse> {
    let stale_node_count = staleness::stale_count(conn)?;
    let last_built_at = match graph {
        Some(g) => staleness::last_built_at(conn)?.or(Some(g.built_at())),
        None => None,
    };
    let node_count = graph.map_or(0, |g| g.node_count());
    let edge_count = graph.map_or(0, |g| g.edge_count());
    let freshness = Freshness::compute(node_count, stale_node_count, rebuild_threshold);

    Ok(StatusResponse {
        node_count,
        edge_count,
        last_built_at,
        stale_node_count,
        freshness_percent: freshness.percent,
        rebuild_recommended: freshness.rebuild_recommended,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::graph::staleness::mark_stale;

    #[test]
    fn freshness_examples() {
        let f = Freshness::compute(20, 1, 0.1);
        assert!((f.percent - 95.0).abs() < 1e-9);
        assert!(!f.rebuild_recommended);

        let f = Freshness::compute(10, 2, 0.1);
        assert!((f.percent - 80.0).abs() < 1e-9);
        assert!(f.rebuild_recommended);

        let f = Freshness::compute(0, 3, 0.1);
        assert_eq!(f.percent, 100.0);
        assert!(!f.rebuild_recommended);
    }

    #[test]
    fn more_stale_than_nodes_floors_at_zero() {
        let f = Freshness::compute(2, 5, 0.1);
        assert_eq!(f.percent, 0.0);
        assert!(f.rebuild_recommended);
    }

    #[test]
    fn missing_graph_reports_empty_and_fresh() {
        let conn = open_memory_database().unwrap();
        mark_stale(&conn, "a.md", None).unwrap();
        let status = graph_status(None, &conn, 0.1).unwrap();
        assert_eq!(status.node_count, 0);
        assert_eq!(status.edge_count, 0);
        assert!(status.last_built_at.is_none());
        assert_eq!(status.stale_node_count, 1);
        assert_eq!(status.freshness_percent, 100.0);
        assert!(!status.rebuild_recommended);

        let json = serde_json::to_value(&status).unwrap();
        assert!(json["lastBuiltAt"].is_null());
        assert_eq!(json["freshnessPercent"], 100.0);
    }
}
