//! Folds parsed documents into a [`KnowledgeGraph`] snapshot.
//!
//! One node per document. Edges come from inline references (`LINK`), directory
//! structure (`PARENT_OF`/`CHILD_OF`, `SIBLING`), and frontmatter `related`
//! lists (`RELATIONSHIP`). References that do not resolve to a scanned document
//! are dropped without error.
//!
//! A document's parent is the index document of its directory, or of the
//! nearest ancestor directory that has one. Siblings are the non-index
//! documents sharing that parent, so a document adopted from an index-less
//! subdirectory is a sibling of its new parent's other children.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::config::{EdgeWeights, StrataConfig};
use crate::graph::types::{EdgeType, KnowledgeEdge, KnowledgeGraph, KnowledgeNode, NodeId};
use crate::vault::parser::{file_stem, ParsedDocument};
use crate::vault::references::Reference;

/// Knobs for a build, usually taken from [`StrataConfig`].
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub weights: EdgeWeights,
    /// File names marking a directory's index document, in priority order.
    pub index_names: Vec<String>,
    pub sibling_fanout_limit: usize,
}

impl BuildOptions {
    pub fn from_config(config: &StrataConfig) -> Self {
        Self {
            weights: config.graph.weights,
            index_names: config.vault.index_names.clone(),
            sibling_fanout_limit: config.graph.sibling_fanout_limit,
        }
    }

    fn weight(&self, edge_type: EdgeType) -> f64 {
        match edge_type {
            EdgeType::Link => self.weights.link,
            EdgeType::ParentOf => self.weights.parent_of,
            EdgeType::ChildOf => self.weights.child_of,
            EdgeType::Sibling => self.weights.sibling,
            EdgeType::Relationship => self.weights.relationship,
        }
    }
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self::from_config(&StrataConfig::default())
    }
}

/// Similarity signal for `LINK` edges. A returned score only raises the edge
/// weight above the configured base, never lowers it.
pub trait LinkScorer: Send + Sync {
    fn score(&self, from: &KnowledgeNode, to: &KnowledgeNode) -> Option<f64>;
}

/// No signal: every link gets the base weight.
#[derive(Debug, Default, Clone, Copy)]
pub struct BaseWeight;

impl LinkScorer for BaseWeight {
    fn score(&self, _from: &KnowledgeNode, _to: &KnowledgeNode) -> Option<f64> {
        None
    }
}

/// Jaccard overlap of the two documents' tag sets.
#[derive(Debug, Default, Clone, Copy)]
pub struct TagOverlap;

impl LinkScorer for TagOverlap {
    fn score(&self, from: &KnowledgeNode, to: &KnowledgeNode) -> Option<f64> {
        let a: BTreeSet<&str> = from.tags.iter().map(String::as_str).collect();
        let b: BTreeSet<&str> = to.tags.iter().map(String::as_str).collect();
        let union = a.union(&b).count();
        if union == 0 {
            return None;
        }
        Some(a.intersection(&b).count() as f64 / union as f64)
    }
}

/// Pick a scorer by its config name. Unknown names fall back to [`BaseWeight`].
pub fn scorer_from_name(name: &str) -> Box<dyn LinkScorer> {
    match name {
        "tag_overlap" => Box::new(TagOverlap),
        "base" => Box::new(BaseWeight),
        other => {
            tracing::warn!(scorer = other, "unknown link scorer, using base weight");
            Box::new(BaseWeight)
        }
    }
}

/// Build a snapshot from `docs`.
///
/// Duplicate paths keep the document with the newest mtime. The resulting edge
/// list is sorted by `(from, to, type)`.
pub fn build_graph(
    docs: &[ParsedDocument],
    options: &BuildOptions,
    scorer: &dyn LinkScorer,
    built_at: DateTime<Utc>,
) -> KnowledgeGraph {
    let mut by_path: BTreeMap<&str, &ParsedDocument> = BTreeMap::new();
    for doc in docs {
        let newer = by_path
            .get(doc.path.as_str())
            .map_or(true, |existing| doc.mtime > existing.mtime);
        if newer {
            by_path.insert(doc.path.as_str(), doc);
        }
    }

    let nodes: BTreeMap<NodeId, KnowledgeNode> = by_path
        .values()
        .map(|doc| (doc.path.clone(), node_from_document(doc)))
        .collect();

    let resolver = Resolver::new(by_path.keys().copied());
    let mut edges = EdgeSet::new();

    let mut unresolved = 0usize;
    for doc in by_path.values() {
        for reference in &doc.references {
            let Some(target) = resolver.resolve(reference, &doc.path) else {
                unresolved += 1;
                continue;
            };
            let base = options.weight(EdgeType::Link);
            let weight = match (nodes.get(&doc.path), nodes.get(target)) {
                (Some(from), Some(to)) => scorer
                    .score(from, to)
                    .map_or(base, |s| s.clamp(0.0, 1.0).max(base)),
                _ => base,
            };
            add_edge(&mut edges, &doc.path, target, EdgeType::Link, weight);
        }

        for related in &doc.related {
            let Some(target) = resolver.resolve(&Reference::Wiki(related.clone()), &doc.path) else {
                unresolved += 1;
                continue;
            };
            let weight = options.weight(EdgeType::Relationship);
            add_edge(&mut edges, &doc.path, target, EdgeType::Relationship, weight);
            add_edge(&mut edges, target, &doc.path, EdgeType::Relationship, weight);
        }
    }

    let hierarchy = Hierarchy::new(by_path.keys().copied(), &options.index_names);
    for (parent, child) in hierarchy.parent_links() {
        add_edge(&mut edges, parent, child, EdgeType::ParentOf, options.weight(EdgeType::ParentOf));
        add_edge(&mut edges, child, parent, EdgeType::ChildOf, options.weight(EdgeType::ChildOf));
    }
    for (group, members) in hierarchy.sibling_groups() {
        if members.len() > options.sibling_fanout_limit {
            tracing::debug!(group = ?group, members = members.len(), "sibling group over fanout limit");
            continue;
        }
        for &a in &members {
            for &b in &members {
                add_edge(&mut edges, a, b, EdgeType::Sibling, options.weight(EdgeType::Sibling));
            }
        }
    }

    let edges: Vec<KnowledgeEdge> = edges
        .into_iter()
        .map(|((from, to, edge_type), weight)| KnowledgeEdge {
            from,
            to,
            edge_type,
            weight,
        })
        .collect();

    let graph = KnowledgeGraph::new(nodes, edges, built_at);
    tracing::info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        unresolved_references = unresolved,
        "graph built"
    );
    graph
}

/// Deduplicated edges keyed by `(from, to, type)`; iteration order is the
/// final edge order.
type EdgeSet = BTreeMap<(NodeId, NodeId, EdgeType), f64>;

/// Insert an edge, keeping the larger weight on collision. Self loops are ignored.
fn add_edge(edges: &mut EdgeSet, from: &str, to: &str, edge_type: EdgeType, weight: f64) {
    if from == to {
        return;
    }
    let slot = edges
        .entry((from.to_string(), to.to_string(), edge_type))
        .or_insert(weight);
    if weight > *slot {
        *slot = weight;
    }
}

fn node_from_document(doc: &ParsedDocument) -> KnowledgeNode {
    KnowledgeNode {
        id: doc.path.clone(),
        path: doc.path.clone(),
        title: doc.title.clone(),
        layer: doc.layer,
        tags: doc.tags.clone(),
        created: doc.created,
        updated: doc.updated,
        mtime: doc.mtime,
        accessed_count: 0,
        pagerank: None,
        cf: doc.confidence,
        domain: doc.domain.clone(),
        person: doc.person.clone(),
        expires: doc.expires,
    }
}

/// Directory part of a vault path (`""` for the root).
pub(crate) fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(dir, _)| dir)
}

fn file_name(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, name)| name)
}

/// Maps reference text to document paths.
struct Resolver<'a> {
    paths: BTreeSet<&'a str>,
    /// Lowercased file stem → paths, ascending.
    by_stem: HashMap<String, Vec<&'a str>>,
}

impl<'a> Resolver<'a> {
    fn new(paths: impl Iterator<Item = &'a str>) -> Self {
        let paths: BTreeSet<&str> = paths.collect();
        let mut by_stem: HashMap<String, Vec<&str>> = HashMap::new();
        for &path in &paths {
            by_stem
                .entry(file_stem(path).to_lowercase())
                .or_default()
                .push(path);
        }
        Self { paths, by_stem }
    }

    fn resolve(&self, reference: &Reference, from: &str) -> Option<&'a str> {
        match reference {
            Reference::Wiki(target) => self.resolve_wiki(target, from),
            Reference::Relative(target) => {
                let joined = normalize(&format!("{}/{}", parent_dir(from), target))?;
                self.paths.get(joined.as_str()).copied()
            }
        }
    }

    fn resolve_wiki(&self, target: &str, from: &str) -> Option<&'a str> {
        let target = target.trim().trim_start_matches('/');
        if target.contains('/') {
            let with_ext = if target.ends_with(".md") {
                target.to_string()
            } else {
                format!("{target}.md")
            };
            let normalized = normalize(&with_ext)?;
            return self.paths.get(normalized.as_str()).copied();
        }

        let stem = target.strip_suffix(".md").unwrap_or(target).to_lowercase();
        let candidates = self.by_stem.get(&stem)?;
        let here = parent_dir(from);
        candidates
            .iter()
            .find(|p| parent_dir(p) == here)
            .or_else(|| candidates.first())
            .copied()
    }
}

/// Collapse `.` and `..` segments. `None` if the path climbs above the root.
fn normalize(path: &str) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            s => parts.push(s),
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Directory structure of the node set.
struct Hierarchy<'a> {
    /// Directory → its index document.
    index_of: BTreeMap<&'a str, &'a str>,
    /// Every document path, index documents included.
    all: Vec<&'a str>,
}

/// What a set of siblings has in common.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum SiblingGroup<'a> {
    /// Children of this index document, adopted ones included.
    Parent(&'a str),
    /// Documents in a directory with no index above it.
    Dir(&'a str),
}

impl<'a> Hierarchy<'a> {
    fn new(paths: impl Iterator<Item = &'a str>, index_names: &[String]) -> Self {
        let all: Vec<&str> = paths.collect();
        let mut index_of: BTreeMap<&str, (usize, &str)> = BTreeMap::new();
        for &path in &all {
            let name = file_name(path);
            if let Some(rank) = index_names.iter().position(|n| n.eq_ignore_ascii_case(name)) {
                let dir = parent_dir(path);
                match index_of.get(dir) {
                    Some((existing, _)) if *existing <= rank => {}
                    _ => {
                        index_of.insert(dir, (rank, path));
                    }
                }
            }
        }
        let index_of: BTreeMap<&str, &str> =
            index_of.into_iter().map(|(dir, (_, p))| (dir, p)).collect();

        Self { index_of, all }
    }

    fn is_index(&self, path: &str) -> bool {
        self.index_of.get(parent_dir(path)) == Some(&path)
    }

    /// Non-index documents grouped by their hierarchy parent.
    fn sibling_groups(&self) -> BTreeMap<SiblingGroup<'a>, Vec<&'a str>> {
        let mut groups: BTreeMap<SiblingGroup<'a>, Vec<&'a str>> = BTreeMap::new();
        for &path in &self.all {
            if self.is_index(path) {
                continue;
            }
            let dir = parent_dir(path);
            let group = match self.nearest_index(dir) {
                Some(parent) => SiblingGroup::Parent(parent),
                None => SiblingGroup::Dir(dir),
            };
            groups.entry(group).or_default().push(path);
        }
        groups
    }

    /// Index document of `dir` or its nearest ancestor directory.
    fn nearest_index(&self, mut dir: &str) -> Option<&'a str> {
        loop {
            if let Some(&index) = self.index_of.get(dir) {
                return Some(index);
            }
            if dir.is_empty() {
                return None;
            }
            dir = parent_dir(dir);
        }
    }

    /// `(parent, child)` pairs.
    fn parent_links(&self) -> Vec<(&'a str, &'a str)> {
        let mut links = Vec::new();
        for &path in &self.all {
            let dir = parent_dir(path);
            let parent = if self.is_index(path) {
                if dir.is_empty() {
                    None
                } else {
                    self.nearest_index(parent_dir(dir))
                }
            } else {
                self.nearest_index(dir)
            };
            if let Some(parent) = parent {
                links.push((parent, path));
            }
        }
        links
    }
}
