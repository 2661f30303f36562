//! The live graph: owns the current snapshot and coordinates rebuilds.
//!
//! Readers take an `Arc<KnowledgeGraph>` and keep it for the whole request, so
//! a rebuild publishing a new snapshot never changes what a running query sees.
//! Only one build runs at a time; a second request is rejected.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Instant;

use crate::config::{StrataConfig, VaultConfig};
use crate::error::{IndexError, IndexResult};
use crate::graph::builder::{build_graph, scorer_from_name, BuildOptions, LinkScorer};
use crate::graph::snapshot::{load_snapshot, save_snapshot};
use crate::graph::staleness;
use crate::graph::types::KnowledgeGraph;
use crate::vault::frontmatter::{FrontmatterValidator, SchemaValidator};
use crate::vault::parser::ParseOutcome;
use crate::vault::{list_markdown_files, read_document, scan_vault, DocumentRead, VaultFile, VaultSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildMode {
    /// Reparse every document.
    Full,
    /// Reuse cached parses for documents that are neither stale nor modified.
    Incremental,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildState {
    Idle,
    Building,
    Ready,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildSummary {
    pub mode: BuildMode,
    pub node_count: usize,
    pub edge_count: usize,
    /// Documents read and parsed in this build.
    pub parsed: usize,
    /// Documents taken from the parse cache.
    pub reused: usize,
    /// Documents whose frontmatter was missing or invalid.
    pub failed: usize,
    /// Files skipped before parsing (unreadable or oversized).
    pub skipped: usize,
    pub built_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone)]
struct CachedParse {
    mtime: DateTime<Utc>,
    outcome: ParseOutcome,
}

pub struct GraphIndex {
    vault_root: PathBuf,
    vault: VaultConfig,
    snapshot_path: PathBuf,
    options: BuildOptions,
    scorer: Box<dyn LinkScorer>,
    validator: Box<dyn FrontmatterValidator>,
    db: Arc<Mutex<Connection>>,
    current: RwLock<Option<Arc<KnowledgeGraph>>>,
    state: Mutex<BuildState>,
    cache: Mutex<HashMap<String, CachedParse>>,
}

impl GraphIndex {
    pub fn new(config: &StrataConfig, db: Arc<Mutex<Connection>>) -> Self {
        Self {
            vault_root: config.resolved_vault_root(),
            vault: config.vault.clone(),
            snapshot_path: config.resolved_snapshot_path(),
            options: BuildOptions::from_config(config),
            scorer: scorer_from_name(&config.graph.link_scorer),
            validator: Box::new(SchemaValidator),
            db,
            current: RwLock::new(None),
            state: Mutex::new(BuildState::Idle),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn vault_root(&self) -> &Path {
        &self.vault_root
    }

    pub fn state(&self) -> BuildState {
        *lock(&self.state)
    }

    /// The current snapshot, if a graph has been built or loaded.
    pub fn current(&self) -> Option<Arc<KnowledgeGraph>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The current snapshot, or `IndexNotBuilt`.
    pub fn snapshot(&self) -> IndexResult<Arc<KnowledgeGraph>> {
        self.current().ok_or(IndexError::IndexNotBuilt)
    }

    /// Run `f` with the metadata connection held.
    pub fn with_db<T>(&self, f: impl FnOnce(&mut Connection) -> IndexResult<T>) -> IndexResult<T> {
        let mut conn = lock(&self.db);
        f(&mut conn)
    }

    pub fn document_source(&self) -> VaultSource {
        VaultSource::new(&self.vault_root)
    }

    pub fn read_document(&self, rel_path: &str) -> DocumentRead {
        read_document(&self.vault_root, rel_path, self.validator.as_ref())
    }

    /// Restore the persisted snapshot, if one exists. Returns whether a graph
    /// was loaded.
    pub fn load_snapshot(&self) -> IndexResult<bool> {
        let Some(graph) = load_snapshot(&self.snapshot_path)? else {
            tracing::info!(path = %self.snapshot_path.display(), "no persisted snapshot");
            return Ok(false);
        };
        self.publish(graph);
        *lock(&self.state) = BuildState::Ready;
        Ok(true)
    }

    /// Rebuild the graph from the vault and publish it.
    ///
    /// On failure the previous snapshot stays current and the state returns to
    /// what it was before the call.
    pub fn rebuild(&self, mode: BuildMode) -> IndexResult<BuildSummary> {
        let previous = {
            let mut state = lock(&self.state);
            if *state == BuildState::Building {
                tracing::warn!("rebuild rejected, build already running");
                return Err(IndexError::BuildInProgress);
            }
            std::mem::replace(&mut *state, BuildState::Building)
        };

        tracing::info!(mode = ?mode, vault = %self.vault_root.display(), "graph build started");
        let outcome = self.run_build(mode);

        let mut state = lock(&self.state);
        match &outcome {
            Ok(summary) => {
                *state = BuildState::Ready;
                tracing::info!(
                    nodes = summary.node_count,
                    edges = summary.edge_count,
                    parsed = summary.parsed,
                    reused = summary.reused,
                    failed = summary.failed,
                    elapsed_ms = summary.elapsed_ms,
                    "graph built"
                );
            }
            Err(e) => {
                *state = previous;
                tracing::error!(error = %e, "graph build failed");
            }
        }
        outcome
    }

    fn run_build(&self, mode: BuildMode) -> IndexResult<BuildSummary> {
        let started = Instant::now();
        let started_at = Utc::now();

        if !self.vault_root.is_dir() {
            return Err(IndexError::Vault(format!(
                "vault root {} is not a directory",
                self.vault_root.display()
            )));
        }
        let files = list_markdown_files(&self.vault_root, &self.vault)
            .map_err(|e| IndexError::Vault(format!("{e:#}")))?;

        let stale: BTreeSet<String> = match mode {
            BuildMode::Full => BTreeSet::new(),
            BuildMode::Incremental => self.with_db(|conn| staleness::load_stale_nodes(conn))?,
        };

        let (reused, to_parse) = {
            let cache = lock(&self.cache);
            let mut reused: Vec<(DateTime<Utc>, ParseOutcome)> = Vec::new();
            let mut to_parse: Vec<VaultFile> = Vec::new();
            for file in files {
                let hit = match mode {
                    BuildMode::Full => None,
                    BuildMode::Incremental if stale.contains(&file.rel_path) => None,
                    BuildMode::Incremental => cache
                        .get(&file.rel_path)
                        .filter(|c| c.mtime == file.mtime),
                };
                match hit {
                    Some(cached) => reused.push((cached.mtime, cached.outcome.clone())),
                    None => to_parse.push(file),
                }
            }
            (reused, to_parse)
        };

        let report = scan_vault(&to_parse, &self.vault, self.validator.as_ref());
        for failure in report.failures() {
            if let ParseOutcome::Failed { path, errors, .. } = failure {
                tracing::warn!(path = %path, errors = ?errors, "document failed to parse");
            }
        }

        let parsed_count = report.outcomes.len();
        let reused_count = reused.len();
        let failed = report.failures().count()
            + reused
                .iter()
                .filter(|(_, o)| matches!(o, ParseOutcome::Failed { .. }))
                .count();
        let skipped = report.skipped.len();

        let mtimes: HashMap<&str, DateTime<Utc>> = to_parse
            .iter()
            .map(|f| (f.rel_path.as_str(), f.mtime))
            .collect();
        let mut next_cache: HashMap<String, CachedParse> = HashMap::new();
        for (mtime, outcome) in reused {
            next_cache.insert(outcome.path().to_string(), CachedParse { mtime, outcome });
        }
        for outcome in report.outcomes {
            if let Some(&mtime) = mtimes.get(outcome.path()) {
                next_cache.insert(outcome.path().to_string(), CachedParse { mtime, outcome });
            }
        }

        let docs: Vec<_> = next_cache
            .values()
            .filter_map(|c| c.outcome.clone().into_parsed())
            .collect();
        let built_at = Utc::now();
        let graph = build_graph(&docs, &self.options, self.scorer.as_ref(), built_at);

        save_snapshot(&self.snapshot_path, &graph)?;
        self.with_db(|conn| staleness::record_build(conn, started_at, built_at, graph.node_count()))?;

        let summary = BuildSummary {
            mode,
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
            parsed: parsed_count,
            reused: reused_count,
            failed,
            skipped,
            built_at,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };

        *lock(&self.cache) = next_cache;
        self.publish(graph);
        Ok(summary)
    }

    fn publish(&self, graph: KnowledgeGraph) {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = Some(Arc::new(graph));
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
