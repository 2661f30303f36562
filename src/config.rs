use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct StrataConfig {
    pub server: ServerConfig,
    pub vault: VaultConfig,
    pub storage: StorageConfig,
    pub graph: GraphConfig,
    pub query: QueryDefaults,
    pub context: ContextConfig,
    pub status: StatusConfig,
    pub invalidation: InvalidationConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub transport: String,
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct VaultConfig {
    /// Root directory of the markdown vault.
    pub root: String,
    /// File names that make a document the parent of its directory.
    pub index_names: Vec<String>,
    /// Directory names skipped during scanning.
    pub ignore_dirs: Vec<String>,
    /// Files larger than this are skipped during a build.
    pub max_file_bytes: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
    pub snapshot_path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GraphConfig {
    pub weights: EdgeWeights,
    /// Directories with more documents than this emit no SIBLING edges.
    pub sibling_fanout_limit: usize,
    /// `"base"` (fixed LINK weight) or `"tag_overlap"`.
    pub link_scorer: String,
}

/// Base weight per edge type, each in `[0.0, 1.0]`.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct EdgeWeights {
    pub link: f64,
    pub parent_of: f64,
    pub child_of: f64,
    pub sibling: f64,
    pub relationship: f64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct QueryDefaults {
    pub max_results: usize,
    pub decay: f64,
    pub threshold: f64,
    pub max_hops: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ContextConfig {
    pub token_budget: usize,
    pub excerpt_chars: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StatusConfig {
    /// Stale fraction above which a rebuild is recommended.
    pub rebuild_threshold: f64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct InvalidationConfig {
    /// Tool names whose write events mark the touched document stale.
    pub tools: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: "stdio".into(),
            host: "127.0.0.1".into(),
            port: 7411,
            log_level: "info".into(),
        }
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        let root = default_strata_dir()
            .join("vault")
            .to_string_lossy()
            .into_owned();
        Self {
            root,
            index_names: vec!["index.md".into(), "README.md".into(), "_index.md".into()],
            ignore_dirs: vec![".git".into(), ".obsidian".into(), ".trash".into()],
            max_file_bytes: 1024 * 1024,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let dir = default_strata_dir();
        Self {
            db_path: dir.join("metadata.db").to_string_lossy().into_owned(),
            snapshot_path: dir.join("graph.json").to_string_lossy().into_owned(),
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            weights: EdgeWeights::default(),
            sibling_fanout_limit: 64,
            link_scorer: "base".into(),
        }
    }
}

impl Default for EdgeWeights {
    fn default() -> Self {
        Self {
            link: 0.8,
            parent_of: 0.6,
            child_of: 0.6,
            sibling: 0.4,
            relationship: 0.7,
        }
    }
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            max_results: 10,
            decay: 0.7,
            threshold: 0.1,
            max_hops: 5,
        }
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            token_budget: 2000,
            excerpt_chars: 400,
        }
    }
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            rebuild_threshold: 0.1,
        }
    }
}

impl Default for InvalidationConfig {
    fn default() -> Self {
        Self {
            tools: vec!["Write".into(), "Edit".into(), "MultiEdit".into()],
        }
    }
}

/// Returns `~/.strata/`
pub fn default_strata_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".strata")
}

/// Returns the default config file path: `~/.strata/config.toml`
pub fn default_config_path() -> PathBuf {
    default_strata_dir().join("config.toml")
}

impl StrataConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            StrataConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (STRATA_VAULT, STRATA_DB, STRATA_LOG_LEVEL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("STRATA_VAULT") {
            self.vault.root = val;
        }
        if let Ok(val) = std::env::var("STRATA_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("STRATA_LOG_LEVEL") {
            self.server.log_level = val;
        }
    }

    /// Resolve the vault root, expanding `~` if needed.
    pub fn resolved_vault_root(&self) -> PathBuf {
        expand_tilde(&self.vault.root)
    }

    /// Resolve the metadata database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }

    /// Resolve the graph snapshot path, expanding `~` if needed.
    pub fn resolved_snapshot_path(&self) -> PathBuf {
        expand_tilde(&self.storage.snapshot_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
