//! Vault scanning and single-document reads.
//!
//! [`list_markdown_files`] enumerates `**/*.md` under the vault root,
//! [`scan_vault`] reads and parses them in parallel, and [`read_document`] serves
//! direct single-document requests. Unreadable files are skipped during scans.

pub mod frontmatter;
pub mod parser;
pub mod references;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use crate::config::VaultConfig;
use frontmatter::{split_frontmatter, FrontmatterValidator};
use parser::{parse_document, ParseOutcome};

/// A markdown file found under the vault root.
#[derive(Debug, Clone, PartialEq)]
pub struct VaultFile {
    /// Vault-relative path with `/` separators.
    pub rel_path: String,
    pub abs_path: PathBuf,
    pub mtime: DateTime<Utc>,
    pub size: u64,
}

/// Everything a scan produced: parse outcomes plus files that could not be read.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub outcomes: Vec<ParseOutcome>,
    /// `(path, reason)` for files skipped before parsing.
    pub skipped: Vec<(String, String)>,
}

impl ScanReport {
    pub fn failures(&self) -> impl Iterator<Item = &ParseOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ParseOutcome::Failed { .. }))
    }
}

/// Result of a direct single-document read.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DocumentRead {
    Found {
        path: String,
        title: String,
        layer: u8,
        tags: Vec<String>,
        body: String,
    },
    Invalid {
        path: String,
        errors: Vec<String>,
        raw: String,
    },
    NotFound {
        path: String,
    },
}

/// List markdown files under `root`, sorted by relative path.
///
/// Files inside any of `config.ignore_dirs` are left out. Entries whose metadata
/// cannot be read are skipped with a warning.
pub fn list_markdown_files(root: &Path, config: &VaultConfig) -> Result<Vec<VaultFile>> {
    let pattern = format!(
        "{}/**/*.md",
        glob::Pattern::escape(&root.to_string_lossy())
    );
    let entries = glob::glob(&pattern).context("invalid vault glob pattern")?;

    let mut files = Vec::new();
    for entry in entries {
        let abs_path = match entry {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable vault entry");
                continue;
            }
        };
        let Some(rel_path) = relative_path(root, &abs_path) else {
            continue;
        };
        if rel_path
            .split('/')
            .any(|segment| config.ignore_dirs.iter().any(|d| d == segment))
        {
            continue;
        }
        let meta = match std::fs::metadata(&abs_path) {
            Ok(m) if m.is_file() => m,
            Ok(_) => continue,
            Err(e) => {
                tracing::warn!(path = %rel_path, error = %e, "stat failed, skipping");
                continue;
            }
        };
        let mtime = meta
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        files.push(VaultFile {
            rel_path,
            abs_path,
            mtime,
            size: meta.len(),
        });
    }

    files.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    Ok(files)
}

/// Read and parse every listed file in parallel.
pub fn scan_vault(
    files: &[VaultFile],
    config: &VaultConfig,
    validator: &dyn FrontmatterValidator,
) -> ScanReport {
    let results: Vec<std::result::Result<ParseOutcome, (String, String)>> = files
        .par_iter()
        .map(|file| {
            let content = read_vault_file(file, config.max_file_bytes)?;
            Ok(parse_document(&file.rel_path, &content, file.mtime, validator))
        })
        .collect();

    let mut report = ScanReport::default();
    for result in results {
        match result {
            Ok(outcome) => report.outcomes.push(outcome),
            Err(skip) => report.skipped.push(skip),
        }
    }
    report
}

fn read_vault_file(
    file: &VaultFile,
    max_bytes: u64,
) -> std::result::Result<String, (String, String)> {
    if file.size > max_bytes {
        tracing::warn!(path = %file.rel_path, size = file.size, "file exceeds size limit, skipping");
        return Err((file.rel_path.clone(), format!("larger than {max_bytes} bytes")));
    }
    std::fs::read_to_string(&file.abs_path).map_err(|e| {
        tracing::warn!(path = %file.rel_path, error = %e, "read failed, skipping");
        (file.rel_path.clone(), e.to_string())
    })
}

/// Read a single document by vault-relative path.
///
/// I/O failures and paths escaping the vault are reported as `NotFound`.
pub fn read_document(
    root: &Path,
    rel_path: &str,
    validator: &dyn FrontmatterValidator,
) -> DocumentRead {
    let not_found = || DocumentRead::NotFound {
        path: rel_path.to_string(),
    };

    let Some(abs_path) = resolve_in_vault(root, rel_path) else {
        return not_found();
    };
    let (content, mtime) = match std::fs::read_to_string(&abs_path).and_then(|c| {
        let mtime = std::fs::metadata(&abs_path)?.modified()?;
        Ok((c, DateTime::<Utc>::from(mtime)))
    }) {
        Ok(pair) => pair,
        Err(e) => {
            tracing::debug!(path = %rel_path, error = %e, "document read failed");
            return not_found();
        }
    };

    match parse_document(rel_path, &content, mtime, validator) {
        ParseOutcome::Parsed(doc) => DocumentRead::Found {
            path: doc.path,
            title: doc.title,
            layer: doc.layer,
            tags: doc.tags,
            body: doc.body,
        },
        ParseOutcome::Failed { path, errors, raw } => DocumentRead::Invalid { path, errors, raw },
    }
}

/// Supplies document bodies to the context assembler.
pub trait DocumentSource: Send + Sync {
    /// Body text (frontmatter stripped) for a node id, or `None` if unavailable.
    fn body(&self, id: &str) -> Option<String>;
}

/// Reads bodies straight from the vault on disk.
#[derive(Debug, Clone)]
pub struct VaultSource {
    root: PathBuf,
}

impl VaultSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl DocumentSource for VaultSource {
    fn body(&self, id: &str) -> Option<String> {
        let path = resolve_in_vault(&self.root, id)?;
        let content = std::fs::read_to_string(path).ok()?;
        match split_frontmatter(&content) {
            Ok((_, body)) => Some(body.to_string()),
            Err(_) => Some(content),
        }
    }
}

impl DocumentSource for HashMap<String, String> {
    fn body(&self, id: &str) -> Option<String> {
        self.get(id).cloned()
    }
}

/// Convert a vault-relative path to an absolute one, refusing anything that
/// would escape the root.
pub fn resolve_in_vault(root: &Path, rel_path: &str) -> Option<PathBuf> {
    let rel = Path::new(rel_path);
    if rel
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return None;
    }
    Some(root.join(rel))
}

/// `abs` relative to `root`, joined with `/`.
pub fn relative_path(root: &Path, abs: &Path) -> Option<String> {
    let rel = abs.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::frontmatter::SchemaValidator;
    use tempfile::TempDir;

    const DOC: &str = "---\nlayer: 1\ntags: [core]\ncreated: 2024-01-01\nupdated: 2024-01-01\n---\n# Core\nbody\n";

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn lists_markdown_and_skips_ignored_dirs() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "b.md", DOC);
        write(tmp.path(), "dir/a.md", DOC);
        write(tmp.path(), "dir/notes.txt", "x");
        write(tmp.path(), ".obsidian/cache.md", DOC);

        let files = list_markdown_files(tmp.path(), &VaultConfig::default()).unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.rel_path.as_str()).collect();
        assert_eq!(paths, vec!["b.md", "dir/a.md"]);
    }

    #[test]
    fn scan_separates_failures_and_oversized_files() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "good.md", DOC);
        write(tmp.path(), "bad.md", "no frontmatter");
        write(tmp.path(), "huge.md", &"x".repeat(2048));

        let config = VaultConfig {
            max_file_bytes: 1024,
            ..VaultConfig::default()
        };
        let files = list_markdown_files(tmp.path(), &config).unwrap();
        let report = scan_vault(&files, &config, &SchemaValidator);

        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.failures().count(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].0, "huge.md");
    }

    #[test]
    fn read_document_variants() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "good.md", DOC);
        write(tmp.path(), "bad.md", "---\nlayer: 0\n---\n");

        assert!(matches!(
            read_document(tmp.path(), "good.md", &SchemaValidator),
            DocumentRead::Found { layer: 1, .. }
        ));
        assert!(matches!(
            read_document(tmp.path(), "bad.md", &SchemaValidator),
            DocumentRead::Invalid { .. }
        ));
        assert!(matches!(
            read_document(tmp.path(), "missing.md", &SchemaValidator),
            DocumentRead::NotFound { .. }
        ));
        assert!(matches!(
            read_document(tmp.path(), "../escape.md", &SchemaValidator),
            DocumentRead::NotFound { .. }
        ));
    }

    #[test]
    fn vault_source_strips_frontmatter() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "good.md", DOC);
        let source = VaultSource::new(tmp.path());
        assert_eq!(source.body("good.md").as_deref(), Some("# Core\nbody\n"));
        assert!(source.body("nope.md").is_none());
    }
}
