//! Turns a file's raw text into a [`ParsedDocument`] or a recorded failure.

use chrono::{DateTime, NaiveDate, Utc};

use super::frontmatter::{split_frontmatter, FrontmatterValidator, Validation};
use super::references::{extract_references, Reference};

/// A document whose frontmatter passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    /// Vault-relative path with `/` separators.
    pub path: String,
    pub title: String,
    pub layer: u8,
    /// Sorted and deduplicated; never empty.
    pub tags: Vec<String>,
    pub created: NaiveDate,
    pub updated: NaiveDate,
    pub expires: Option<NaiveDate>,
    pub confidence: Option<f64>,
    pub person: Option<String>,
    pub domain: Option<String>,
    pub related: Vec<String>,
    pub mtime: DateTime<Utc>,
    /// Text after the frontmatter block.
    pub body: String,
    pub references: Vec<Reference>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Parsed(ParsedDocument),
    /// Frontmatter missing or rejected. `raw` is the content exactly as read.
    Failed {
        path: String,
        errors: Vec<String>,
        raw: String,
    },
}

impl ParseOutcome {
    pub fn path(&self) -> &str {
        match self {
            Self::Parsed(doc) => &doc.path,
            Self::Failed { path, .. } => path,
        }
    }

    pub fn into_parsed(self) -> Option<ParsedDocument> {
        match self {
            Self::Parsed(doc) => Some(doc),
            Self::Failed { .. } => None,
        }
    }
}

/// Parse one document.
pub fn parse_document(
    path: &str,
    content: &str,
    mtime: DateTime<Utc>,
    validator: &dyn FrontmatterValidator,
) -> ParseOutcome {
    let failed = |errors: Vec<String>| ParseOutcome::Failed {
        path: path.to_string(),
        errors,
        raw: content.to_string(),
    };

    let (yaml, body) = match split_frontmatter(content) {
        Ok(split) => split,
        Err(e) => return failed(vec![format!("{e:#}")]),
    };

    let fm = match validator.validate(&yaml) {
        Validation::Valid(fm) => fm,
        Validation::Invalid(errors) => return failed(errors),
    };

    let title = fm
        .title
        .clone()
        .or_else(|| first_heading(body))
        .unwrap_or_else(|| file_stem(path).to_string());

    let mut tags = fm.tags;
    tags.sort();
    tags.dedup();

    ParseOutcome::Parsed(ParsedDocument {
        path: path.to_string(),
        title,
        layer: fm.layer,
        tags,
        created: fm.created,
        updated: fm.updated,
        expires: fm.expires,
        confidence: fm.confidence,
        person: fm.person,
        domain: fm.domain,
        related: fm.related,
        mtime,
        body: body.to_string(),
        references: extract_references(body),
    })
}

/// First level-one ATX heading (`# Title`), outside code fences.
fn first_heading(body: &str) -> Option<String> {
    let mut in_fence = false;
    for line in body.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("# ") {
            let title = rest.trim().trim_end_matches('#').trim();
            if !title.is_empty() {
                return Some(title.to_string());
            }
        }
    }
    None
}

/// File name without directory or `.md` extension.
pub fn file_stem(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.strip_suffix(".md").unwrap_or(name)
}
