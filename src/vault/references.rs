//! Inline cross-reference extraction from markdown bodies.

use regex::Regex;
use std::sync::LazyLock;

/// `[[target]]`, `[[target|alias]]`, `[[target#heading]]`, and `![[embed]]`.
static RE_WIKI_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[([^\[\]|#]+)(?:#[^\[\]|]*)?(?:\|[^\[\]]*)?\]\]").expect("valid wiki link regex")
});

/// `[text](target)` with an optional `"title"`.
static RE_MD_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\[[^\]]*\]\(\s*<?([^)\s>]+)>?(?:\s+"[^"]*")?\s*\)"#).expect("valid markdown link regex")
});

/// An unresolved reference as written in a document body.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Reference {
    /// Wiki-style target: a vault path or a bare note name.
    Wiki(String),
    /// Markdown link target, relative to the linking document's directory.
    Relative(String),
}

/// Extract references in order of first appearance, deduplicated.
///
/// Links inside fenced code blocks are ignored, as are external URLs,
/// same-document anchors, and links to non-markdown files.
pub fn extract_references(body: &str) -> Vec<Reference> {
    let mut refs: Vec<Reference> = Vec::new();
    let mut push = |r: Reference| {
        if !refs.contains(&r) {
            refs.push(r);
        }
    };

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

        for cap in RE_WIKI_LINK.captures_iter(line) {
            let target = cap[1].trim();
            if !target.is_empty() {
                push(Reference::Wiki(target.to_string()));
            }
        }

        for cap in RE_MD_LINK.captures_iter(line) {
            if let Some(target) = markdown_target(&cap[1]) {
                push(Reference::Relative(target));
            }
        }
    }

    refs
}

fn markdown_target(raw: &str) -> Option<String> {
    if raw.contains("://") || raw.starts_with("mailto:") || raw.starts_with('#') {
        return None;
    }
    let path = raw.split('#').next().unwrap_or(raw);
    let path = path.replace("%20", " ");
    if path.ends_with(".md") {
        Some(path)
    } else {
        None
    }
}
