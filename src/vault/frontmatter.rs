//! YAML frontmatter extraction and schema validation.
//!
//! [`split_frontmatter`] separates the `---`-delimited YAML block from the body.
//! Validation is delegated to a [`FrontmatterValidator`]; [`SchemaValidator`] is
//! the default rule set. A validator never repairs input: it returns either
//! fully typed [`Frontmatter`] or the complete list of problems it found.

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use serde_yaml::Value;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Validated frontmatter fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Frontmatter {
    /// Vault layer, `1..=5`.
    pub layer: u8,
    pub tags: Vec<String>,
    pub created: NaiveDate,
    pub updated: NaiveDate,
    pub expires: Option<NaiveDate>,
    pub confidence: Option<f64>,
    pub person: Option<String>,
    pub domain: Option<String>,
    pub title: Option<String>,
    /// Explicit relationship targets, resolved like wiki links.
    pub related: Vec<String>,
}

/// Outcome of validating a frontmatter block.
#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    Valid(Frontmatter),
    Invalid(Vec<String>),
}

/// Pluggable frontmatter schema check.
pub trait FrontmatterValidator: Send + Sync {
    fn validate(&self, raw: &Value) -> Validation;
}

/// Split `content` into its YAML frontmatter and the remaining body.
///
/// The opening `---` must be the first line; the closing delimiter must sit at
/// the same indentation, so `---` inside indented block scalars is not mistaken
/// for the end of the block.
pub fn split_frontmatter(content: &str) -> Result<(Value, &str)> {
    let mut lines = content.split_inclusive('\n');
    let first = lines
        .next()
        .ok_or_else(|| anyhow!("document is empty"))?;
    if !first.trim_end().starts_with("---") {
        bail!("no frontmatter delimiter found at start of document");
    }
    let opening_indent = first.len() - first.trim_start().len();

    let mut offset = first.len();
    let yaml_start = offset;
    for line in lines {
        let trimmed = line.trim_start();
        let indent = line.len() - trimmed.len();
        if trimmed.trim_end() == "---" && indent == opening_indent {
            let yaml = &content[yaml_start..offset];
            let body = &content[offset + line.len()..];
            let value: Value = if yaml.trim().is_empty() {
                Value::Mapping(Default::default())
            } else {
                serde_yaml::from_str(yaml).context("failed to parse YAML frontmatter")?
            };
            return Ok((value, body));
        }
        offset += line.len();
    }

    bail!("frontmatter not properly closed with ---")
}

/// The default vault schema.
#[derive(Debug, Default, Clone, Copy)]
pub struct SchemaValidator;

impl FrontmatterValidator for SchemaValidator {
    fn validate(&self, raw: &Value) -> Validation {
        let mut errors = Vec::new();

        if !raw.is_mapping() {
            return Validation::Invalid(vec!["frontmatter must be a mapping".into()]);
        }

        let layer = match &raw["layer"] {
            Value::Null => {
                errors.push("missing required field: layer".into());
                None
            }
            Value::Number(n) => match n.as_u64() {
                Some(l @ 1..=5) => Some(l as u8),
                _ => {
                    errors.push(format!("layer must be an integer between 1 and 5, got {n}"));
                    None
                }
            },
            other => {
                errors.push(format!("layer must be an integer, got {}", describe(other)));
                None
            }
        };

        let tags = match &raw["tags"] {
            Value::Null => {
                errors.push("missing required field: tags".into());
                None
            }
            Value::Sequence(items) if items.is_empty() => {
                errors.push("tags must not be empty".into());
                None
            }
            Value::Sequence(items) => {
                let mut tags = Vec::with_capacity(items.len());
                for item in items {
                    match item.as_str().map(str::trim) {
                        Some(t) if !t.is_empty() => tags.push(t.to_string()),
                        _ => errors.push(format!("tags entries must be non-empty strings, got {}", describe(item))),
                    }
                }
                Some(tags)
            }
            other => {
                errors.push(format!("tags must be a list, got {}", describe(other)));
                None
            }
        };

        let created = required_date(raw, "created", &mut errors);
        let updated = required_date(raw, "updated", &mut errors);
        if let (Some(c), Some(u)) = (created, updated) {
            if u < c {
                errors.push(format!("updated ({u}) is earlier than created ({c})"));
            }
        }
        let expires = optional_date(raw, "expires", &mut errors);

        let confidence = match &raw["confidence"] {
            Value::Null => None,
            Value::Number(n) => match n.as_f64() {
                Some(c) if (0.0..=1.0).contains(&c) => Some(c),
                _ => {
                    errors.push(format!("confidence must be between 0.0 and 1.0, got {n}"));
                    None
                }
            },
            other => {
                errors.push(format!("confidence must be a number, got {}", describe(other)));
                None
            }
        };

        let person = optional_string(raw, "person", &mut errors);
        let domain = optional_string(raw, "domain", &mut errors);
        let title = optional_string(raw, "title", &mut errors);

        let related = match &raw["related"] {
            Value::Null => Vec::new(),
            Value::Sequence(items) => items
                .iter()
                .filter_map(|item| match item.as_str() {
                    Some(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                    _ => {
                        errors.push(format!("related entries must be strings, got {}", describe(item)));
                        None
                    }
                })
                .collect(),
            other => {
                errors.push(format!("related must be a list, got {}", describe(other)));
                Vec::new()
            }
        };

        match (layer, tags, created, updated) {
            (Some(layer), Some(tags), Some(created), Some(updated)) if errors.is_empty() => {
                Validation::Valid(Frontmatter {
                    layer,
                    tags,
                    created,
                    updated,
                    expires,
                    confidence,
                    person,
                    domain,
                    title,
                    related,
                })
            }
            _ => Validation::Invalid(errors),
        }
    }
}

fn required_date(raw: &Value, field: &str, errors: &mut Vec<String>) -> Option<NaiveDate> {
    if raw[field].is_null() {
        errors.push(format!("missing required field: {field}"));
        return None;
    }
    optional_date(raw, field, errors)
}

fn optional_date(raw: &Value, field: &str, errors: &mut Vec<String>) -> Option<NaiveDate> {
    match &raw[field] {
        Value::Null => None,
        Value::String(s) => match NaiveDate::parse_from_str(s.trim(), DATE_FORMAT) {
            Ok(d) => Some(d),
            Err(_) => {
                errors.push(format!("{field} must be a YYYY-MM-DD date, got {s:?}"));
                None
            }
        },
        other => {
            errors.push(format!("{field} must be a YYYY-MM-DD date, got {}", describe(other)));
            None
        }
    }
}

fn optional_string(raw: &Value, field: &str, errors: &mut Vec<String>) -> Option<String> {
    match &raw[field] {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.trim().to_string()),
        other => {
            errors.push(format!("{field} must be a string, got {}", describe(other)));
            None
        }
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(yaml: &str) -> Validation {
        let value: Value = serde_yaml::from_str(yaml).unwrap();
        SchemaValidator.validate(&value)
    }

    #[test]
    fn split_returns_yaml_and_body() {
        let content = "---\nlayer: 1\n---\n# Title\nBody text\n";
        let (yaml, body) = split_frontmatter(content).unwrap();
        assert_eq!(yaml["layer"].as_u64(), Some(1));
        assert_eq!(body, "# Title\nBody text\n");
    }

    #[test]
    fn split_ignores_indented_delimiter() {
        let content = "---\nnote: |\n  ---\n  inside\n---\nbody";
        let (yaml, body) = split_frontmatter(content).unwrap();
        assert!(yaml["note"].as_str().unwrap().contains("inside"));
        assert_eq!(body, "body");
    }

    #[test]
    fn split_missing_opening_delimiter() {
        let err = split_frontmatter("# Just markdown\n").unwrap_err();
        assert!(err.to_string().contains("no frontmatter delimiter"));
    }

    #[test]
    fn split_missing_closing_delimiter() {
        let err = split_frontmatter("---\nlayer: 1\n# no close\n").unwrap_err();
        assert!(err.to_string().contains("not properly closed"));
    }

    #[test]
    fn valid_frontmatter_is_typed() {
        let result = validate(
            "layer: 2\ntags: [rust, graphs]\ncreated: 2024-01-10\nupdated: 2024-02-01\nconfidence: 0.8\ndomain: engineering\nrelated: [core/identity]\n",
        );
        let Validation::Valid(fm) = result else {
            panic!("expected valid frontmatter");
        };
        assert_eq!(fm.layer, 2);
        assert_eq!(fm.tags, vec!["rust", "graphs"]);
        assert_eq!(fm.created, NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
        assert_eq!(fm.confidence, Some(0.8));
        assert_eq!(fm.domain.as_deref(), Some("engineering"));
        assert_eq!(fm.related, vec!["core/identity"]);
        assert!(fm.expires.is_none());
    }

    #[test]
    fn invalid_frontmatter_collects_every_error() {
        let result = validate("layer: 9\ntags: []\ncreated: yesterday\n");
        let Validation::Invalid(errors) = result else {
            panic!("expected invalid frontmatter");
        };
        assert!(errors.iter().any(|e| e.contains("layer")));
        assert!(errors.iter().any(|e| e.contains("tags must not be empty")));
        assert!(errors.iter().any(|e| e.contains("created must be a YYYY-MM-DD")));
        assert!(errors.iter().any(|e| e.contains("missing required field: updated")));
    }

    #[test]
    fn updated_before_created_is_rejected() {
        let result = validate("layer: 1\ntags: [a]\ncreated: 2024-05-01\nupdated: 2024-04-01\n");
        assert!(matches!(result, Validation::Invalid(ref e) if e[0].contains("earlier than created")));
    }
}
