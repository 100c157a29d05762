//! Schema validation of YAML documents with source-located errors

use jsonschema::error::ValidationErrorKind;
use jsonschema::{validator_for, ValidationError as JsonSchemaError, Validator as JsonValidator};
use miette::{Diagnostic, NamedSource, SourceSpan};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use thiserror::Error;

use crate::schema::registry::{SchemaKind, SchemaRegistry};

/// Every schema violation found in one document
#[derive(Debug, Error, Diagnostic)]
#[error("{kind} {filename} is invalid: {summary}")]
#[diagnostic(code(ecopark::schema::invalid))]
pub struct ValidationError {
    kind: SchemaKind,
    filename: String,
    summary: String,

    #[source_code]
    src: NamedSource<String>,

    #[related]
    violations: Vec<SchemaViolation>,
}

/// A single schema violation
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
pub struct SchemaViolation {
    #[label("{hint}")]
    span: SourceSpan,

    message: String,
    hint: String,

    #[help]
    help: Option<String>,
}

impl ValidationError {
    fn new(
        kind: SchemaKind,
        filename: &str,
        source: &str,
        violations: Vec<SchemaViolation>,
    ) -> Self {
        let summary = match violations.len() {
            1 => "1 error".to_string(),
            n => format!("{n} errors"),
        };
        Self {
            kind,
            filename: filename.to_string(),
            summary,
            src: NamedSource::new(filename, source.to_string()),
            violations,
        }
    }

    pub fn violation_count(&self) -> usize {
        self.violations.len()
    }

    /// Violation messages, in document order
    pub fn messages(&self) -> Vec<&str> {
        self.violations.iter().map(|v| v.message.as_str()).collect()
    }
}

/// Compiled schemas for every document kind
pub struct Validator {
    compiled: HashMap<SchemaKind, JsonValidator>,
}

impl Validator {
    pub fn new(registry: &SchemaRegistry) -> Self {
        let compiled = SchemaKind::all()
            .iter()
            .filter_map(|kind| {
                let schema: JsonValue = serde_json::from_str(registry.get(*kind)?).ok()?;
                let validator = validator_for(&schema).ok()?;
                Some((*kind, validator))
            })
            .collect();
        Self { compiled }
    }

    /// Check `content` against the schema of `kind`, collecting every violation
    pub fn validate(
        &self,
        content: &str,
        filename: &str,
        kind: SchemaKind,
    ) -> Result<(), ValidationError> {
        let yaml: serde_yml::Value = serde_yml::from_str(content).map_err(|e| {
            let violation = SchemaViolation {
                span: location_span(content, e.location()),
                message: format!("YAML parse error: {e}"),
                hint: "invalid YAML".to_string(),
                help: Some("check indentation, colons and quoting".to_string()),
            };
            ValidationError::new(kind, filename, content, vec![violation])
        })?;

        let json: JsonValue = serde_json::to_value(&yaml).map_err(|e| {
            let violation = SchemaViolation {
                span: (0, content.len()).into(),
                message: format!("cannot read document as JSON: {e}"),
                hint: "conversion error".to_string(),
                help: None,
            };
            ValidationError::new(kind, filename, content, vec![violation])
        })?;

        let Some(schema) = self.compiled.get(&kind) else {
            return Ok(());
        };

        let violations: Vec<SchemaViolation> = schema
            .iter_errors(&json)
            .map(|e| to_violation(content, &e))
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(kind, filename, content, violations))
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(&SchemaRegistry::default())
    }
}

fn to_violation(content: &str, error: &JsonSchemaError) -> SchemaViolation {
    let path = error.instance_path.to_string();
    SchemaViolation {
        span: path_span(content, &path),
        message: describe(error, &path),
        hint: hint(error).to_string(),
        help: help(error),
    }
}

fn describe(error: &JsonSchemaError, path: &str) -> String {
    let at = if path.is_empty() {
        "document root".to_string()
    } else {
        format!("'{path}'")
    };

    match &error.kind {
        ValidationErrorKind::Required { property } => {
            let name = property
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| property.to_string());
            format!("missing required field '{name}' at {at}")
        }
        ValidationErrorKind::Type { kind } => format!("wrong type at {at}: expected {kind:?}"),
        ValidationErrorKind::Enum { options } => {
            format!("invalid value at {at}: must be one of {}", enum_options(options))
        }
        ValidationErrorKind::Pattern { .. } => format!("badly formatted value at {at}"),
        ValidationErrorKind::AdditionalProperties { unexpected } => {
            format!("unknown field(s) at {at}: {}", unexpected.join(", "))
        }
        _ => format!("invalid value at {at}: {error}"),
    }
}

fn enum_options(options: &JsonValue) -> String {
    options
        .as_array()
        .map(|values| {
            values
                .iter()
                .filter_map(|v| v.as_str())
                .filter(|s| s.chars().all(|c| !c.is_lowercase()))
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_else(|| options.to_string())
}

fn hint(error: &JsonSchemaError) -> &'static str {
    match &error.kind {
        ValidationErrorKind::Required { .. } => "required field missing",
        ValidationErrorKind::Type { .. } => "wrong type",
        ValidationErrorKind::Enum { .. } => "invalid value",
        ValidationErrorKind::Pattern { .. } => "bad format",
        ValidationErrorKind::AdditionalProperties { .. } => "unknown field",
        _ => "here",
    }
}

fn help(error: &JsonSchemaError) -> Option<String> {
    match &error.kind {
        ValidationErrorKind::Pattern { pattern } if pattern.contains(':') => {
            Some("times are written HH:MM, e.g. \"10:30\"".to_string())
        }
        ValidationErrorKind::Pattern { pattern } if pattern.contains('-') => {
            Some("dates are written YYYY-MM-DD, e.g. 2026-10-20".to_string())
        }
        ValidationErrorKind::AdditionalProperties { unexpected } if unexpected.len() == 1 => {
            Some(format!("remove '{}' or check its spelling", unexpected[0]))
        }
        _ => None,
    }
}

/// Span of the line a serde_yml location points at
fn location_span(content: &str, location: Option<serde_yml::Location>) -> SourceSpan {
    let Some(loc) = location else {
        return first_line(content);
    };
    let start = line_start(content, loc.line().saturating_sub(1))
        + loc.column().saturating_sub(1);
    let start = start.min(content.len());
    let len = content[start..].find('\n').unwrap_or(content.len() - start).max(1);
    (start, len).into()
}

/// Span of the YAML node a JSON pointer like `/participants/1/age` refers to
///
/// Keys are matched as `key:` lines and indices as `- ` list items, each
/// searched after the previous match.
fn path_span(content: &str, pointer: &str) -> SourceSpan {
    let lines: Vec<(usize, &str)> = content
        .split_inclusive('\n')
        .scan(0, |offset, line| {
            let start = *offset;
            *offset += line.len();
            Some((start, line.trim_end_matches(['\n', '\r'])))
        })
        .collect();

    let mut cursor = 0;
    let mut found: Option<(usize, &str)> = None;
    for part in pointer.split('/').filter(|p| !p.is_empty()) {
        let hit = match part.parse::<usize>() {
            Ok(index) => lines[cursor..]
                .iter()
                .enumerate()
                .filter(|(_, (_, l))| l.trim_start().starts_with("- "))
                .nth(index),
            Err(_) => {
                let key = format!("{part}:");
                lines[cursor..].iter().enumerate().find(|(_, (_, l))| {
                    let t = l.trim_start().trim_start_matches("- ");
                    t.starts_with(&key)
                })
            }
        };
        match hit {
            Some((i, line)) => {
                found = Some(*line);
                // Next key may sit on the same line as a list dash
                cursor += i;
            }
            None => break,
        }
    }

    match found {
        Some((start, line)) => {
            let indent = line.len() - line.trim_start().len();
            (start + indent, line.trim().len().max(1)).into()
        }
        None => first_line(content),
    }
}

fn line_start(content: &str, index: usize) -> usize {
    content
        .split_inclusive('\n')
        .take(index)
        .map(str::len)
        .sum()
}

fn first_line(content: &str) -> SourceSpan {
    (0, content.find('\n').unwrap_or(content.len()).max(1)).into()
}
