//! YAML error diagnostics pointing at the offending line of a draft or seed file

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// YAML syntax or shape error with source location
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(ecopark::yaml::syntax))]
pub struct YamlSyntaxError {
    #[source_code]
    src: NamedSource<String>,

    #[label("here")]
    span: SourceSpan,

    #[help]
    help: Option<String>,

    message: String,
}

impl YamlSyntaxError {
    /// Build from a serde_yml error, locating it in `source`
    pub fn from_serde_error(err: &serde_yml::Error, source: &str, filename: &str) -> Self {
        let (line, column) = err
            .location()
            .map(|loc| (loc.line(), loc.column()))
            .unwrap_or((1, 1));

        let offset = line_col_to_offset(source, line, column);
        let message = err.to_string();
        let help = suggest(&message);

        Self {
            src: NamedSource::new(filename, source.to_string()),
            span: SourceSpan::from(offset..offset.saturating_add(1)),
            help,
            message,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum YamlError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] YamlSyntaxError),

    #[error("cannot read {path}: {source}")]
    #[diagnostic(code(ecopark::yaml::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Byte offset of a 1-based line/column pair, clamped to the source
fn line_col_to_offset(source: &str, line: usize, column: usize) -> usize {
    let line_start = source
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum::<usize>();
    if line_start >= source.len() {
        return source.len().saturating_sub(1);
    }

    let rest = &source[line_start..];
    let line_len = rest.find('\n').unwrap_or(rest.len());
    let col_offset = rest
        .char_indices()
        .nth(column.saturating_sub(1))
        .map(|(i, _)| i)
        .unwrap_or(line_len)
        .min(line_len);
    line_start + col_offset
}

/// Hints for the mistakes people make when hand-writing booking drafts
fn suggest(message: &str) -> Option<String> {
    let msg = message.to_lowercase();

    if msg.contains("tab") {
        return Some("YAML indentation uses spaces, not tabs".to_string());
    }
    if msg.contains("duplicate key") {
        return Some("each key may appear once; remove the duplicate".to_string());
    }
    if msg.contains("mapping values are not allowed") {
        return Some("add a space after ':' or check the indentation".to_string());
    }
    if msg.contains("invalid time") || (msg.contains("time") && msg.contains("invalid type")) {
        return Some("write times as quoted strings, e.g. time: \"10:30\"".to_string());
    }
    if msg.contains("premature end of input") || msg.contains("input contains invalid characters") {
        return Some("dates use the YYYY-MM-DD format, e.g. 2026-10-20".to_string());
    }
    if msg.contains("unknown field") {
        return Some("run `ecopark validate --help` for the draft layout".to_string());
    }

    None
}
