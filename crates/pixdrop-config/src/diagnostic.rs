// SPDX-FileCopyrightText: 2026 Pixdrop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration diagnostics.
//!
//! Figment reports deserialization failures without source positions. This
//! module maps them onto [`ConfigError`] values that miette can render
//! against the TOML text they came from, and proposes the closest valid key
//! for typos.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use std::io::IsTerminal;

use figment::error::Kind;
use miette::{Diagnostic, GraphicalReportHandler, GraphicalTheme, NamedSource, SourceSpan};
use thiserror::Error;

/// Jaro-Winkler score a valid key must beat to be offered as a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration error with enough context for miette to point at it.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A key that no section of `pixdrop.toml` accepts.
    #[error("unknown key `{key}` in {}", table_label(table))]
    #[diagnostic(
        code(pixdrop::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        /// Dotted table path, empty for the top level.
        table: String,
        suggestion: Option<String>,
        /// Comma-separated keys accepted in `table`.
        valid_keys: String,
        #[label("not a pixdrop setting")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` has the wrong type: found {found}")]
    #[diagnostic(code(pixdrop::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        /// Dotted path of the offending key.
        key: String,
        found: String,
        expected: String,
        #[label("expected {expected}")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("missing required key `{key}` in {}", table_label(table))]
    #[diagnostic(
        code(pixdrop::config::missing_key),
        help("add `{key} = <value>` under {} in pixdrop.toml", table_label(table))
    )]
    MissingKey { key: String, table: String },

    /// A value that parsed but is out of range or inconsistent.
    #[error("validation error: {message}")]
    #[diagnostic(code(pixdrop::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(pixdrop::config::other))]
    Other(String),
}

fn table_label(table: &str) -> String {
    if table.is_empty() {
        "the top level".to_string()
    } else {
        format!("[{table}]")
    }
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// The text of one TOML layer, kept for span lookup.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    /// Display name: the file path, or `<inline>`.
    pub name: String,
    pub content: String,
}

impl ConfigSource {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Byte span of `key` inside `[table]` (or a dotted `sub.key` written
    /// under a parent table).
    pub fn locate(&self, table: &[String], key: &str) -> Option<SourceSpan> {
        let mut current: Vec<&str> = Vec::new();
        let mut offset = 0;

        for line in self.content.split_inclusive('\n') {
            let line_start = offset;
            offset += line.len();

            let trimmed = line.trim_start();
            let indent = line.len() - trimmed.len();

            if let Some(header) = trimmed.strip_prefix('[') {
                let name = header.trim_start_matches('[');
                if let Some(end) = name.find(']') {
                    current = name[..end].split('.').map(str::trim).collect();
                }
                continue;
            }

            // `reconnect.strategy = ..` under `[session]` targets [session.reconnect].
            if table.len() < current.len() || !table.iter().zip(&current).all(|(t, c)| t == c) {
                continue;
            }
            let mut prefix = table[current.len()..].join(".");
            if !prefix.is_empty() {
                prefix.push('.');
            }

            let Some(after_prefix) = trimmed.strip_prefix(prefix.as_str()) else {
                continue;
            };
            let Some(after_key) = after_prefix.strip_prefix(key) else {
                continue;
            };
            if after_key.trim_start().starts_with('=') {
                let start = line_start + indent + prefix.len();
                return Some(SourceSpan::new(start.into(), key.len()));
            }
        }

        None
    }

    fn named(&self) -> NamedSource<String> {
        NamedSource::new(&self.name, self.content.clone())
    }
}

/// Converts every error inside a figment failure into a [`ConfigError`].
pub fn figment_to_config_errors(err: figment::Error, sources: &[ConfigSource]) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| convert(&error, sources))
        .collect()
}

fn convert(error: &figment::Error, sources: &[ConfigSource]) -> ConfigError {
    // figment's path points at the table holding the field for unknown and
    // missing fields, and at the field itself for type errors.
    let path: Vec<String> = error.path.clone();

    match &error.kind {
        Kind::UnknownField(field, expected) => {
            let (span, src) = locate_in(error, sources, &path, field);
            ConfigError::UnknownKey {
                key: field.clone(),
                table: path.join("."),
                suggestion: suggest_key(field, expected),
                valid_keys: expected.join(", "),
                span,
                src,
            }
        }
        Kind::MissingField(field) => ConfigError::MissingKey {
            key: field.to_string(),
            table: path.join("."),
        },
        Kind::InvalidType(actual, expected) => {
            let (table, key) = match path.split_last() {
                Some((key, table)) => (table.to_vec(), key.clone()),
                None => (Vec::new(), String::new()),
            };
            let (span, src) = locate_in(error, sources, &table, &key);
            ConfigError::InvalidType {
                key: path.join("."),
                found: actual.to_string(),
                expected: expected.clone(),
                span,
                src,
            }
        }
        _ => ConfigError::Other(error.to_string()),
    }
}

/// Picks the source the error came from, or the only source there is.
fn locate_in(
    error: &figment::Error,
    sources: &[ConfigSource],
    table: &[String],
    key: &str,
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let origin = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|s| match s {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });

    let source = origin
        .and_then(|origin| sources.iter().find(|s| s.name == origin))
        .or_else(|| match sources {
            [only] => Some(only),
            _ => None,
        });

    source
        .and_then(|s| s.locate(table, key).map(|span| (Some(span), Some(s.named()))))
        .unwrap_or((None, None))
}

/// The valid key closest to `unknown`, if any is close enough to be a typo.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Renders errors to stderr, without color when stderr is not a terminal.
pub fn render_errors(errors: &[ConfigError]) {
    let theme = if std::io::stderr().is_terminal() {
        GraphicalTheme::unicode()
    } else {
        GraphicalTheme::unicode_nocolor()
    };
    let handler = GraphicalReportHandler::new_themed(theme);

    for error in errors {
        let mut out = String::new();
        match handler.render_report(&mut out, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{out}"),
            Err(_) => eprintln!("error: {error}"),
        }
    }
    if errors.len() > 1 {
        eprintln!("{} configuration errors", errors.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|p| p.to_string()).collect()
    }

    fn spanned<'a>(content: &'a str, span: SourceSpan) -> &'a str {
        &content[span.offset()..span.offset() + span.len()]
    }

    #[test]
    fn suggestion_picks_the_closest_key() {
        let valid = &["database_path", "wal_mode", "connect_timeout_secs"];
        assert_eq!(
            suggest_key("databse_path", valid),
            Some("database_path".to_string())
        );
        assert_eq!(suggest_key("ttl_sec", &["ttl_secs"]), Some("ttl_secs".into()));
        assert_eq!(suggest_key("zzzzzz", &["log_level", "environment"]), None);
    }

    #[test]
    fn locates_key_in_its_table_only() {
        let content = "[gateway]\nport = 1\n\n[cache]\nport = 2\n";
        let source = ConfigSource::new("<inline>", content);
        let span = source.locate(&table(&["cache"]), "port").unwrap();
        assert_eq!(span.offset(), content.rfind("port").unwrap());
    }

    #[test]
    fn locates_key_in_nested_table() {
        let content = "[session]\nauth_dir = \"a\"\n\n[session.reconnect]\n  strategi = \"x\"\n";
        let source = ConfigSource::new("<inline>", content);
        let span = source
            .locate(&table(&["session", "reconnect"]), "strategi")
            .unwrap();
        assert_eq!(spanned(content, span), "strategi");
    }

    #[test]
    fn locates_dotted_key_under_parent_table() {
        let content = "[session]\nreconnect.strategi = \"x\"\n";
        let source = ConfigSource::new("<inline>", content);
        let span = source
            .locate(&table(&["session", "reconnect"]), "strategi")
            .unwrap();
        assert_eq!(spanned(content, span), "strategi");
    }

    #[test]
    fn prefix_of_longer_key_is_not_a_match() {
        let source = ConfigSource::new("<inline>", "[cache]\nttl_secs = 5\n");
        assert!(source.locate(&table(&["cache"]), "ttl").is_none());
    }

    #[test]
    fn unknown_key_message_names_the_table() {
        let error = ConfigError::UnknownKey {
            key: "prot".into(),
            table: "gateway".into(),
            suggestion: Some("port".into()),
            valid_keys: "port, bind_address".into(),
            span: None,
            src: None,
        };
        assert_eq!(error.to_string(), "unknown key `prot` in [gateway]");
    }
}
