// SPDX-FileCopyrightText: 2026 ncrypt Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns figment extraction failures into miette diagnostics.
//!
//! Unknown keys point at the offending line of the TOML file they came from
//! and carry a "did you mean" hint when a valid key is close enough.

#![allow(unused_assignments)] // emitted by the miette Diagnostic derive

use std::path::Path;

use figment::error::Kind;
use miette::{Diagnostic, GraphicalReportHandler, NamedSource, SourceSpan};
use thiserror::Error;

/// Jaro-Winkler score a valid key must beat to be suggested.
const SIMILARITY_FLOOR: f64 = 0.75;

/// A TOML document that took part in loading, kept for span resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    /// Display name: the file path, or `<inline>`.
    pub name: String,
    pub content: String,
}

impl ConfigSource {
    pub fn inline(content: &str) -> Self {
        Self {
            name: "<inline>".to_string(),
            content: content.to_string(),
        }
    }

    /// Read `path`, or `None` when it does not exist or is unreadable.
    pub fn read(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        let name = if path.is_absolute() {
            path.display().to_string()
        } else {
            std::env::current_dir()
                .map(|dir| dir.join(path).display().to_string())
                .unwrap_or_else(|_| path.display().to_string())
        };
        Some(Self { name, content })
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("`{key}` is not a recognized setting{}", section_suffix(section.as_deref()))]
    #[diagnostic(code(ncrypt::config::unknown_key), help("{}", unknown_key_help(suggestion.as_deref(), valid_keys)))]
    UnknownKey {
        key: String,
        section: Option<String>,
        suggestion: Option<String>,
        valid_keys: Vec<String>,
        #[label("unrecognized here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` has the wrong type: {detail}")]
    #[diagnostic(code(ncrypt::config::invalid_type), help("use a {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
    },

    #[error("`{key}` is required")]
    #[diagnostic(code(ncrypt::config::missing_key), help("set `{key}` in ncrypt.toml"))]
    MissingKey { key: String },

    #[error("invalid value: {message}")]
    #[diagnostic(code(ncrypt::config::validation))]
    Validation { message: String },

    #[error("{0}")]
    #[diagnostic(code(ncrypt::config::other))]
    Other(String),
}

fn section_suffix(section: Option<&str>) -> String {
    section.map(|s| format!(" in [{s}]")).unwrap_or_default()
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &[String]) -> String {
    let valid = valid_keys.join(", ");
    match suggestion {
        Some(s) => format!("did you mean `{s}`? accepted here: {valid}"),
        None => format!("accepted here: {valid}"),
    }
}

/// Split a (possibly multi-error) figment failure into diagnostics.
pub fn from_figment(err: figment::Error, sources: &[ConfigSource]) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| {
            let section = error.path.first().cloned();
            match &error.kind {
                Kind::UnknownField(key, expected) => {
                    let valid_keys: Vec<String> = expected.iter().map(|k| k.to_string()).collect();
                    let (span, src) = locate(&error, key, sources).unzip();
                    ConfigError::UnknownKey {
                        key: key.clone(),
                        section,
                        suggestion: suggest_key(key, expected),
                        valid_keys,
                        span,
                        src,
                    }
                }
                Kind::MissingField(key) => ConfigError::MissingKey {
                    key: qualified(&error.path, key),
                },
                Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
                    key: error.path.join("."),
                    detail: format!("got {actual}"),
                    expected: expected.clone(),
                },
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

fn qualified(path: &[String], key: &str) -> String {
    if path.iter().any(|p| p == key) {
        path.join(".")
    } else {
        path.iter()
            .map(String::as_str)
            .chain(std::iter::once(key))
            .collect::<Vec<_>>()
            .join(".")
    }
}

fn locate(
    error: &figment::Error,
    key: &str,
    sources: &[ConfigSource],
) -> Option<(SourceSpan, NamedSource<String>)> {
    let file = error
        .metadata
        .as_ref()
        .and_then(|meta| meta.source.as_ref())
        .and_then(|source| source.file_path())
        .map(|p| p.display().to_string());

    let source = match file {
        Some(name) => sources.iter().find(|s| s.name == name)?,
        // String providers carry no path; only unambiguous with one source.
        None => match sources {
            [only] => only,
            _ => return None,
        },
    };

    let offset = find_key_offset(&source.content, error.path.first().map(String::as_str), key)?;
    Some((
        SourceSpan::new(offset.into(), key.len()),
        NamedSource::new(&source.name, source.content.clone()),
    ))
}

/// Byte offset of `key` inside `[section]` (or the top level when `None`).
pub fn find_key_offset(content: &str, section: Option<&str>, key: &str) -> Option<usize> {
    let mut current: Option<&str> = None;
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let start = offset;
        offset += line.len();
        let body = line.trim_start();

        if let Some(header) = body.strip_prefix('[') {
            current = header.split(']').next().map(str::trim);
            continue;
        }
        if current != section {
            continue;
        }
        let is_key = body
            .strip_prefix(key)
            .is_some_and(|rest| rest.trim_start().starts_with('='));
        if is_key {
            return Some(start + (line.len() - body.len()));
        }
    }
    None
}

/// Closest valid key to `unknown`, if any is similar enough.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SIMILARITY_FLOOR)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Render diagnostics as graphical reports, one after another.
pub fn render_errors(errors: &[ConfigError]) -> String {
    let handler = GraphicalReportHandler::new();
    let mut out = String::new();
    for error in errors {
        if handler.render_report(&mut out, error as &dyn Diagnostic).is_err() {
            out.push_str(&format!("error: {error}\n"));
        }
    }
    out
}
