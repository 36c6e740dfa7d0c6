// SPDX-FileCopyrightText: 2026 Trellis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Trellis plugin framework.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the Trellis crates.
pub type Result<T> = std::result::Result<T, TrellisError>;

/// The primary error type used across discovery, factories, and managers.
#[derive(Debug, Error)]
pub enum TrellisError {
    /// The requested plugin id is not present in the discovered definitions.
    #[error("plugin not found: {plugin_id}")]
    NotFound { plugin_id: String },

    /// A definition file is malformed or a definition is structurally invalid.
    #[error("invalid definition{}: {message}", display_path(.path))]
    InvalidDefinition {
        path: Option<PathBuf>,
        message: String,
    },

    /// The fallback plugin selected for a missing plugin could not be resolved either.
    ///
    /// `source` holds the error the fallback attempt itself produced.
    #[error("fallback exhausted: plugin `{requested}` not found and fallback `{fallback}` is unresolvable")]
    FallbackExhausted {
        requested: String,
        fallback: String,
        #[source]
        source: Box<TrellisError>,
    },

    /// A definition references an implementation that has no registered constructor.
    #[error("no constructor registered for `{class}` (plugin `{plugin_id}`)")]
    UnknownImplementation { plugin_id: String, class: String },

    /// Configuration errors (invalid TOML, bad patterns, inconsistent settings).
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem errors while reading a definition file.
    #[error("i/o error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TrellisError {
    /// Shorthand for a [`TrellisError::NotFound`] error.
    pub fn not_found(plugin_id: impl Into<String>) -> Self {
        Self::NotFound {
            plugin_id: plugin_id.into(),
        }
    }

    /// Shorthand for a [`TrellisError::InvalidDefinition`] error tied to a file.
    pub fn invalid_definition(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            path: Some(path.into()),
            message: message.into(),
        }
    }

    /// Returns true for [`TrellisError::NotFound`], the only error a fallback can recover from.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

fn display_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => format!(" at {}", p.display()),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_definition_message_includes_path() {
        let err = TrellisError::invalid_definition("/plugins/a.yml", "missing `id`");
        assert_eq!(
            err.to_string(),
            "invalid definition at /plugins/a.yml: missing `id`"
        );

        let err = TrellisError::InvalidDefinition {
            path: None,
            message: "bad deriver".into(),
        };
        assert_eq!(err.to_string(), "invalid definition: bad deriver");
    }

    #[test]
    fn only_not_found_is_recoverable() {
        assert!(TrellisError::not_found("x").is_not_found());
        assert!(
            !TrellisError::FallbackExhausted {
                requested: "x".into(),
                fallback: "y".into(),
                source: Box::new(TrellisError::not_found("y")),
            }
            .is_not_found()
        );
        assert!(!TrellisError::Internal("boom".into()).is_not_found());
    }

    #[test]
    fn fallback_exhausted_keeps_fallback_cause() {
        use std::error::Error as _;

        let err = TrellisError::FallbackExhausted {
            requested: "ghost".into(),
            fallback: "plain".into(),
            source: Box::new(TrellisError::UnknownImplementation {
                plugin_id: "plain".into(),
                class: "NoSuchClass".into(),
            }),
        };
        let cause = err.source().map(ToString::to_string);
        assert_eq!(
            cause.as_deref(),
            Some("no constructor registered for `NoSuchClass` (plugin `plain`)")
        );
    }
}
