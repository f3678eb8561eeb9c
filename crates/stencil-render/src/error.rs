//! Error types for component rendering.
//!
//! This module provides [`RenderError`], the error type returned by every
//! rendering operation, [`DefinitionError`] for component declarations, and
//! [`ConfigError`], returned when loading options or themes.
//!
//! All rendering failures are final for the call that produced them: no
//! partial output is returned and no cache slot is left half-written.

use std::path::PathBuf;

use crate::id::{DefinitionId, TemplateId};

/// Boxed error produced by a user-supplied render function.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error type for rendering operations.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// A render function failed. The original error is kept as the source.
    #[error("render function for template {template} failed: {source}")]
    Render {
        /// Template whose render function failed.
        template: TemplateId,
        /// The error raised by the render function.
        #[source]
        source: BoxError,
    },

    /// A stylesheet produced by a CSS template could not be parsed.
    #[error("failed to parse stylesheet: {reason}")]
    CssParse {
        /// Full text of the stylesheet that failed to parse.
        css: String,
        /// Diagnostic from the CSS parser.
        reason: String,
    },

    /// A render result has no text form.
    #[error("render result has no text form ({kind})")]
    MissingSerializer {
        /// Shape of the value that could not be converted.
        kind: &'static str,
    },
}

impl RenderError {
    /// Wraps an error raised by a render function.
    pub fn render(template: TemplateId, source: impl Into<BoxError>) -> Self {
        RenderError::Render {
            template,
            source: source.into(),
        }
    }

    /// Returns the stylesheet text for CSS parse failures.
    pub fn css_source(&self) -> Option<&str> {
        match self {
            RenderError::CssParse { css, .. } => Some(css),
            _ => None,
        }
    }
}

/// Error type for building component definitions.
#[derive(Debug, thiserror::Error)]
pub enum DefinitionError {
    /// Dependencies can be bound only once.
    #[error("dependencies of {definition} are already set")]
    DependenciesAlreadySet {
        /// Definition whose dependencies were already bound.
        definition: DefinitionId,
    },
}

/// Error type for loading options and themes.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// YAML content was invalid.
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON content was invalid.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The value was not loaded from a file, so it cannot be refreshed.
    #[error("cannot refresh: no source file")]
    NoSource,

    /// The file extension is not one of the supported formats.
    #[error("unsupported config format: {}", path.display())]
    UnsupportedFormat {
        /// Path with the unrecognized extension.
        path: PathBuf,
    },
}
