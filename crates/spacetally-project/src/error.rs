//! Error and warning types for projection assembly and report output.

use std::path::PathBuf;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that abort one projection or one report step.
#[derive(Debug, Error)]
pub enum ProjectError {
    /// None of the projection's inputs could be found.
    #[error("Projection {projection}: no input resolved")]
    MissingRoot { projection: CompactString },

    /// A projection spec failed validation.
    #[error("Invalid projection spec: {message}")]
    InvalidSpec { message: String },

    /// The report configuration could not be read or parsed.
    #[error("Invalid report config {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// Writing an output file failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON encoding of an output failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProjectError {
    /// Create an invalid-spec error.
    pub fn invalid_spec(message: impl Into<String>) -> Self {
        Self::InvalidSpec {
            message: message.into(),
        }
    }

    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Non-fatal problem while assembling a projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionWarning {
    /// Projection being built.
    pub projection: CompactString,
    /// Source key of the input.
    pub source: CompactString,
    /// Path below the source root that was looked up.
    pub path: Vec<CompactString>,
    /// What went wrong.
    pub kind: ProjectionWarningKind,
}

/// Kind of projection warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectionWarningKind {
    /// No base tree was loaded for the source.
    MissingSource,
    /// The base tree exists but the path below it does not.
    MissingSubtree,
}

impl ProjectionWarning {
    /// Human-readable message.
    pub fn message(&self) -> String {
        match self.kind {
            ProjectionWarningKind::MissingSource => {
                format!("source {} is not loaded", self.source)
            }
            ProjectionWarningKind::MissingSubtree => {
                format!("{}/{} not found", self.source, self.path.join("/"))
            }
        }
    }
}
