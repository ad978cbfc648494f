//! Error and warning types for ingestion and tree checks.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that abort ingestion of one source.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The source could not be opened.
    #[error("Source unavailable: {path}: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading the source failed part-way.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A snapshot could not be encoded or decoded.
    #[error("Invalid snapshot {path}: {message}")]
    Snapshot { path: PathBuf, message: String },
}

impl IngestError {
    /// Create an error for a source that failed to open.
    pub fn unavailable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::SourceUnavailable {
            path: path.into(),
            source,
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

/// Kind of ingestion warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// Fewer fields than the dump format requires.
    TooFewFields,
    /// A numeric field did not parse.
    InvalidNumber,
    /// The file name decoded to no path segments.
    EmptyPath,
    /// The line was not valid UTF-8.
    InvalidEncoding,
}

/// Non-fatal problem with one input line. The line is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestWarning {
    /// 1-based line number.
    pub line: u64,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl IngestWarning {
    /// Create a new ingestion warning.
    pub fn new(line: u64, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            line,
            message: message.into(),
            kind,
        }
    }

    /// Create a too-few-fields warning.
    pub fn too_few_fields(line: u64, found: usize, required: usize) -> Self {
        Self {
            line,
            message: format!("Expected at least {required} fields, found {found}"),
            kind: WarningKind::TooFewFields,
        }
    }

    /// Create an invalid-number warning.
    pub fn invalid_number(line: u64, field: &str, value: &str) -> Self {
        Self {
            line,
            message: format!("Invalid {field}: {value:?}"),
            kind: WarningKind::InvalidNumber,
        }
    }
}

/// A node whose aggregate disagrees with the sum of its children.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "Rollup mismatch at {title:?} (level {level}): size {found_size} != {expected_size}, \
     files {found_files} != {expected_files}"
)]
pub struct RollupMismatch {
    pub title: String,
    pub level: u32,
    pub expected_size: u64,
    pub found_size: u64,
    pub expected_files: u64,
    pub found_files: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_error_display() {
        let err = IngestError::unavailable(
            "/dumps/prj-star.list",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(matches!(err, IngestError::SourceUnavailable { .. }));
        assert!(err.to_string().contains("prj-star.list"));
    }

    #[test]
    fn test_every_ingest_error_names_its_file() {
        let path_of = |err: &IngestError| match err {
            IngestError::SourceUnavailable { path, .. }
            | IngestError::Io { path, .. }
            | IngestError::Snapshot { path, .. } => path.clone(),
        };
        let errors = [
            IngestError::unavailable("a.list", std::io::Error::other("x")),
            IngestError::io("b.list", std::io::Error::other("x")),
            IngestError::Snapshot {
                path: "tree_c.json".into(),
                message: "bad".into(),
            },
        ];

        for err in &errors {
            let path = path_of(err);
            assert!(err.to_string().contains(path.to_str().unwrap()));
        }
    }

    #[test]
    fn test_warning_creation() {
        let warning = IngestWarning::too_few_fields(7, 3, 17);
        assert_eq!(warning.kind, WarningKind::TooFewFields);
        assert_eq!(warning.line, 7);
        assert!(warning.message.contains("17"));
    }
}
