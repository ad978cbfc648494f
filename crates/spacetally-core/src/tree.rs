//! Base usage tree container and ingestion statistics.

use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::config::SourceSpec;
use crate::error::IngestWarning;
use crate::node::Node;
use crate::record::RecordPath;

/// Summary statistics for one ingestion pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestStats {
    /// Lines read from the source.
    pub lines: u64,
    /// File records inserted.
    pub records: u64,
    /// Well-formed lines that were not ordinary files.
    pub skipped: u64,
    /// Lines that failed to parse.
    pub malformed: u64,
    /// Total bytes inserted.
    pub total_size: u64,
    /// Deepest record path, in segments.
    pub max_depth: u32,
    /// Largest single record (path, size).
    pub largest_record: Option<(String, u64)>,
}

impl IngestStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Update stats with an inserted record. The path is only formatted
    /// when the record is a new largest.
    pub fn record_file(&mut self, path: &RecordPath, size: u64) {
        self.records += 1;
        self.total_size += size;
        self.max_depth = self.max_depth.max(path.depth() as u32);

        if self.largest_record.as_ref().is_none_or(|(_, s)| size > *s) {
            self.largest_record = Some((path.to_string(), size));
        }
    }

    /// Record a well-formed line that was not a file.
    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    /// Record a line that failed to parse.
    pub fn record_malformed(&mut self) {
        self.malformed += 1;
    }
}

/// One ingested source: its aggregation tree plus how it was built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageTree {
    /// Source this tree was built from.
    pub source: SourceSpec,

    /// Root node; level 0.
    pub root: Node,

    /// When ingestion finished.
    pub ingested_at: SystemTime,

    /// Duration of the ingestion pass.
    pub duration: Duration,

    /// Summary statistics.
    pub stats: IngestStats,

    /// Lines skipped as malformed.
    pub warnings: Vec<IngestWarning>,
}

impl UsageTree {
    /// Create a new usage tree.
    pub fn new(
        source: SourceSpec,
        root: Node,
        stats: IngestStats,
        duration: Duration,
        warnings: Vec<IngestWarning>,
    ) -> Self {
        Self {
            source,
            root,
            ingested_at: SystemTime::now(),
            duration,
            stats,
            warnings,
        }
    }

    /// Get the total size of the tree.
    pub fn total_size(&self) -> u64 {
        self.root.total_size()
    }

    /// Get the total number of files.
    pub fn total_files(&self) -> u64 {
        self.root.total_files()
    }

    /// Check if any line was skipped as malformed.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
