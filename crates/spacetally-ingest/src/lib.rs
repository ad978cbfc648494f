//! Policy-dump ingestion for spacetally.
//!
//! This crate turns filesystem policy dumps into usage trees.
//!
//! # Overview
//!
//! `spacetally-ingest` is the only part of spacetally that knows the dump
//! format. Key features:
//!
//! - **Line parser** for the whitespace-separated dump format, `%2F`-encoded
//!   paths and names containing spaces
//! - **Lenient ingestion**: malformed lines are logged and skipped
//! - **Parallel ingestion** of independent sources via rayon
//! - **Snapshots** so reports can be rebuilt without re-reading dumps
//!
//! # Example
//!
//! ```rust,no_run
//! use spacetally_ingest::{Ingestor, SourceSpec};
//!
//! let source = SourceSpec::new("project", "star", "project/prj-star.list");
//! let tree = Ingestor::new().ingest(&source).unwrap();
//!
//! println!("Total size: {} bytes", tree.total_size());
//! println!("Total files: {}", tree.total_files());
//! ```

mod dump;
mod ingestor;
mod progress;
mod snapshot;

pub use dump::{DumpLine, DumpReader, MIN_FIELDS, PATH_SEPARATOR, parse_line};
pub use ingestor::Ingestor;
pub use progress::IngestProgress;
pub use snapshot::{load_snapshot, save_snapshot, snapshot_path};

// Re-export core types for convenience
pub use spacetally_core::{
    FileRecord, IngestError, IngestStats, IngestWarning, Node, SourceSpec, UsageTree, WarningKind,
};
