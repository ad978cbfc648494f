//! Core types for spacetally.
//!
//! This crate provides the aggregation tree used throughout spacetally:
//! nodes and record insertion, the copy/merge algebra used to build derived
//! views, render-depth limiting with the ordered traversal handed to
//! renderers, and the presentation values derived from node totals.

mod config;
mod error;
mod format;
mod merge;
mod node;
mod record;
mod tree;
mod view;

pub use config::{DEFAULT_DEPTH_LIMIT, RenderConfig, RenderConfigBuilder, SourceSpec};
pub use error::{IngestError, IngestWarning, RollupMismatch, WarningKind};
pub use format::{
    ALARM_MARK, AlarmLevel, BELOW_THRESHOLD_MARKER, GIB_THRESHOLD, MISSING_DATE, WARNING_MARK,
    format_date, gib_size, human_readable_size,
};
pub use node::{Node, fold_name};
pub use record::{FileRecord, RecordPath, Timestamps};
pub use tree::{IngestStats, UsageTree};
pub use view::{RenderRow, SummaryRow, TableRow, Totals};
