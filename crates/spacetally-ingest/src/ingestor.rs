//! Builds one usage tree per dump source.

use std::fs::File;
use std::io::{BufRead, BufReader};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use spacetally_core::{IngestError, IngestStats, Node, SourceSpec, UsageTree};

use crate::dump::{DumpLine, DumpReader};
use crate::progress::ProgressTracker;

/// Turns dump sources into usage trees.
///
/// Each pass owns its tree exclusively. The origin label attached to the
/// created nodes comes from the [`SourceSpec`] handed to the call, so
/// independent sources can be ingested concurrently.
#[derive(Debug, Clone)]
pub struct Ingestor {
    max_warnings: usize,
    progress_interval: u64,
}

impl Ingestor {
    /// Create an ingestor with default limits.
    pub fn new() -> Self {
        Self {
            max_warnings: 1000,
            progress_interval: 100_000,
        }
    }

    /// Keep at most `max` warnings per source; further malformed lines are
    /// still counted in the stats.
    pub fn with_max_warnings(mut self, max: usize) -> Self {
        self.max_warnings = max;
        self
    }

    /// Log progress every `lines` lines.
    pub fn with_progress_interval(mut self, lines: u64) -> Self {
        self.progress_interval = lines;
        self
    }

    /// Ingest one dump file.
    pub fn ingest(&self, source: &SourceSpec) -> Result<UsageTree, IngestError> {
        let file =
            File::open(&source.path).map_err(|e| IngestError::unavailable(&source.path, e))?;
        self.ingest_reader(source, BufReader::new(file))
    }

    /// Ingest dump lines from any buffered reader.
    pub fn ingest_reader<R: BufRead>(
        &self,
        source: &SourceSpec,
        reader: R,
    ) -> Result<UsageTree, IngestError> {
        let key = source.key();
        let origin = source.storage.as_str();
        let mut tracker = ProgressTracker::new(self.progress_interval);
        let mut root = Node::root(&key);
        let mut stats = IngestStats::new();
        let mut warnings = Vec::new();

        for item in DumpReader::new(reader) {
            let (line_no, line) = item.map_err(|e| IngestError::io(&source.path, e))?;
            stats.lines += 1;

            match line {
                DumpLine::File(record) => {
                    stats.record_file(&record.path, record.size);
                    tracker.record_file(record.size);
                    root.insert_record(&record, Some(origin));
                }
                DumpLine::Skipped => stats.record_skipped(),
                DumpLine::Malformed(warning) => {
                    warn!(source = %key, line = line_no, "Skipping line: {}", warning.message);
                    stats.record_malformed();
                    tracker.record_malformed();
                    if warnings.len() < self.max_warnings {
                        warnings.push(warning);
                    }
                }
            }

            if let Some(progress) = tracker.record_line() {
                debug!(
                    source = %key,
                    lines = progress.lines_read,
                    records = progress.records,
                    lines_per_sec = progress.lines_per_second() as u64,
                    "Ingesting"
                );
            }
        }

        info!(
            source = %key,
            lines = stats.lines,
            records = stats.records,
            malformed = stats.malformed,
            bytes = stats.total_size,
            "Processed source"
        );

        Ok(UsageTree::new(
            source.clone(),
            root,
            stats,
            tracker.elapsed(),
            warnings,
        ))
    }

    /// Ingest independent sources in parallel, one tree per source.
    ///
    /// Results come back in input order. A source that fails does not
    /// affect the others.
    pub fn ingest_all(&self, sources: &[SourceSpec]) -> Vec<Result<UsageTree, IngestError>> {
        sources
            .par_iter()
            .map(|source| {
                let result = self.ingest(source);
                if let Err(err) = &result {
                    warn!(source = %source.key(), "{err}");
                }
                result
            })
            .collect()
    }
}

impl Default for Ingestor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dump_line(attrs: &str, size: u64, name: &str) -> String {
        format!(
            "1 1 0 {size} star 1 {attrs} 1 100 200 -rw-r----- \
             1600000000 1500000000 131072 1400000000 -- {name}\n"
        )
    }

    #[test]
    fn test_ingest_reader_builds_tree() {
        let input = [
            dump_line("F", 100, "%2Fstar%2Fpwg%2Fa.root"),
            dump_line("F", 50, "%2Fstar%2Fpwg%2Fb.root"),
            dump_line("D2u", 4096, "%2Fstar%2Fpwg"),
            "garbage line\n".to_string(),
            dump_line("F", 7, "%2Fstar%2Freadme"),
        ]
        .concat();

        let source = SourceSpec::new("project", "star", "in-memory");
        let tree = Ingestor::new()
            .ingest_reader(&source, input.as_bytes())
            .unwrap();

        assert_eq!(tree.root.title(), "project_star");
        assert_eq!(tree.total_size(), 157);
        assert_eq!(tree.total_files(), 3);
        assert_eq!(tree.stats.lines, 5);
        assert_eq!(tree.stats.skipped, 1);
        assert_eq!(tree.stats.malformed, 1);
        assert_eq!(tree.warnings.len(), 1);

        let pwg = tree.root.descendant(&["star", "pwg"]).unwrap();
        assert_eq!(pwg.own_size(), 150);
        assert_eq!(pwg.origin(), Some("project"));
        assert!(tree.root.verify_rollup().is_ok());
    }

    #[test]
    fn test_warning_cap() {
        let input = "bad\nbad\nbad\n";
        let source = SourceSpec::new("project", "star", "in-memory");
        let tree = Ingestor::new()
            .with_max_warnings(2)
            .ingest_reader(&source, input.as_bytes())
            .unwrap();

        assert_eq!(tree.stats.malformed, 3);
        assert_eq!(tree.warnings.len(), 2);
        assert_eq!(tree.total_files(), 0);
    }

    #[test]
    fn test_missing_source_is_unavailable() {
        let source = SourceSpec::new("project", "star", "/nonexistent/prj-star.list");
        let err = Ingestor::new().ingest(&source).unwrap_err();
        assert!(matches!(err, IngestError::SourceUnavailable { .. }));
    }
}
