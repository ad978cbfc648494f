//! Ingestion progress reporting.

use std::time::{Duration, Instant};

/// Progress of one ingestion pass.
#[derive(Debug, Clone)]
pub struct IngestProgress {
    /// Lines read so far.
    pub lines_read: u64,
    /// File records inserted so far.
    pub records: u64,
    /// Bytes inserted so far.
    pub bytes: u64,
    /// Malformed lines so far.
    pub malformed: u64,
    /// Time elapsed since the pass started.
    pub elapsed: Duration,
}

impl IngestProgress {
    /// Calculate read rate in lines per second.
    pub fn lines_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.lines_read as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}

/// Internal progress tracker with timing.
#[derive(Debug)]
pub(crate) struct ProgressTracker {
    start_time: Instant,
    interval: u64,
    lines_read: u64,
    records: u64,
    bytes: u64,
    malformed: u64,
}

impl ProgressTracker {
    pub fn new(interval: u64) -> Self {
        Self {
            start_time: Instant::now(),
            interval: interval.max(1),
            lines_read: 0,
            records: 0,
            bytes: 0,
            malformed: 0,
        }
    }

    /// Count a line; returns a snapshot every `interval` lines.
    pub fn record_line(&mut self) -> Option<IngestProgress> {
        self.lines_read += 1;
        (self.lines_read % self.interval == 0).then(|| self.snapshot())
    }

    pub fn record_file(&mut self, size: u64) {
        self.records += 1;
        self.bytes += size;
    }

    pub fn record_malformed(&mut self) {
        self.malformed += 1;
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn snapshot(&self) -> IngestProgress {
        IngestProgress {
            lines_read: self.lines_read,
            records: self.records,
            bytes: self.bytes,
            malformed: self.malformed,
            elapsed: self.start_time.elapsed(),
        }
    }
}
