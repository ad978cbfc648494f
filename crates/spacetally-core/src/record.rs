//! Ingested file records and their timestamps.

use std::fmt;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Access, modification and creation times in epoch seconds.
///
/// `None` means "never observed" and is the identity for [`Timestamps::merge`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamps {
    /// Latest access time.
    #[serde(default)]
    pub accessed: Option<i64>,
    /// Latest modification time.
    #[serde(default)]
    pub modified: Option<i64>,
    /// Earliest creation (change) time.
    #[serde(default)]
    pub created: Option<i64>,
}

impl Timestamps {
    /// Create timestamps with all three times known.
    pub fn new(accessed: i64, modified: i64, created: i64) -> Self {
        Self {
            accessed: Some(accessed),
            modified: Some(modified),
            created: Some(created),
        }
    }

    /// Fold `other` into `self`: latest access, latest modification,
    /// earliest creation.
    pub fn merge(&mut self, other: &Timestamps) {
        self.accessed = pick(self.accessed, other.accessed, i64::max);
        self.modified = pick(self.modified, other.modified, i64::max);
        self.created = pick(self.created, other.created, i64::min);
    }

    /// Check if no time has been observed yet.
    pub fn is_empty(&self) -> bool {
        self.accessed.is_none() && self.modified.is_none() && self.created.is_none()
    }
}

fn pick(a: Option<i64>, b: Option<i64>, f: fn(i64, i64) -> i64) -> Option<i64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(f(x, y)),
        (x, None) => x,
        (None, y) => y,
    }
}

/// An ordered sequence of path segments.
///
/// Empty segments never survive construction, so a leading, trailing or
/// doubled separator does not produce an empty-named node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordPath(Vec<CompactString>);

impl RecordPath {
    /// Split `raw` on `separator`. Returns `None` if no segment remains.
    pub fn parse(raw: &str, separator: &str) -> Option<Self> {
        if separator.is_empty() {
            return Self::from_segments([raw]);
        }
        Self::from_segments(raw.split(separator))
    }

    /// Build a path from already split segments.
    pub fn from_segments<I, S>(segments: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let segments: Vec<CompactString> = segments
            .into_iter()
            .filter(|s| !s.as_ref().is_empty())
            .map(|s| CompactString::from(s.as_ref()))
            .collect();

        if segments.is_empty() {
            None
        } else {
            Some(Self(segments))
        }
    }

    /// All segments, the file name last.
    pub fn segments(&self) -> &[CompactString] {
        &self.0
    }

    /// The final segment.
    pub fn file_name(&self) -> &str {
        self.0.last().map(CompactString::as_str).unwrap_or_default()
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for RecordPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, segment) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str("/")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

/// One ordinary file as delivered by an ingestion source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Full path, file name last.
    pub path: RecordPath,
    /// Size in bytes.
    pub size: u64,
    /// File times.
    pub timestamps: Timestamps,
}

impl FileRecord {
    /// Create a new record.
    pub fn new(path: RecordPath, size: u64, timestamps: Timestamps) -> Self {
        Self {
            path,
            size,
            timestamps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_picks_extremes() {
        let mut ts = Timestamps::new(100, 200, 300);
        ts.merge(&Timestamps::new(150, 180, 250));

        assert_eq!(ts.accessed, Some(150));
        assert_eq!(ts.modified, Some(200));
        assert_eq!(ts.created, Some(250));
    }

    #[test]
    fn test_merge_with_empty() {
        let mut ts = Timestamps::default();
        assert!(ts.is_empty());

        ts.merge(&Timestamps::new(1, 2, 3));
        assert_eq!(ts, Timestamps::new(1, 2, 3));

        ts.merge(&Timestamps::default());
        assert_eq!(ts, Timestamps::new(1, 2, 3));
    }

    #[test]
    fn test_parse_drops_empty_segments() {
        let path = RecordPath::parse("%2Fproject%2F%2Fstar%2Ffile.root", "%2F").unwrap();
        assert_eq!(path.depth(), 3);
        assert_eq!(path.segments()[0], "project");
        assert_eq!(path.file_name(), "file.root");
        assert_eq!(path.to_string(), "project/star/file.root");
    }

    #[test]
    fn test_parse_rejects_separator_only() {
        assert!(RecordPath::parse("%2F%2F", "%2F").is_none());
        assert!(RecordPath::parse("", "/").is_none());
    }
}
