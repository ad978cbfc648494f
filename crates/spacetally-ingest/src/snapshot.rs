//! JSON snapshots of ingested trees.
//!
//! Ingestion and reporting usually run as separate steps: each source is
//! ingested once and saved, then reports load every snapshot.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use spacetally_core::{IngestError, SourceSpec, UsageTree};

/// Conventional snapshot file for a source inside `dir`.
pub fn snapshot_path(dir: &Path, source: &SourceSpec) -> PathBuf {
    dir.join(format!("tree_{}.json", source.key()))
}

/// Write a tree snapshot.
pub fn save_snapshot(tree: &UsageTree, path: &Path) -> Result<(), IngestError> {
    let file = File::create(path).map_err(|e| IngestError::io(path, e))?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer(&mut writer, tree).map_err(|e| IngestError::Snapshot {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    writer.flush().map_err(|e| IngestError::io(path, e))
}

/// Read a tree snapshot.
///
/// Every tree level nests two JSON levels, so the parser's recursion limit
/// is lifted and deep trees grow the stack on demand.
pub fn load_snapshot(path: &Path) -> Result<UsageTree, IngestError> {
    let file = File::open(path).map_err(|e| IngestError::unavailable(path, e))?;
    let snapshot_error = |e: serde_json::Error| IngestError::Snapshot {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let mut deserializer = serde_json::Deserializer::from_reader(BufReader::new(file));
    deserializer.disable_recursion_limit();
    let tree = UsageTree::deserialize(serde_stacker::Deserializer::new(&mut deserializer))
        .map_err(snapshot_error)?;
    deserializer.end().map_err(snapshot_error)?;
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use spacetally_core::{FileRecord, IngestStats, Node, RecordPath, Timestamps};
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let source = SourceSpec::new("projecta", "starprod", "prja-starprod.list");

        let mut root = Node::root(&source.key());
        let record = FileRecord::new(
            RecordPath::from_segments(["starprod", "embedding", "f"]).unwrap(),
            42,
            Timestamps::new(3, 2, 1),
        );
        root.insert_record(&record, Some("projecta"));
        let tree = UsageTree::new(
            source.clone(),
            root,
            IngestStats::new(),
            Duration::ZERO,
            Vec::new(),
        );

        let path = snapshot_path(temp.path(), &source);
        assert!(path.ends_with("tree_projecta_starprod.json"));
        save_snapshot(&tree, &path).unwrap();

        let loaded = load_snapshot(&path).unwrap();
        assert_eq!(loaded.total_size(), 42);
        assert_eq!(
            loaded.root.descendant(&["starprod", "embedding"]).unwrap().origin(),
            Some("projecta")
        );
    }

    #[test]
    fn test_deep_tree_survives_reload() {
        let temp = TempDir::new().unwrap();
        let source = SourceSpec::new("project", "star", "prj-star.list");

        let segments: Vec<String> = (0..150).map(|i| format!("d{i}")).collect();
        let mut root = Node::root(&source.key());
        let record = FileRecord::new(
            RecordPath::from_segments(segments.iter().map(String::as_str)).unwrap(),
            7,
            Timestamps::new(3, 2, 1),
        );
        root.insert_record(&record, Some("project"));
        let tree = UsageTree::new(
            source.clone(),
            root,
            IngestStats::new(),
            Duration::ZERO,
            Vec::new(),
        );

        let path = snapshot_path(temp.path(), &source);
        save_snapshot(&tree, &path).unwrap();
        let loaded = load_snapshot(&path).unwrap();

        assert_eq!(loaded.total_size(), 7);
        assert_eq!(loaded.total_files(), 1);
        let deepest: Vec<&str> = segments[..149].iter().map(String::as_str).collect();
        assert_eq!(loaded.root.descendant(&deepest).unwrap().own_size(), 7);
    }

    #[test]
    fn test_load_garbage_is_snapshot_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tree_bad.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(
            load_snapshot(&path),
            Err(IngestError::Snapshot { .. })
        ));
    }
}
