//! Aggregation tree vertices and record insertion.

use compact_str::CompactString;
use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_DEPTH_LIMIT;
use crate::error::RollupMismatch;
use crate::record::{FileRecord, Timestamps};

/// Case-folded identity key for a label.
pub fn fold_name(title: &str) -> CompactString {
    CompactString::from(title.to_lowercase())
}

fn default_depth_limit() -> u32 {
    DEFAULT_DEPTH_LIMIT
}

/// One path segment or regrouping bucket in a usage tree.
///
/// Every node exclusively owns its children. Aggregate fields
/// (`child_size`, `child_files`) always describe the subtree below the node
/// and are only ever changed by insertion or by a rollup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    name: CompactString,
    title: CompactString,
    level: u32,

    own_size: u64,
    own_files: u64,
    child_size: u64,
    child_files: u64,

    #[serde(default)]
    timestamps: Timestamps,

    /// Source that first created this node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    origin: Option<CompactString>,

    #[serde(default = "default_depth_limit")]
    depth_limit: u32,

    #[serde(default)]
    children: IndexMap<CompactString, Node>,
}

impl Node {
    /// Create the root of a new tree, at level 0.
    pub fn root(title: &str) -> Self {
        Self::new(title, 0)
    }

    /// Create a detached node at the given level.
    pub fn new(title: &str, level: u32) -> Self {
        Self {
            name: fold_name(title),
            title: CompactString::from(title),
            level,
            own_size: 0,
            own_files: 0,
            child_size: 0,
            child_files: 0,
            timestamps: Timestamps::default(),
            origin: None,
            depth_limit: DEFAULT_DEPTH_LIMIT,
            children: IndexMap::new(),
        }
    }

    /// Case-folded identity key.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display label, as first seen.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Relabel this node. Only meaningful for view roots; children are
    /// keyed by their folded name, which does not change.
    pub fn set_title(&mut self, title: &str) {
        self.title = CompactString::from(title);
    }

    /// Structural depth, root = 0.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Bytes contributed by files directly in this node.
    pub fn own_size(&self) -> u64 {
        self.own_size
    }

    /// Files directly in this node.
    pub fn own_files(&self) -> u64 {
        self.own_files
    }

    /// Bytes below this node.
    pub fn child_size(&self) -> u64 {
        self.child_size
    }

    /// Files below this node.
    pub fn child_files(&self) -> u64 {
        self.child_files
    }

    /// Own plus aggregate size.
    pub fn total_size(&self) -> u64 {
        self.own_size + self.child_size
    }

    /// Own plus aggregate file count.
    pub fn total_files(&self) -> u64 {
        self.own_files + self.child_files
    }

    /// Time summary of this node and everything below it.
    pub fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }

    /// Source that first created this node, if known.
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    /// Current render-depth cap.
    pub fn depth_limit(&self) -> u32 {
        self.depth_limit
    }

    /// Check if this node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Get the number of direct children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Iterate direct children in creation order.
    pub fn children(&self) -> impl Iterator<Item = &Node> {
        self.children.values()
    }

    /// Iterate direct children ordered by title (case-sensitive).
    pub fn sorted_children(&self) -> impl Iterator<Item = &Node> {
        self.children
            .values()
            .sorted_by(|a, b| a.title.cmp(&b.title))
    }

    pub(crate) fn children_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.children.values_mut()
    }

    /// Look up a direct child, ignoring case.
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.get(fold_name(name).as_str())
    }

    /// Look up a direct child mutably, ignoring case.
    pub fn child_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.children.get_mut(fold_name(name).as_str())
    }

    /// Follow a chain of child names. An empty path yields `self`.
    pub fn descendant<S: AsRef<str>>(&self, path: &[S]) -> Option<&Node> {
        path.iter()
            .try_fold(self, |node, segment| node.child(segment.as_ref()))
    }

    /// Return the child keyed by `title` (case-folded), creating it if needed.
    ///
    /// An existing child keeps the title it was created with.
    pub fn get_or_create_child(&mut self, title: &str) -> &mut Node {
        let level = self.level + 1;
        self.children
            .entry(fold_name(title))
            .or_insert_with(|| Node::new(title, level))
    }

    /// Get-or-create a child and record `origin` on it unless it already
    /// has one.
    pub(crate) fn child_from(&mut self, title: &str, origin: Option<&str>) -> &mut Node {
        let child = self.get_or_create_child(title);
        if child.origin.is_none() {
            child.origin = origin.map(CompactString::from);
        }
        child
    }

    /// Count one file of `size` bytes directly in this node.
    pub fn add_file(&mut self, size: u64, timestamps: &Timestamps) {
        self.own_size += size;
        self.own_files += 1;
        self.timestamps.merge(timestamps);
    }

    /// Insert one record below this node.
    ///
    /// The final path segment is the file name; its size lands in the own
    /// totals of the node for the segment before it. Intermediate nodes are
    /// created on demand and tagged with `origin`.
    pub fn insert_record(&mut self, record: &FileRecord, origin: Option<&str>) {
        self.insert_segments(
            record.path.segments(),
            record.size,
            &record.timestamps,
            origin,
        );
    }

    fn insert_segments(
        &mut self,
        segments: &[CompactString],
        size: u64,
        timestamps: &Timestamps,
        origin: Option<&str>,
    ) {
        match segments {
            [head, rest @ ..] if head.is_empty() => {
                self.insert_segments(rest, size, timestamps, origin)
            }
            [] | [_] => self.add_file(size, timestamps),
            [head, rest @ ..] => {
                // Each raw leaf passes every ancestor exactly once, so the
                // aggregate can be accumulated here instead of recomputed.
                self.child_size += size;
                self.child_files += 1;
                self.timestamps.merge(timestamps);

                self.child_from(head, origin)
                    .insert_segments(rest, size, timestamps, origin);
            }
        }
    }

    /// Remove a child subtree, returning it, and roll the removal up into
    /// this node.
    pub fn prune_child(&mut self, name: &str) -> Option<Node> {
        let removed = self.children.shift_remove(fold_name(name).as_str());
        if removed.is_some() {
            self.recompute_aggregate();
        }
        removed
    }

    /// Remove every child subtree.
    pub fn prune_children(&mut self) {
        self.children.clear();
        self.child_size = 0;
        self.child_files = 0;
    }

    /// Verify that every node with children carries the sum of its
    /// children's totals.
    ///
    /// Childless nodes are not checked: a rollup slot filled by
    /// [`Node::copy_child_rollup`] legitimately has an aggregate but no
    /// children.
    pub fn verify_rollup(&self) -> Result<(), RollupMismatch> {
        if self.children.is_empty() {
            return Ok(());
        }

        let (size, files) = self.sum_children();
        if size != self.child_size || files != self.child_files {
            return Err(RollupMismatch {
                title: self.title.to_string(),
                level: self.level,
                expected_size: size,
                found_size: self.child_size,
                expected_files: files,
                found_files: self.child_files,
            });
        }

        self.children.values().try_for_each(Node::verify_rollup)
    }

    pub(crate) fn sum_children(&self) -> (u64, u64) {
        self.children.values().fold((0, 0), |(size, files), child| {
            (size + child.total_size(), files + child.total_files())
        })
    }

    pub(crate) fn add_own(&mut self, size: u64, files: u64) {
        self.own_size += size;
        self.own_files += files;
    }

    pub(crate) fn add_aggregate(&mut self, size: u64, files: u64) {
        self.child_size += size;
        self.child_files += files;
    }

    pub(crate) fn set_aggregate(&mut self, size: u64, files: u64) {
        self.child_size = size;
        self.child_files = files;
    }

    pub(crate) fn merge_timestamps(&mut self, timestamps: &Timestamps) {
        self.timestamps.merge(timestamps);
    }

    pub(crate) fn adopt_origin(&mut self, other: &Node) {
        if self.origin.is_none() {
            self.origin = other.origin.clone();
        }
    }

    pub(crate) fn set_depth_limit_field(&mut self, limit: u32) {
        self.depth_limit = limit;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordPath;

    fn record(path: &[&str], size: u64) -> FileRecord {
        FileRecord::new(
            RecordPath::from_segments(path).unwrap(),
            size,
            Timestamps::new(10, 20, 5),
        )
    }

    #[test]
    fn test_root_level() {
        let root = Node::root("root");
        assert_eq!(root.level(), 0);
        assert_eq!(root.name(), "root");
        assert!(root.is_leaf());
    }

    #[test]
    fn test_get_or_create_keeps_first_title() {
        let mut root = Node::root("root");
        root.get_or_create_child("Star");
        root.get_or_create_child("STAR");
        let child = root.get_or_create_child("star");

        assert_eq!(child.title(), "Star");
        assert_eq!(child.name(), "star");
        assert_eq!(child.level(), 1);
        assert_eq!(root.child_count(), 1);
    }

    #[test]
    fn test_insert_folds_file_into_parent() {
        let mut root = Node::root("root");
        root.insert_record(&record(&["a", "b", "c.txt"], 1), None);

        let b = root.descendant(&["a", "b"]).unwrap();
        assert_eq!(b.own_size(), 1);
        assert_eq!(b.own_files(), 1);
        assert!(b.child("c.txt").is_none());
        assert_eq!(root.total_files(), 1);
    }

    #[test]
    fn test_insert_tags_origin() {
        let mut root = Node::root("root");
        root.insert_record(&record(&["a", "f"], 3), Some("project"));
        root.insert_record(&record(&["a", "g"], 4), Some("projecta"));

        let a = root.child("a").unwrap();
        assert_eq!(a.origin(), Some("project"));
        assert_eq!(a.own_size(), 7);
    }

    #[test]
    fn test_prune_child_rolls_up() {
        let mut root = Node::root("root");
        root.insert_record(&record(&["a", "f"], 3), None);
        root.insert_record(&record(&["b", "f"], 4), None);

        let pruned = root.prune_child("A").unwrap();
        assert_eq!(pruned.total_size(), 3);
        assert_eq!(root.total_size(), 4);
        assert!(root.verify_rollup().is_ok());
        assert!(root.prune_child("missing").is_none());
    }
}
