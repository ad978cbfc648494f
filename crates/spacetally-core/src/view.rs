//! Render-depth limiting and the ordered traversal handed to renderers.
//!
//! Nothing here changes sizes or counts. A traversal visits a node, then
//! descends into its children (sorted by title) only while the node's level
//! is below its depth limit.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::format::{AlarmLevel, format_date, gib_size, human_readable_size};
use crate::node::Node;

/// Totals and dates of one node, as a renderer needs them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub total_size: u64,
    pub total_files: u64,
    pub alarm: AlarmLevel,
    pub create_date: String,
    pub modify_date: String,
    pub access_date: String,
}

impl Totals {
    /// Capture the totals of a node.
    pub fn of(node: &Node) -> Self {
        let ts = node.timestamps();
        Self {
            total_size: node.total_size(),
            total_files: node.total_files(),
            alarm: AlarmLevel::classify(node.total_size()),
            create_date: format_date(ts.created),
            modify_date: format_date(ts.modified),
            access_date: format_date(ts.accessed),
        }
    }

    /// Size with a binary prefix, e.g. `1.50kB`.
    pub fn human_size(&self) -> String {
        human_readable_size(self.total_size)
    }

    /// Size in GiB, or the below-threshold marker.
    pub fn gib_size(&self) -> String {
        gib_size(self.total_size)
    }
}

/// One visited node in render order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderRow {
    pub title: CompactString,
    pub level: u32,
    #[serde(flatten)]
    pub totals: Totals,
    /// The node has children that the depth limit keeps hidden.
    pub has_more_children_below_limit: bool,
}

/// Aggregate line for a whole projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub title: CompactString,
    #[serde(flatten)]
    pub totals: Totals,
}

/// A child listed under a fixed parent, for table output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    pub parent: CompactString,
    pub title: CompactString,
    #[serde(flatten)]
    pub totals: Totals,
}

impl Node {
    /// Cap traversal at `limit` for this node and every descendant whose
    /// level is at most `limit`.
    pub fn set_depth_limit(&mut self, limit: u32) {
        self.set_depth_limit_field(limit);
        if self.level() < limit {
            for child in self.children_mut() {
                child.set_depth_limit(limit);
            }
        }
    }

    /// Whether a traversal descends below this node.
    pub fn expands(&self) -> bool {
        self.level() < self.depth_limit() && !self.is_leaf()
    }

    /// Depth-first traversal rows, children sorted by title.
    pub fn render_rows(&self) -> Vec<RenderRow> {
        let mut rows = Vec::new();
        self.collect_rows(&mut rows);
        rows
    }

    fn collect_rows(&self, rows: &mut Vec<RenderRow>) {
        let expands = self.expands();
        rows.push(RenderRow {
            title: CompactString::from(self.title()),
            level: self.level(),
            totals: Totals::of(self),
            has_more_children_below_limit: !expands && !self.is_leaf(),
        });

        if expands {
            for child in self.sorted_children() {
                child.collect_rows(rows);
            }
        }
    }

    /// Single aggregate row for this node.
    pub fn summary(&self) -> SummaryRow {
        SummaryRow {
            title: CompactString::from(self.title()),
            totals: Totals::of(self),
        }
    }

    /// One row per direct child, sorted by title, each carrying this
    /// node's title as the parent column.
    pub fn table_rows(&self) -> Vec<TableRow> {
        let parent = CompactString::from(self.title());
        self.sorted_children()
            .map(|child| TableRow {
                parent: parent.clone(),
                title: CompactString::from(child.title()),
                totals: Totals::of(child),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{FileRecord, RecordPath, Timestamps};

    fn deep_tree() -> Node {
        let mut root = Node::root("root");
        for path in [["a", "b", "c", "d", "f"], ["a", "B2", "c", "d", "g"]] {
            let record = FileRecord::new(
                RecordPath::from_segments(path).unwrap(),
                10,
                Timestamps::new(3, 2, 1),
            );
            root.insert_record(&record, None);
        }
        root
    }

    #[test]
    fn test_rows_sorted_case_sensitive() {
        let root = deep_tree();
        let titles: Vec<_> = root
            .child("a")
            .unwrap()
            .sorted_children()
            .map(|c| c.title().to_string())
            .collect();
        assert_eq!(titles, vec!["B2", "b"]);
    }

    #[test]
    fn test_depth_limit_hides_deeper_levels() {
        let mut root = deep_tree();
        let before = root.total_size();
        root.set_depth_limit(2);

        let rows = root.render_rows();
        assert!(rows.iter().all(|r| r.level <= 2));
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().filter(|r| r.level == 2).all(|r| r.has_more_children_below_limit));
        assert_eq!(root.total_size(), before);
    }

    #[test]
    fn test_table_rows_repeat_parent() {
        let root = deep_tree();
        let rows = root.child("a").unwrap().table_rows();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.parent == "a"));
        assert_eq!(rows[1].totals.total_size, 10);
    }

    #[test]
    fn test_summary_dates() {
        let summary = deep_tree().summary();
        assert_eq!(summary.totals.total_files, 2);
        assert_eq!(summary.totals.modify_date, "1970-01-01");
    }
}
