//! Copy and merge operations for composing trees from existing trees.
//!
//! All merges are additive: merging the same source twice doubles its
//! contribution. Every operation that touches children ends with a rollup
//! of the receiving node, so aggregates stay equal to the sum of children.

use crate::node::Node;
use crate::record::Timestamps;

impl Node {
    /// Add the source's own totals and times, leaving children and
    /// aggregates alone.
    pub fn copy_own_only(&mut self, source: &Node) {
        self.add_own(source.own_size(), source.own_files());
        self.merge_timestamps(source.timestamps());
    }

    /// Add the source's own and aggregate totals, merge its children
    /// recursively, then recompute the aggregate from the merged children.
    ///
    /// When the target ends up childless there is nothing to recompute from:
    /// its prior aggregate plus the source's aggregate is kept as is. This is
    /// what carries a [`Node::copy_child_rollup`] slot through a merge.
    pub fn copy_full(&mut self, source: &Node) {
        self.add_own(source.own_size(), source.own_files());
        self.add_aggregate(source.child_size(), source.child_files());
        self.merge_timestamps(source.timestamps());
        self.adopt_origin(source);

        self.merge_children(source);
    }

    /// Merge each of the source's children into the same-named child of
    /// `self` (get-or-create, then [`Node::copy_full`]) and roll up.
    ///
    /// If neither side has children nothing is recomputed, so an aggregate
    /// copied into a childless node survives.
    pub fn merge_children(&mut self, source: &Node) {
        for child in source.children() {
            self.get_or_create_child(child.title()).copy_full(child);
        }

        if !self.is_leaf() {
            self.recompute_aggregate();
        }
    }

    /// Make this node's aggregate exactly the source's totals.
    ///
    /// Not additive. Used for a slot that stands for one whole subtree
    /// without copying the subtree itself.
    pub fn copy_child_rollup(&mut self, source: &Node) {
        self.set_aggregate(source.total_size(), source.total_files());
        self.merge_timestamps(source.timestamps());
        self.adopt_origin(source);
    }

    /// Recompute the aggregate as the sum of the children's totals and fold
    /// their times in.
    pub fn recompute_aggregate(&mut self) {
        let (size, files) = self.sum_children();
        self.set_aggregate(size, files);

        let times = self.children().fold(Timestamps::default(), |mut acc, child| {
            acc.merge(child.timestamps());
            acc
        });
        self.merge_timestamps(&times);
    }

    /// Recompute aggregates for the whole subtree, children before parents.
    pub fn recompute_all(&mut self) {
        for child in self.children_mut() {
            child.recompute_all();
        }
        if !self.is_leaf() {
            self.recompute_aggregate();
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::node::Node;
    use crate::record::{FileRecord, RecordPath, Timestamps};

    fn tree() -> Node {
        let mut root = Node::root("src");
        for (path, size) in [
            (&["x", "y", "f1"][..], 100u64),
            (&["x", "f2"][..], 10),
            (&["z", "f3"][..], 5),
            (&["f4"][..], 1),
        ] {
            let record = FileRecord::new(
                RecordPath::from_segments(path).unwrap(),
                size,
                Timestamps::new(50, 40, 30),
            );
            root.insert_record(&record, None);
        }
        root
    }

    #[test]
    fn test_copy_own_only_ignores_children() {
        let source = tree();
        let mut target = Node::root("dst");
        target.copy_own_only(&source);

        assert_eq!(target.own_size(), 1);
        assert_eq!(target.own_files(), 1);
        assert_eq!(target.child_size(), 0);
        assert!(target.is_leaf());
        assert_eq!(target.timestamps().modified, Some(40));
    }

    #[test]
    fn test_copy_full_matches_source() {
        let source = tree();
        let mut target = Node::root("dst");
        target.copy_full(&source);

        assert_eq!(target.total_size(), source.total_size());
        assert_eq!(target.total_files(), source.total_files());
        assert_eq!(target.descendant(&["x", "y"]).unwrap().own_size(), 100);
        assert_eq!(target.descendant(&["x", "y"]).unwrap().level(), 2);
        assert!(target.verify_rollup().is_ok());
    }

    #[test]
    fn test_copy_full_overwrites_stale_aggregate() {
        let source = tree();
        let mut target = Node::root("dst");
        target.add_aggregate(999, 9);
        target.copy_full(&source);

        assert_eq!(target.child_size(), source.child_size());
        assert!(target.verify_rollup().is_ok());
    }

    #[test]
    fn test_copy_child_rollup_sets_not_adds() {
        let source = tree();
        let mut slot = Node::root("slot");
        slot.copy_child_rollup(&source);
        slot.copy_child_rollup(&source);

        assert_eq!(slot.child_size(), 116);
        assert_eq!(slot.child_files(), 4);
        assert_eq!(slot.own_size(), 0);
    }

    #[test]
    fn test_merge_children_into_leaf_keeps_copied_aggregate() {
        let mut slot = Node::root("slot");
        slot.copy_child_rollup(&tree());

        let empty = Node::root("empty");
        slot.merge_children(&empty);
        assert_eq!(slot.child_size(), 116);
    }

    #[test]
    fn test_copy_full_onto_childless_target_adds_aggregates() {
        let mut slot = Node::root("slot");
        slot.copy_child_rollup(&tree());

        let mut leaf = Node::root("leaf");
        leaf.add_own(5, 1);
        slot.copy_full(&leaf);
        assert_eq!(slot.child_size(), 116);
        assert_eq!(slot.own_size(), 5);

        let mut target = Node::root("dst");
        target.add_aggregate(10, 1);
        target.copy_full(&slot);
        assert!(target.is_leaf());
        assert_eq!(target.child_size(), 126);
        assert_eq!(target.child_files(), 5);
        assert_eq!(target.own_size(), 5);
    }
}
