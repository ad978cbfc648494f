//! Projection assembly.
//!
//! Views are composed from already ingested base trees with the merge
//! operations of [`Node`]; raw dumps are never re-read. Base trees are only
//! read here, each view is written into its own fresh root, so distinct
//! projections build in parallel.

use std::path::Path;

use compact_str::CompactString;
use indexmap::IndexMap;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use spacetally_core::{Node, RenderConfig, SourceSpec, UsageTree};
use spacetally_ingest::{load_snapshot, snapshot_path};

use crate::error::{ProjectError, ProjectionWarning, ProjectionWarningKind};
use crate::spec::{Grouping, Nesting, ProjectionInput, ProjectionSpec};

/// Base trees keyed by source key.
#[derive(Debug, Clone, Default)]
pub struct BaseForest {
    roots: IndexMap<CompactString, Node>,
}

impl BaseForest {
    /// Create an empty forest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a base root under `source`, replacing any previous one.
    pub fn insert(&mut self, source: impl Into<CompactString>, root: Node) {
        self.roots.insert(source.into(), root);
    }

    /// Add an ingested tree under its source key.
    pub fn insert_tree(&mut self, tree: UsageTree) {
        self.insert(tree.source.key(), tree.root);
    }

    /// Load the snapshot of every source found in `dir`.
    ///
    /// A missing or unreadable snapshot is logged and skipped; projections
    /// depending on it report the gap themselves.
    pub fn load_snapshots(dir: &Path, sources: &[SourceSpec]) -> Self {
        let mut forest = Self::new();
        for source in sources {
            let path = snapshot_path(dir, source);
            match load_snapshot(&path) {
                Ok(tree) => {
                    debug!(source = %source.key(), path = %path.display(), "Loaded snapshot");
                    forest.insert_tree(tree);
                }
                Err(err) => warn!(source = %source.key(), "{err}"),
            }
        }
        forest
    }

    /// Root of a source.
    pub fn get(&self, source: &str) -> Option<&Node> {
        self.roots.get(source)
    }

    /// Node an input points at.
    pub fn resolve(&self, input: &ProjectionInput) -> Option<&Node> {
        self.get(&input.source)?.descendant(&input.path)
    }

    /// Loaded source keys, in insertion order.
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.roots.keys().map(CompactString::as_str)
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// One-level summary: a slot per source holding that source's totals,
    /// without copying the subtrees.
    pub fn overview(&self, title: &str) -> Node {
        let mut root = Node::root(title);
        for source in self.roots.values() {
            root.get_or_create_child(source.title())
                .copy_child_rollup(source);
        }
        root.recompute_aggregate();
        root
    }
}

/// A built view.
#[derive(Debug, Clone)]
pub struct Projection {
    pub spec: ProjectionSpec,
    pub root: Node,
    /// Render depth applied to `root`.
    pub depth_limit: u32,
    pub warnings: Vec<ProjectionWarning>,
}

impl Projection {
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Builds projections over a [`BaseForest`].
#[derive(Debug, Clone)]
pub struct ProjectionAssembler<'a> {
    forest: &'a BaseForest,
    render: RenderConfig,
}

impl<'a> ProjectionAssembler<'a> {
    /// Create an assembler with the default render configuration.
    pub fn new(forest: &'a BaseForest) -> Self {
        Self {
            forest,
            render: RenderConfig::default(),
        }
    }

    /// Use a specific render configuration.
    pub fn with_render_config(mut self, render: RenderConfig) -> Self {
        self.render = render;
        self
    }

    /// Build one projection.
    ///
    /// Inputs that cannot be resolved are skipped with a warning. Fails
    /// only if no input resolves at all.
    pub fn build(&self, spec: &ProjectionSpec) -> Result<Projection, ProjectError> {
        let mut view = Node::root(&spec.name);
        view.set_title(&spec.title);

        let mut warnings = Vec::new();
        let mut resolved = 0usize;

        for input in &spec.inputs {
            let Some(source) = self.resolve(spec, input, &mut warnings) else {
                continue;
            };
            resolved += 1;
            self.place_input(&mut view, spec, input, source);
        }

        if resolved == 0 {
            return Err(ProjectError::MissingRoot {
                projection: spec.name.clone(),
            });
        }

        if !view.is_leaf() {
            view.recompute_aggregate();
        }
        if let Err(mismatch) = view.verify_rollup() {
            warn!(projection = %spec.name, "{mismatch}");
        }

        let depth_limit = self.render.depth_for(spec.depth_offset);
        view.set_depth_limit(depth_limit);

        info!(
            projection = %spec.name,
            inputs = resolved,
            skipped = warnings.len(),
            size = view.total_size(),
            files = view.total_files(),
            "Built projection"
        );

        Ok(Projection {
            spec: spec.clone(),
            root: view,
            depth_limit,
            warnings,
        })
    }

    /// Build independent projections in parallel, results in input order.
    pub fn build_all(&self, specs: &[ProjectionSpec]) -> Vec<Result<Projection, ProjectError>> {
        specs
            .par_iter()
            .map(|spec| {
                let result = self.build(spec);
                if let Err(err) = &result {
                    warn!(projection = %spec.name, "{err}");
                }
                result
            })
            .collect()
    }

    fn resolve(
        &self,
        spec: &ProjectionSpec,
        input: &ProjectionInput,
        warnings: &mut Vec<ProjectionWarning>,
    ) -> Option<&'a Node> {
        let forest: &'a BaseForest = self.forest;
        let kind = match forest.get(&input.source) {
            None => ProjectionWarningKind::MissingSource,
            Some(root) => match root.descendant(&input.path) {
                Some(node) => return Some(node),
                None => ProjectionWarningKind::MissingSubtree,
            },
        };

        let warning = ProjectionWarning {
            projection: spec.name.clone(),
            source: input.source.clone(),
            path: input.path.clone(),
            kind,
        };
        warn!(projection = %spec.name, "Skipping input: {}", warning.message());
        warnings.push(warning);
        None
    }

    fn place_input(
        &self,
        view: &mut Node,
        spec: &ProjectionSpec,
        input: &ProjectionInput,
        source: &Node,
    ) {
        let dimension = input.dimension.as_deref().unwrap_or(source.title());

        match spec.nesting {
            Nesting::Flat => place(view, source, spec.grouping, spec.group_depth),
            Nesting::DimensionThenGroup => {
                let dim = view.get_or_create_child(dimension);
                place(dim, source, spec.grouping, spec.group_depth);
            }
            Nesting::GroupThenDimension => {
                view.copy_own_only(source);
                for child in source.children() {
                    let bucket = view.get_or_create_child(spec.grouping.key(child.title()));
                    bucket.get_or_create_child(dimension).copy_full(child);
                    bucket.recompute_aggregate();
                }
            }
        }
    }
}

/// Merge `source` into `target`, grouping the children found `depth`
/// levels down.
///
/// The source's own files land in `target`'s own totals; every child is
/// merged into the bucket its label maps to. Above the grouping level the
/// structure is copied one node at a time with identity labels.
fn place(target: &mut Node, source: &Node, grouping: Grouping, depth: u32) {
    target.copy_own_only(source);

    for child in source.children() {
        if depth == 0 {
            target
                .get_or_create_child(grouping.key(child.title()))
                .copy_full(child);
        } else {
            place(
                target.get_or_create_child(child.title()),
                child,
                grouping,
                depth - 1,
            );
        }
    }

    if !target.is_leaf() {
        target.recompute_aggregate();
    }
}
