//! Projection specifications.
//!
//! A projection is described once, as data: which base subtrees feed it,
//! how they nest under the view root, how child labels are grouped, and how
//! much deeper than the default it may be rendered.

use compact_str::CompactString;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::ProjectError;

/// Order in which inputs are nested below the view root.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Nesting {
    /// Every input is merged straight into the view root.
    #[default]
    Flat,
    /// view → bucket (input child) → dimension → bucket contents.
    GroupThenDimension,
    /// view → dimension → input contents.
    DimensionThenGroup,
}

/// How child labels map to bucket keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Grouping {
    /// Each label is its own bucket.
    #[default]
    Identity,
    /// Labels are cut at the first `separator` past position zero.
    Canonical { separator: char },
}

impl Grouping {
    /// Bucket key for a child label.
    pub fn key<'a>(&self, label: &'a str) -> &'a str {
        match self {
            Grouping::Identity => label,
            Grouping::Canonical { separator } => canonical_key(label, *separator),
        }
    }
}

/// Prefix of `label` before the first `separator`, or the whole label if
/// the separator is absent or leads the label.
///
/// ```
/// use spacetally_project::canonical_key;
///
/// assert_eq!(canonical_key("pion_v1", '_'), "pion");
/// assert_eq!(canonical_key("kaon", '_'), "kaon");
/// assert_eq!(canonical_key("_hidden", '_'), "_hidden");
/// ```
pub fn canonical_key(label: &str, separator: char) -> &str {
    match label.find(separator) {
        Some(pos) if pos > 0 => &label[..pos],
        _ => label,
    }
}

/// One base subtree feeding a projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionInput {
    /// Source key, `<storage>_<folder>`.
    pub source: CompactString,
    /// Path below the source root.
    #[serde(default)]
    pub path: Vec<CompactString>,
    /// Label of the dimension node for nested projections.
    #[serde(default)]
    pub dimension: Option<CompactString>,
}

impl ProjectionInput {
    /// Input taken from `path` below the root of `source`.
    pub fn new<I, S>(source: &str, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            source: source.into(),
            path: path.into_iter().map(|s| s.as_ref().into()).collect(),
            dimension: None,
        }
    }

    /// Input covering the whole tree of `source`.
    pub fn whole(source: &str) -> Self {
        Self::new::<_, &str>(source, [])
    }

    /// Set the dimension label.
    pub fn with_dimension(mut self, dimension: &str) -> Self {
        self.dimension = Some(dimension.into());
        self
    }
}

/// Table layout for HTML row output.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TableLayout {
    /// One row per root child.
    Plain,
    /// One row per grandchild, with its parent as a second column.
    WithParent,
    /// One row per great-grandchild, with grandparent and parent columns.
    Extended,
}

impl TableLayout {
    /// Label columns in front of the value columns.
    pub fn label_columns(self) -> usize {
        match self {
            TableLayout::Plain => 1,
            TableLayout::WithParent => 2,
            TableLayout::Extended => 3,
        }
    }

    /// Stem of the files this layout writes.
    pub fn file_stem(self) -> &'static str {
        match self {
            TableLayout::Plain | TableLayout::WithParent => "outfile_Table",
            TableLayout::Extended => "outfile_Table_Ext",
        }
    }
}

/// A named projection.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(
    setter(into),
    build_fn(private, name = "build_unchecked")
)]
pub struct ProjectionSpec {
    /// Output name; also the JS variable prefix.
    pub name: CompactString,

    /// Display title of the view root.
    pub title: CompactString,

    #[builder(default)]
    #[serde(default)]
    pub nesting: Nesting,

    #[builder(default)]
    #[serde(default)]
    pub grouping: Grouping,

    /// Levels below each input root at which grouping applies.
    #[builder(default)]
    #[serde(default)]
    pub group_depth: u32,

    /// Extra levels over the default render depth.
    #[builder(default)]
    #[serde(default)]
    pub depth_offset: u32,

    #[builder(setter(each(name = "input")))]
    pub inputs: Vec<ProjectionInput>,

    #[builder(default, setter(each(name = "table")))]
    #[serde(default)]
    pub tables: Vec<TableLayout>,
}

impl ProjectionSpecBuilder {
    /// Build and validate the spec.
    pub fn build(&self) -> Result<ProjectionSpec, ProjectError> {
        let spec = self
            .build_unchecked()
            .map_err(|e| ProjectError::invalid_spec(e.to_string()))?;
        spec.validate()?;
        Ok(spec)
    }
}

impl ProjectionSpec {
    /// Create a new builder.
    pub fn builder() -> ProjectionSpecBuilder {
        ProjectionSpecBuilder::default()
    }

    /// Check the spec for contradictions.
    pub fn validate(&self) -> Result<(), ProjectError> {
        if self.name.is_empty() {
            return Err(ProjectError::invalid_spec("projection name is empty"));
        }
        if self.inputs.is_empty() {
            return Err(ProjectError::invalid_spec(format!(
                "{}: at least one input is required",
                self.name
            )));
        }
        if self.nesting == Nesting::GroupThenDimension && self.group_depth != 0 {
            return Err(ProjectError::invalid_spec(format!(
                "{}: group_then_dimension groups the input's direct children, group_depth must be 0",
                self.name
            )));
        }
        if self.nesting != Nesting::Flat {
            if let Some(input) = self.inputs.iter().find(|i| i.dimension.is_none()) {
                return Err(ProjectError::invalid_spec(format!(
                    "{}: input {} needs a dimension for {} nesting",
                    self.name, input.source, self.nesting
                )));
            }
        }

        let mut stems: Vec<&str> = self.tables.iter().map(|t| t.file_stem()).collect();
        stems.sort_unstable();
        if stems.windows(2).any(|w| w[0] == w[1]) {
            return Err(ProjectError::invalid_spec(format!(
                "{}: two table layouts would write the same file",
                self.name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> ProjectionSpecBuilder {
        let mut builder = ProjectionSpec::builder();
        builder
            .name("picodsts")
            .title("STAR picoDsts")
            .input(ProjectionInput::new("project_starprod", ["starprod", "picodsts"]));
        builder
    }

    #[test]
    fn test_defaults() {
        let spec = builder().build().unwrap();
        assert_eq!(spec.nesting, Nesting::Flat);
        assert_eq!(spec.grouping, Grouping::Identity);
        assert_eq!(spec.depth_offset, 0);
        assert!(spec.tables.is_empty());
    }

    #[test]
    fn test_missing_inputs_rejected() {
        let result = ProjectionSpec::builder()
            .name("empty")
            .title("Empty")
            .inputs(Vec::new())
            .build();
        assert!(matches!(result, Err(ProjectError::InvalidSpec { .. })));
    }

    #[test]
    fn test_nested_requires_dimension() {
        let result = builder().nesting(Nesting::DimensionThenGroup).build();
        assert!(matches!(result, Err(ProjectError::InvalidSpec { .. })));
    }

    #[test]
    fn test_group_then_dimension_requires_depth_zero() {
        let result = builder()
            .inputs(vec![
                ProjectionInput::new("project_starprod", ["starprod"]).with_dimension("starprod"),
            ])
            .nesting(Nesting::GroupThenDimension)
            .group_depth(1u32)
            .build();
        assert!(matches!(result, Err(ProjectError::InvalidSpec { .. })));
    }

    #[test]
    fn test_conflicting_tables_rejected() {
        let result = builder()
            .table(TableLayout::Plain)
            .table(TableLayout::WithParent)
            .build();
        assert!(matches!(result, Err(ProjectError::InvalidSpec { .. })));
    }

    #[test]
    fn test_canonical_grouping() {
        let grouping = Grouping::Canonical { separator: '_' };
        assert_eq!(grouping.key("pion_v1"), "pion");
        assert_eq!(grouping.key("pion_v2_tight"), "pion");
        assert_eq!(grouping.key("kaon"), "kaon");
        assert_eq!(Grouping::Identity.key("pion_v1"), "pion_v1");
    }

    #[test]
    fn test_nesting_names() {
        assert_eq!(Nesting::GroupThenDimension.to_string(), "group_then_dimension");
        assert_eq!(
            "dimension_then_group".parse::<Nesting>().unwrap(),
            Nesting::DimensionThenGroup
        );
    }
}
