//! The standard report catalog.
//!
//! Four dumps (`project/alice`, `project/star`, `project/starprod`,
//! `projecta/starprod`) feed the storage, user, embedding, picoDst and PWG
//! views.

use std::path::Path;

use spacetally_core::SourceSpec;

use crate::error::ProjectError;
use crate::spec::{Grouping, Nesting, ProjectionInput, ProjectionSpec, TableLayout};

const STANDARD_SOURCES: [(&str, &str, &str); 4] = [
    ("project", "alice", "prj"),
    ("project", "star", "prj"),
    ("project", "starprod", "prj"),
    ("projecta", "starprod", "prj"),
];

/// Standard dump sources below `dump_dir`, e.g.
/// `<dump_dir>/project/prj-star.list`.
pub fn standard_sources(dump_dir: &Path) -> Vec<SourceSpec> {
    STANDARD_SOURCES
        .iter()
        .map(|(storage, folder, prefix)| {
            let path = dump_dir
                .join(storage)
                .join(format!("{prefix}-{folder}.list"));
            SourceSpec::new(*storage, *folder, path)
        })
        .collect()
}

/// Standard projections.
pub fn standard_projections() -> Result<Vec<ProjectionSpec>, ProjectError> {
    let picodsts = |version: u32, nesting: Nesting| {
        let mut builder = ProjectionSpec::builder();
        builder
            .name(format!("picodstsV{version}"))
            .title(format!("STAR picoDsts V{version}"))
            .nesting(nesting)
            .depth_offset(1u32)
            .input(
                ProjectionInput::new("project_star", ["star", "starprod", "picodsts"])
                    .with_dimension("star"),
            )
            .input(
                ProjectionInput::new("project_starprod", ["starprod", "picodsts"])
                    .with_dimension("starprod"),
            );
        builder
    };

    Ok(vec![
        ProjectionSpec::builder()
            .name("project")
            .title("project")
            .input(ProjectionInput::whole("project_alice"))
            .input(ProjectionInput::whole("project_star"))
            .input(ProjectionInput::whole("project_starprod"))
            .build()?,
        ProjectionSpec::builder()
            .name("projecta")
            .title("projecta")
            .input(ProjectionInput::whole("projecta_starprod"))
            .build()?,
        ProjectionSpec::builder()
            .name("alice_user")
            .title("alice user")
            .input(ProjectionInput::new("project_alice", ["alice"]))
            .table(TableLayout::Plain)
            .build()?,
        ProjectionSpec::builder()
            .name("rnc_user")
            .title("rnc user")
            .input(ProjectionInput::new("project_starprod", ["starprod", "rnc"]))
            .table(TableLayout::Plain)
            .build()?,
        // trigger setup > particle (merged across versions) > production
        ProjectionSpec::builder()
            .name("embeddingV1")
            .title("STAR embedding V1")
            .grouping(Grouping::Canonical { separator: '_' })
            .group_depth(1u32)
            .input(ProjectionInput::new(
                "projecta_starprod",
                ["starprod", "embedding"],
            ))
            .table(TableLayout::Plain)
            .table(TableLayout::Extended)
            .build()?,
        ProjectionSpec::builder()
            .name("embeddingV2")
            .title("STAR embedding V2")
            .input(ProjectionInput::new(
                "projecta_starprod",
                ["starprod", "embedding"],
            ))
            .build()?,
        picodsts(1, Nesting::Flat).table(TableLayout::Plain).build()?,
        picodsts(2, Nesting::GroupThenDimension).build()?,
        picodsts(3, Nesting::DimensionThenGroup)
            .table(TableLayout::WithParent)
            .build()?,
        ProjectionSpec::builder()
            .name("pwgstar")
            .title("STAR PWGs")
            .depth_offset(3u32)
            .input(ProjectionInput::new("project_star", ["star", "pwg"]))
            .table(TableLayout::Plain)
            .build()?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_sources() {
        let sources = standard_sources(Path::new("/dumps"));
        assert_eq!(sources.len(), 4);
        assert_eq!(sources[3].key(), "projecta_starprod");
        assert_eq!(
            sources[1].path,
            Path::new("/dumps/project/prj-star.list")
        );
    }

    #[test]
    fn test_standard_projections_are_valid() {
        let specs = standard_projections().unwrap();
        assert_eq!(specs.len(), 10);

        let names: Vec<&str> = specs.iter().map(|s| s.name.as_str()).collect();
        assert!(names.contains(&"embeddingV1"));
        assert!(names.contains(&"picodstsV3"));

        let pwg = specs.iter().find(|s| s.name == "pwgstar").unwrap();
        assert_eq!(pwg.depth_offset, 3);
    }
}
