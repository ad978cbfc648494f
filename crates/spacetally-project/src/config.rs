//! TOML report configuration.
//!
//! ```toml
//! dump_dir = "/gpfs/dumps"
//! snapshot_dir = "snapshots"
//! output_dir = "output"
//!
//! [render]
//! default_depth = 6
//!
//! [[sources]]
//! storage = "project"
//! folder = "star"
//! path = "/gpfs/dumps/project/prj-star.list"
//!
//! [[projections]]
//! name = "pwgstar"
//! title = "STAR PWGs"
//! depth_offset = 3
//! tables = ["plain"]
//! inputs = [{ source = "project_star", path = ["star", "pwg"] }]
//! ```
//!
//! Empty `sources` or `projections` fall back to the standard catalog.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use spacetally_core::{RenderConfig, SourceSpec};

use crate::error::ProjectError;
use crate::presets::{standard_projections, standard_sources};
use crate::spec::ProjectionSpec;

/// Everything a report run needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Directory holding the dump files of the standard sources.
    #[serde(default = "default_dump_dir")]
    pub dump_dir: PathBuf,

    /// Directory for tree snapshots.
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: PathBuf,

    /// Directory for rendered output.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub sources: Vec<SourceSpec>,

    #[serde(default)]
    pub projections: Vec<ProjectionSpec>,
}

fn default_dump_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_snapshot_dir() -> PathBuf {
    PathBuf::from("snapshots")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            dump_dir: default_dump_dir(),
            snapshot_dir: default_snapshot_dir(),
            output_dir: default_output_dir(),
            render: RenderConfig::default(),
            sources: Vec::new(),
            projections: Vec::new(),
        }
    }
}

impl ReportConfig {
    /// Read and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ProjectError> {
        let text = fs::read_to_string(path).map_err(|e| ProjectError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(&text).map_err(|e| match e {
            ProjectError::Config { message, .. } => ProjectError::Config {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }

    /// Parse and validate config text.
    pub fn parse(text: &str) -> Result<Self, ProjectError> {
        let config: Self = toml::from_str(text).map_err(|e| ProjectError::Config {
            path: PathBuf::new(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ProjectError> {
        if self.render.default_depth == 0 || self.render.default_depth > self.render.max_depth {
            return Err(ProjectError::invalid_spec(format!(
                "render depth {} must be between 1 and {}",
                self.render.default_depth, self.render.max_depth
            )));
        }
        self.projections.iter().try_for_each(ProjectionSpec::validate)
    }

    /// Configured sources, or the standard ones below `dump_dir`.
    pub fn sources(&self) -> Vec<SourceSpec> {
        if self.sources.is_empty() {
            standard_sources(&self.dump_dir)
        } else {
            self.sources.clone()
        }
    }

    /// Configured projections, or the standard catalog.
    pub fn projections(&self) -> Result<Vec<ProjectionSpec>, ProjectError> {
        if self.projections.is_empty() {
            standard_projections()
        } else {
            Ok(self.projections.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{Grouping, TableLayout};

    #[test]
    fn test_empty_config_uses_standard_catalog() {
        let config = ReportConfig::parse("").unwrap();
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert_eq!(config.render.default_depth, 6);
        assert_eq!(config.sources().len(), 4);
        assert_eq!(config.projections().unwrap().len(), 10);
    }

    #[test]
    fn test_parse_projection() {
        let text = r#"
            output_dir = "/tmp/out"

            [render]
            default_depth = 4

            [[projections]]
            name = "embedding"
            title = "Embedding"
            grouping = { kind = "canonical", separator = "_" }
            group_depth = 1
            tables = ["plain", "extended"]
            inputs = [{ source = "projecta_starprod", path = ["starprod", "embedding"] }]
        "#;
        let config = ReportConfig::parse(text).unwrap();

        assert_eq!(config.render.default_depth, 4);
        let spec = &config.projections().unwrap()[0];
        assert_eq!(spec.grouping, Grouping::Canonical { separator: '_' });
        assert_eq!(spec.tables, vec![TableLayout::Plain, TableLayout::Extended]);
        assert_eq!(spec.inputs[0].path.len(), 2);
    }

    #[test]
    fn test_invalid_projection_rejected() {
        let text = r#"
            [[projections]]
            name = "broken"
            title = "Broken"
            nesting = "dimension_then_group"
            inputs = [{ source = "project_star" }]
        "#;
        assert!(matches!(
            ReportConfig::parse(text),
            Err(ProjectError::InvalidSpec { .. })
        ));
    }

    #[test]
    fn test_syntax_error_is_config_error() {
        assert!(matches!(
            ReportConfig::parse("render = ["),
            Err(ProjectError::Config { .. })
        ));
    }
}
