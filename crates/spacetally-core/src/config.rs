//! Render and source configuration types.

use std::path::PathBuf;

use compact_str::{CompactString, format_compact};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Default number of levels a traversal descends.
pub const DEFAULT_DEPTH_LIMIT: u32 = 6;

/// Configuration for render-time traversal.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct RenderConfig {
    /// Depth limit applied to projections without an override.
    #[builder(default = "DEFAULT_DEPTH_LIMIT")]
    #[serde(default = "default_depth")]
    pub default_depth: u32,

    /// Hard cap on any depth, including per-projection offsets.
    #[builder(default = "32")]
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
}

fn default_depth() -> u32 {
    DEFAULT_DEPTH_LIMIT
}

fn default_max_depth() -> u32 {
    32
}

impl RenderConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        let depth = self.default_depth.unwrap_or(DEFAULT_DEPTH_LIMIT);
        let max = self.max_depth.unwrap_or(32);
        if depth == 0 {
            return Err("Default depth must be at least 1".to_string());
        }
        if depth > max {
            return Err(format!("Default depth {depth} exceeds max depth {max}"));
        }
        Ok(())
    }
}

impl RenderConfig {
    /// Create a new render config builder.
    pub fn builder() -> RenderConfigBuilder {
        RenderConfigBuilder::default()
    }

    /// Depth limit for a projection that asks for `offset` extra levels.
    pub fn depth_for(&self, offset: u32) -> u32 {
        self.default_depth.saturating_add(offset).min(self.max_depth)
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            default_depth: DEFAULT_DEPTH_LIMIT,
            max_depth: default_max_depth(),
        }
    }
}

/// One dump file: which storage it describes and which top-level folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpec {
    /// Storage the dump was taken from (e.g. `project`).
    pub storage: CompactString,
    /// Top-level folder within the storage (e.g. `star`).
    pub folder: CompactString,
    /// Path of the dump file.
    pub path: PathBuf,
}

impl SourceSpec {
    /// Create a source spec.
    pub fn new(
        storage: impl Into<CompactString>,
        folder: impl Into<CompactString>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            storage: storage.into(),
            folder: folder.into(),
            path: path.into(),
        }
    }

    /// Unique key of this source, `<storage>_<folder>`.
    pub fn key(&self) -> CompactString {
        format_compact!("{}_{}", self.storage, self.folder)
    }
}
