//! Projections and reports for spacetally.
//!
//! This crate builds named views over ingested base trees and renders them:
//!
//! - **Projection specs** - nesting order, label grouping and render depth
//!   per view, described as data
//! - **Assembly** - views composed with the merge algebra of the core tree,
//!   independent views built in parallel
//! - **Standard catalog** - the storage, user, embedding, picoDst and PWG
//!   reports
//! - **Renderers** - JS tree literals, HTML table rows and JSON
//!
//! # Example
//!
//! ```rust,ignore
//! use spacetally_project::{BaseForest, ProjectionAssembler, standard_projections};
//!
//! let forest = BaseForest::load_snapshots(snapshot_dir, &sources);
//! let assembler = ProjectionAssembler::new(&forest);
//!
//! for projection in assembler.build_all(&standard_projections()?).into_iter().flatten() {
//!     println!("{}: {} bytes", projection.name(), projection.root.total_size());
//! }
//! ```

mod assembler;
mod config;
mod error;
mod presets;
pub mod render;
mod spec;

pub use assembler::{BaseForest, Projection, ProjectionAssembler};
pub use config::ReportConfig;
pub use error::{ProjectError, ProjectionWarning, ProjectionWarningKind};
pub use presets::{standard_projections, standard_sources};
pub use spec::{
    Grouping, Nesting, ProjectionInput, ProjectionSpec, ProjectionSpecBuilder, TableLayout,
    canonical_key,
};
