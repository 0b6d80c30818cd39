//! pkgxml core library: domain types, manifest normalization, diffing, saving.
//!
//! Public API surface:
//! - [`types`] - org aliases, retrieval mode, save policy, run options
//! - [`error`] - [`ManifestError`]
//! - [`locator`] - where a retrieved `package.xml` lands after extraction
//! - [`marker`] - namespace-marker stripping
//! - [`differ`] - trimmed line diff between two manifests
//! - [`save`] - timestamped copies of compared manifests

pub mod differ;
pub mod error;
pub mod locator;
pub mod marker;
pub mod save;
pub mod types;

pub use differ::{diff_manifests, DiffSegment, ManifestDiff, SegmentTag};
pub use error::ManifestError;
pub use marker::StripOutcome;
pub use types::{DiffOutcome, OrgAlias, RetrievalMode, RunOptions, SavePolicy};
