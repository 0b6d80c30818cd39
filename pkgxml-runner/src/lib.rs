//! Manifest comparison runtime: temp workspaces, the staged pipeline, logging.
//!
//! [`start_blocking`] is the entry point used by the CLI; [`Runner`] exposes
//! the same pipeline for callers that bring their own tokio runtime or
//! [`RetrievalClient`](pkgxml_sfdx::RetrievalClient).

mod error;
mod runtime;
pub mod workspace;

pub use error::RunError;
pub use runtime::{init_tracing, start_blocking, OrgManifest, RunReport, Runner, Stage};
