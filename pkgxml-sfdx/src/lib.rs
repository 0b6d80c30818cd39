//! # pkgxml-sfdx
//!
//! Thin async wrapper over the `sfdx` command-line client plus extraction of
//! the archives it retrieves.
//!
//! [`RetrievalClient`] is the seam the orchestrator drives; [`SfdxClient`] is
//! the production implementation that shells out to `sfdx`.

pub mod archive;
pub mod client;
pub mod error;

pub use archive::extract;
pub use client::{RetrievalClient, RetrieveRequest, SfdxClient, ARCHIVE_FILE};
pub use error::SfdxError;
