use std::path::PathBuf;

use thiserror::Error;

use pkgxml_core::ManifestError;
use pkgxml_sfdx::SfdxError;

/// Error surface of a comparison run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Sfdx(#[from] SfdxError),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("background task failed: {0}")]
    Join(String),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RunError {
    RunError::Io {
        path: path.into(),
        source,
    }
}
