//! Error types for pkgxml-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from manifest handling and run configuration.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The extracted archive did not contain a manifest where one was expected.
    #[error("manifest not found at {path}")]
    ManifestMissing { path: PathBuf },

    /// A saved copy would replace an existing file and overwriting was not requested.
    #[error("refusing to overwrite existing file {path}")]
    DestinationExists { path: PathBuf },

    /// Run options failed validation before any work started.
    #[error("invalid options: {0}")]
    InvalidOptions(String),
}

/// Convenience constructor for [`ManifestError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ManifestError {
    ManifestError::Io {
        path: path.into(),
        source,
    }
}
