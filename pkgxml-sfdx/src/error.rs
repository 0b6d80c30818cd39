//! Error types for pkgxml-sfdx.

use std::path::PathBuf;

use thiserror::Error;

use pkgxml_core::OrgAlias;

/// All errors that can arise while talking to `sfdx` or unpacking its output.
#[derive(Debug, Error)]
pub enum SfdxError {
    /// The external client could not be started at all.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The org is unknown to the client or its session is not usable.
    #[error("org '{org}' is not connected: {message}")]
    Connection { org: OrgAlias, message: String },

    /// The metadata retrieve itself failed.
    #[error("retrieve from org '{org}' failed: {message}")]
    Retrieval { org: OrgAlias, message: String },

    /// The archive is missing, truncated or not a ZIP file.
    #[error("failed to extract {archive}: {source}")]
    Extraction {
        archive: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// An archive entry would be written outside the destination directory.
    #[error("archive {archive} contains unsafe entry '{entry}'")]
    UnsafeEntry { archive: PathBuf, entry: String },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`SfdxError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SfdxError {
    SfdxError::Io {
        path: path.into(),
        source,
    }
}
