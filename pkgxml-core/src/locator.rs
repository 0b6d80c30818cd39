//! Location of `package.xml` inside an extracted retrieval archive.
//!
//! The external client nests its output differently per retrieval mode:
//! a single-package retrieve puts the manifest at the archive root, a
//! manifest-driven retrieve puts it under `unpackaged/`.

use std::path::{Path, PathBuf};

use crate::error::ManifestError;

pub const MANIFEST_FILE: &str = "package.xml";
pub const UNPACKAGED_DIR: &str = "unpackaged";

/// Expected manifest path below `base`.
pub fn manifest_path(base: &Path, has_explicit_manifest: bool) -> PathBuf {
    if has_explicit_manifest {
        base.join(UNPACKAGED_DIR).join(MANIFEST_FILE)
    } else {
        base.join(MANIFEST_FILE)
    }
}

/// Like [`manifest_path`], but fails when nothing was extracted there.
pub fn locate_manifest(base: &Path, has_explicit_manifest: bool) -> Result<PathBuf, ManifestError> {
    let path = manifest_path(base, has_explicit_manifest);
    if path.is_file() {
        Ok(path)
    } else {
        Err(ManifestError::ManifestMissing { path })
    }
}
