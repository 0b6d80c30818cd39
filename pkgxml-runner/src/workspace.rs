//! Per-org temp workspaces.
//!
//! A workspace owns a temp directory for the lifetime of a run. Dropping it
//! removes the directory, whether the run succeeded or failed; [`OrgWorkspace::keep`]
//! opts out for debugging.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use pkgxml_core::OrgAlias;

use crate::error::{io_err, RunError};

/// Directory below the workspace root that archives are extracted into.
const EXTRACTED_DIR: &str = "extracted";

#[derive(Debug)]
pub struct OrgWorkspace {
    org: OrgAlias,
    dir: TempDir,
}

impl OrgWorkspace {
    /// Allocate a fresh workspace for `org` below `root`.
    pub fn create_in(root: &Path, org: &OrgAlias) -> Result<Self, RunError> {
        let prefix = format!("pkgxml-{}-", file_safe(org.as_str()));
        let dir = tempfile::Builder::new()
            .prefix(&prefix)
            .tempdir_in(root)
            .map_err(|e| io_err(root, e))?;
        tracing::debug!(%org, path = %dir.path().display(), "created workspace");
        Ok(Self {
            org: org.clone(),
            dir,
        })
    }

    pub fn org(&self) -> &OrgAlias {
        &self.org
    }

    /// Root of the workspace; the retrieve target directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Where the retrieved archive is unpacked.
    pub fn extracted_dir(&self) -> PathBuf {
        self.dir.path().join(EXTRACTED_DIR)
    }

    /// Persist the directory past the end of the run and return its path.
    pub fn keep(self) -> PathBuf {
        let path = self.dir.keep();
        tracing::info!(org = %self.org, path = %path.display(), "kept workspace");
        path
    }
}

fn file_safe(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
