//! Timestamped copies of the two compared manifests.
//!
//! Copies are named `package-1-<ts>.xml` and `package-2-<ts>.xml` where `ts`
//! is the UTC run time formatted as `%Y-%m-%dT%H:%M:%SZ`.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::{io_err, ManifestError};
use crate::types::{DiffOutcome, SavePolicy};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Everything needed to persist the manifests of one run.
#[derive(Debug, Clone)]
pub struct SaveRequest<'a> {
    pub policy: SavePolicy,
    pub save_dir: &'a Path,
    /// Manifest of org1 and org2, in that order.
    pub manifests: [&'a Path; 2],
    pub overwrite: bool,
    pub timestamp: DateTime<Utc>,
}

/// Format a save timestamp; the month is the calendar month (January = 01).
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Destination paths for the two copies.
pub fn destination_paths(save_dir: &Path, at: DateTime<Utc>) -> [PathBuf; 2] {
    let ts = format_timestamp(at);
    [1, 2].map(|n| save_dir.join(format!("package-{n}-{ts}.xml")))
}

/// Copy both manifests into the save directory if `policy` applies to `outcome`.
///
/// Returns the paths written, which is empty when the policy did not apply.
pub fn save_manifests(
    request: &SaveRequest<'_>,
    outcome: DiffOutcome,
) -> Result<Vec<PathBuf>, ManifestError> {
    if !request.policy.applies_to(outcome) {
        tracing::debug!(policy = %request.policy, %outcome, "not saving manifests");
        return Ok(Vec::new());
    }

    let destinations = destination_paths(request.save_dir, request.timestamp);
    if !request.overwrite {
        if let Some(existing) = destinations.iter().find(|p| p.exists()) {
            return Err(ManifestError::DestinationExists {
                path: existing.clone(),
            });
        }
    }

    let mut written: Vec<PathBuf> = Vec::with_capacity(2);
    for (source, dest) in request.manifests.iter().zip(destinations) {
        if let Err(err) = copy_manifest(source, &dest, request.overwrite) {
            // A failed save leaves no partial pair behind.
            for path in &written {
                if let Err(e) = fs::remove_file(path) {
                    tracing::warn!(path = %path.display(), error = %e, "could not remove saved copy");
                }
            }
            return Err(err);
        }
        tracing::info!("saved: {}", dest.display());
        written.push(dest);
    }
    Ok(written)
}

fn copy_manifest(source: &Path, dest: &Path, overwrite: bool) -> Result<(), ManifestError> {
    let content = fs::read(source).map_err(|e| io_err(source, e))?;

    let mut options = OpenOptions::new();
    options.write(true);
    if overwrite {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }

    let mut file = options.open(dest).map_err(|e| match e.kind() {
        io::ErrorKind::AlreadyExists => ManifestError::DestinationExists {
            path: dest.to_path_buf(),
        },
        _ => io_err(dest, e),
    })?;
    io::Write::write_all(&mut file, &content).map_err(|e| io_err(dest, e))
}
