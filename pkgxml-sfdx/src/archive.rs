//! Extraction of retrieved ZIP archives.

use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::Path;

use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::{io_err, SfdxError};

/// Extract every entry of `archive` below `dest`, returning the number of files written.
///
/// Each entry is read to the end and written out before the next one is
/// opened, so a returned `Ok` means the whole archive landed on disk.
pub fn extract(archive: &Path, dest: &Path) -> Result<usize, SfdxError> {
    let extraction = |source: ZipError| SfdxError::Extraction {
        archive: archive.to_path_buf(),
        source,
    };

    let file = File::open(archive).map_err(|e| extraction(ZipError::Io(e)))?;
    let mut zip = ZipArchive::new(BufReader::new(file)).map_err(extraction)?;
    fs::create_dir_all(dest).map_err(|e| io_err(dest, e))?;

    let mut written = 0;
    for idx in 0..zip.len() {
        let mut entry = zip.by_index(idx).map_err(extraction)?;
        let Some(relative) = entry.enclosed_name() else {
            return Err(SfdxError::UnsafeEntry {
                archive: archive.to_path_buf(),
                entry: entry.name().to_string(),
            });
        };
        let out = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out).map_err(|e| io_err(&out, e))?;
            continue;
        }
        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }

        let mut content = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
        entry
            .read_to_end(&mut content)
            .map_err(|e| extraction(ZipError::Io(e)))?;
        fs::write(&out, &content).map_err(|e| io_err(&out, e))?;
        written += 1;
    }

    tracing::debug!(archive = %archive.display(), dest = %dest.display(), files = written, "extracted archive");
    Ok(written)
}
