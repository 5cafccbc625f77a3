// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output storage: every artifact is written to a temporary file in the
// target directory and renamed into place only once it is complete.

use std::io::Write;
use std::path::{Path, PathBuf};

use flatscan_core::AssembledDocument;
use flatscan_core::error::FlatscanError;
use flatscan_document::{ImageProcessor, Page};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Write `bytes` to `dir/file_name` atomically.
fn write_atomic(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf, FlatscanError> {
    std::fs::create_dir_all(dir)?;
    let target = dir.join(file_name);

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(&target).map_err(|err| err.error)?;

    debug!(path = %target.display(), bytes = bytes.len(), "File persisted");
    Ok(target)
}

/// Store a finished batch in `dir` and return the PDF's path.
///
/// Each of `pages` is saved as `<stem>_page_NNN.png`, numbered from 1, before
/// the PDF is written, so a visible PDF always comes with all of its pages.
/// If any write fails, every file this call already persisted is removed.
pub fn store_batch(
    dir: &Path,
    document: &AssembledDocument,
    pages: &[Page],
) -> Result<PathBuf, FlatscanError> {
    let mut written = Vec::with_capacity(pages.len());
    match write_batch(dir, document, pages, &mut written) {
        Ok(path) => Ok(path),
        Err(err) => {
            for path in &written {
                if let Err(remove_err) = std::fs::remove_file(path) {
                    warn!(path = %path.display(), error = %remove_err, "Could not remove partial output");
                }
            }
            warn!(removed = written.len(), "Batch output rolled back");
            Err(err)
        }
    }
}

fn write_batch(
    dir: &Path,
    document: &AssembledDocument,
    pages: &[Page],
    written: &mut Vec<PathBuf>,
) -> Result<PathBuf, FlatscanError> {
    let stem = document.file_name.stem();
    for (index, page) in pages.iter().enumerate() {
        let png = ImageProcessor::from_rgb(page.image().clone()).to_png_bytes()?;
        let name = format!("{stem}_page_{:03}.png", index + 1);
        written.push(write_atomic(dir, &name, &png)?);
    }
    if !pages.is_empty() {
        info!(count = pages.len(), dir = %dir.display(), "Page images saved");
    }

    let path = write_atomic(dir, document.file_name.as_str(), &document.bytes)?;
    info!(path = %path.display(), pages = document.page_count, "Document saved");
    Ok(path)
}
