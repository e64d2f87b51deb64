//! Input resolution: make sure the PDF and its folder exist before any I/O.
//!
//! Only `stat` calls happen here. The folder is checked first so that a typo
//! in a directory name is reported as such rather than as a missing file.

use crate::error::ConvertError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate `input` and return it as an owned path.
///
/// A bare file name (`report.pdf`) is resolved against the current directory.
pub fn resolve_input(input: impl AsRef<Path>) -> Result<PathBuf, ConvertError> {
    let path = input.as_ref();
    let folder = parent_dir(path);

    if !folder.is_dir() {
        return Err(ConvertError::DirectoryNotFound {
            path: folder.to_path_buf(),
        });
    }

    if !path.is_file() {
        return Err(ConvertError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path.to_path_buf())
}

/// The directory containing `path`; `.` when the path has no directory part.
fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}
