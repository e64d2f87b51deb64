//! Output folder and per-page artifacts.
//!
//! Layout: `<root>/<document-basename>/page_<n>.png` and `page_<n>.txt`.
//! Reruns reuse the folder and overwrite the numbered files in place.

use crate::error::{ConvertError, PageError};
use crate::pipeline::encode::encode_png;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::thread::sleep;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How often and how patiently to retry a failed artifact write.
#[derive(Debug, Clone, Copy)]
pub struct WritePolicy {
    pub retries: u32,
    pub backoff_ms: u64,
}

impl Default for WritePolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            backoff_ms: 50,
        }
    }
}

/// Create (or reuse) the folder named after `document`'s file stem under `root`.
pub fn ensure_output_folder(root: &Path, document: &Path) -> Result<PathBuf, ConvertError> {
    let stem = document
        .file_stem()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ConvertError::FileNotFound {
            path: document.to_path_buf(),
        })?;
    let dir = root.join(stem);

    std::fs::create_dir_all(&dir).map_err(|source| ConvertError::OutputDir {
        path: dir.clone(),
        source,
    })?;

    info!("Output folder: {}", dir.display());
    Ok(dir)
}

pub fn image_path(dir: &Path, page_num: usize) -> PathBuf {
    dir.join(format!("page_{page_num}.png"))
}

pub fn text_path(dir: &Path, page_num: usize) -> PathBuf {
    dir.join(format!("page_{page_num}.txt"))
}

/// Encode `raster` as PNG and write `page_<n>.png`.
pub fn write_image(
    dir: &Path,
    page_num: usize,
    raster: &DynamicImage,
    policy: WritePolicy,
) -> Result<PathBuf, PageError> {
    let path = image_path(dir, page_num);
    let bytes = encode_png(raster).map_err(|e| PageError::WriteImage {
        page: page_num,
        path: path.clone(),
        detail: format!("PNG encoding failed: {e}"),
    })?;

    write_with_retry(&path, &bytes, policy).map_err(|e| PageError::WriteImage {
        page: page_num,
        path: path.clone(),
        detail: e.to_string(),
    })?;

    info!("Page {} image saved in file '{}'.", page_num, path.display());
    Ok(path)
}

/// Write `text` as UTF-8 to `page_<n>.txt`; empty text gives an empty file.
pub fn write_text(
    dir: &Path,
    page_num: usize,
    text: &str,
    policy: WritePolicy,
) -> Result<PathBuf, PageError> {
    let path = text_path(dir, page_num);
    write_with_retry(&path, text.as_bytes(), policy).map_err(|e| PageError::WriteText {
        page: page_num,
        path: path.clone(),
        detail: e.to_string(),
    })?;

    info!("Page {} text saved in file '{}'.", page_num, path.display());
    Ok(path)
}

/// Write `bytes` to `path`, retrying transient failures with exponential backoff.
fn write_with_retry(path: &Path, bytes: &[u8], policy: WritePolicy) -> std::io::Result<()> {
    let mut attempt = 0;
    loop {
        match std::fs::write(path, bytes) {
            Ok(()) => return Ok(()),
            Err(e) if attempt < policy.retries && is_transient(&e) => {
                attempt += 1;
                let backoff = backoff_delay_ms(policy.backoff_ms, attempt);
                warn!(
                    "Write to '{}' failed ({}); retry {}/{} after {}ms",
                    path.display(),
                    e,
                    attempt,
                    policy.retries,
                    backoff
                );
                sleep(Duration::from_millis(backoff));
            }
            Err(e) => {
                debug!("Write to '{}' failed permanently: {}", path.display(), e);
                return Err(e);
            }
        }
    }
}

/// Longest single wait between write attempts.
pub const MAX_BACKOFF_MS: u64 = 30_000;

/// `base_ms * 2^(attempt - 1)`, saturating at [`MAX_BACKOFF_MS`].
fn backoff_delay_ms(base_ms: u64, attempt: u32) -> u64 {
    2u64.checked_pow(attempt.saturating_sub(1))
        .map_or(u64::MAX, |factor| base_ms.saturating_mul(factor))
        .min(MAX_BACKOFF_MS)
}

/// Errors a retry can plausibly fix; a missing folder or a denied path cannot.
fn is_transient(e: &std::io::Error) -> bool {
    use std::io::ErrorKind::*;
    matches!(e.kind(), Interrupted | WouldBlock | TimedOut | ResourceBusy)
}
