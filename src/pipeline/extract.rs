//! Native text extraction and the sufficiency test that gates OCR.

use crate::pipeline::document::Page;
use tracing::warn;

/// Native text of a page.
///
/// Extraction failures never propagate: they are logged and yield an empty
/// string together with the failure detail, so the caller can still fall
/// back to OCR and keep a warning on the page outcome.
pub fn extract_native_text(page: &dyn Page, page_num: usize) -> (String, Option<String>) {
    match page.extract_text() {
        Ok(text) => (text, None),
        Err(e) => {
            warn!("Error extracting text from page {}: {}", page_num, e);
            (String::new(), Some(format!("native text extraction failed: {e}")))
        }
    }
}

/// Character count of `text` after trimming surrounding whitespace.
pub fn trimmed_len(text: &str) -> usize {
    text.trim().chars().count()
}

/// `true` when the text is long enough to skip OCR.
pub fn is_sufficient(text: &str, threshold: usize) -> bool {
    trimmed_len(text) >= threshold
}
