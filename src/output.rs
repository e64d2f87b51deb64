//! Result types returned by a conversion run.

use crate::error::{ConvertError, PageError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where a page's final text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    /// Text embedded in the PDF was long enough to keep.
    Native,
    /// Native text was insufficient; the OCR result (possibly empty) was used.
    Ocr,
}

/// Outcome of one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageOutcome {
    /// 1-indexed page number.
    pub page_num: usize,
    /// `page_<n>.png`, when it was written.
    pub image_path: Option<PathBuf>,
    /// `page_<n>.txt`, when it was written.
    pub text_path: Option<PathBuf>,
    /// Origin of the text; None when the page never got that far.
    pub text_source: Option<TextSource>,
    /// Character count of the resolved text.
    pub text_chars: usize,
    /// Non-fatal errors, in the order they happened.
    pub errors: Vec<PageError>,
    /// Recovered failures (native extraction, OCR) that degraded to empty text.
    pub warnings: Vec<String>,
    /// Wall-clock time spent on this page across both stages.
    pub duration_ms: u64,
}

impl PageOutcome {
    pub(crate) fn new(page_num: usize) -> Self {
        Self {
            page_num,
            image_path: None,
            text_path: None,
            text_source: None,
            text_chars: 0,
            errors: Vec::new(),
            warnings: Vec::new(),
            duration_ms: 0,
        }
    }

    /// A page that stopped at load or render time.
    pub(crate) fn skipped(error: PageError) -> Self {
        let mut outcome = Self::new(error.page());
        outcome.errors.push(error);
        outcome
    }

    /// Both artifacts written with no error.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty() && self.image_path.is_some() && self.text_path.is_some()
    }
}

/// Document metadata as reported by the PDF backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}

/// Aggregate counters for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Pages in the document.
    pub total_pages: usize,
    /// Pages selected for this run.
    pub selected_pages: usize,
    /// Pages with both artifacts and no error.
    pub processed_pages: usize,
    /// Pages with at least one error.
    pub failed_pages: usize,
    /// Pages whose text came from OCR.
    pub ocr_pages: usize,
    pub total_duration_ms: u64,
}

/// Everything a run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionReport {
    /// The input document.
    pub source: PathBuf,
    /// `<output-root>/<document-basename>/`.
    pub output_dir: PathBuf,
    /// One entry per selected page, sorted by page number.
    pub pages: Vec<PageOutcome>,
    pub stats: ConversionStats,
}

impl ConversionReport {
    /// All per-page errors, ordered by page.
    pub fn failures(&self) -> impl Iterator<Item = &PageError> {
        self.pages.iter().flat_map(|p| p.errors.iter())
    }

    /// `true` when every selected page produced both artifacts.
    pub fn is_complete(&self) -> bool {
        self.stats.failed_pages == 0
    }

    /// Treat any page failure as an error.
    pub fn into_result(self) -> Result<Self, ConvertError> {
        if self.is_complete() {
            Ok(self)
        } else {
            let failed = self.stats.failed_pages;
            let total = self.stats.selected_pages;
            Err(ConvertError::Internal(format!(
                "{failed}/{total} pages failed during conversion"
            )))
        }
    }
}
