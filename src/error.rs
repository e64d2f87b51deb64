//! Error types for the pdf2text library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ConvertError`] — **Fatal**: the run cannot proceed at all (missing
//!   input, unreadable PDF, output folder cannot be created). Returned as
//!   `Err(ConvertError)` from the top-level `convert*` functions before or
//!   instead of producing any page output.
//!
//! * [`PageError`] — **Non-fatal**: a single page failed to load, render, or
//!   be written, but every other page is still processed. Stored inside
//!   [`crate::output::PageOutcome`] so the caller gets partial output for a
//!   partially corrupt document.
//!
//! Native text extraction and OCR failures are neither: they degrade to an
//! empty string and are kept as warnings on the page outcome.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2text library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The directory that should contain the input file does not exist.
    #[error("The folder '{path}' does not exist.")]
    DirectoryNotFound { path: PathBuf },

    /// The input file does not exist (or is not a regular file).
    #[error("The file '{path}' does not exist.")]
    FileNotFound { path: PathBuf },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// The document could not be parsed or opened.
    #[error("Error opening PDF file '{path}': {detail}")]
    Open { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// The page selection does not match any page of the document.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    // ── Output errors ─────────────────────────────────────────────────────
    /// The per-document output folder could not be created.
    #[error("Error creating output folder '{path}': {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
You can:\n\
  • Install pdfium so it is found on the system library path.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium (or pass --pdfium-lib).\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    /// `true` for the missing-input class (directory or file).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ConvertError::DirectoryNotFound { .. } | ConvertError::FileNotFound { .. }
        )
    }

    /// `true` when the document itself could not be opened.
    pub fn is_open_failure(&self) -> bool {
        matches!(
            self,
            ConvertError::Open { .. }
                | ConvertError::PasswordRequired { .. }
                | ConvertError::WrongPassword { .. }
        )
    }
}

/// A non-fatal error for a single page.
///
/// `Load` and `Render` mean the page produced no artifacts at all; the write
/// variants mean one of the two artifacts is missing.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageError {
    /// The page could not be loaded from the document.
    #[error("Error loading page {page}: {detail}")]
    Load { page: usize, detail: String },

    /// Page rasterisation failed.
    #[error("Error rendering page {page}: {detail}")]
    Render { page: usize, detail: String },

    /// The PNG artifact could not be encoded or written.
    #[error("Error saving image for page {page} to '{path}': {detail}")]
    WriteImage {
        page: usize,
        path: PathBuf,
        detail: String,
    },

    /// The text artifact could not be written.
    #[error("Error saving text for page {page} to '{path}': {detail}")]
    WriteText {
        page: usize,
        path: PathBuf,
        detail: String,
    },

    /// The worker finishing the page died before reporting.
    #[error("Internal error on page {page}: {detail}")]
    Internal { page: usize, detail: String },
}

impl PageError {
    /// 1-indexed page number this error belongs to.
    pub fn page(&self) -> usize {
        match self {
            PageError::Load { page, .. }
            | PageError::Render { page, .. }
            | PageError::WriteImage { page, .. }
            | PageError::WriteText { page, .. }
            | PageError::Internal { page, .. } => *page,
        }
    }

    /// `true` when the error stopped the page before any artifact was written.
    pub fn skips_page(&self) -> bool {
        matches!(self, PageError::Load { .. } | PageError::Render { .. })
    }
}
