//! The document seam: open a PDF, count its pages, hand out pages.
//!
//! The orchestrator only talks to these traits. [`crate::pipeline::render`]
//! implements them on top of pdfium; tests implement them in memory to
//! simulate corrupt pages and failing renders.
//!
//! A document is scoped: [`DocumentBackend::with_document`] opens it, lends
//! it to a visitor on the calling thread, and closes it when the visitor
//! returns. Nothing borrowed from a document can outlive that call.
//!
//! Per-page operations return plain `String` details. The orchestrator knows
//! the page number and wraps them into [`crate::error::PageError`].

use crate::error::ConvertError;
use crate::output::DocumentMetadata;
use image::DynamicImage;
use std::path::Path;

/// Visitor handed an opened document. Returning `Err` aborts the run after
/// the document has been closed.
pub type DocumentVisitor<'v> = dyn FnMut(&dyn Document) -> Result<(), ConvertError> + 'v;

/// Opens documents. Shared across threads; documents themselves are not.
pub trait DocumentBackend: Send + Sync {
    /// Open `path`, run `visit` on it, then close it.
    ///
    /// Open failures are returned as open-class [`ConvertError`]s without
    /// calling `visit`. A failure to close is logged, never returned.
    fn with_document(
        &self,
        path: &Path,
        password: Option<&str>,
        visit: &mut DocumentVisitor<'_>,
    ) -> Result<(), ConvertError>;
}

/// An opened document, exclusively owned by the thread that opened it.
pub trait Document {
    fn page_count(&self) -> usize;

    fn metadata(&self) -> DocumentMetadata;

    /// Load the page at 0-based `index`.
    fn load_page<'p>(&'p self, index: usize) -> Result<Box<dyn Page + 'p>, String>;
}

/// One loaded page.
pub trait Page {
    /// The page's embedded text.
    fn extract_text(&self) -> Result<String, String>;

    /// Rasterise the page, scaling both axes by `zoom`.
    fn render(&self, zoom: f32) -> Result<DynamicImage, String>;
}
