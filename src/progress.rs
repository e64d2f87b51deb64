//! Progress-callback trait for per-page conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the pipeline finishes each page. The CLI uses this to drive its
//! progress bar; library users can forward events anywhere.
//!
//! # Example
//!
//! ```rust
//! use pdf2text::{ConversionProgressCallback, ConversionConfig, TextSource};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, page_num: usize, total_pages: usize, text_chars: usize, source: TextSource) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Page {}/{} done ({} chars, {:?})", page_num, total_pages, text_chars, source);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { completed: AtomicUsize::new(0) });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::output::TextSource;
use std::sync::Arc;

/// Called by the pipeline as it processes each page.
///
/// With `concurrency > 1`, `on_page_complete` and `on_page_error` may be
/// called from different threads and out of page order. All methods have
/// default no-op implementations.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once after the document is opened and the output folder exists.
    ///
    /// # Arguments
    /// * `total_pages` — number of pages that will be processed
    fn on_conversion_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called when a page has been rendered and is handed to OCR/writing.
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when both artifacts of a page were written.
    ///
    /// # Arguments
    /// * `page_num`   — 1-indexed page number
    /// * `total_pages` — pages selected for this run
    /// * `text_chars` — character count of the written text
    /// * `source`     — whether the text came from the PDF or from OCR
    fn on_page_complete(
        &self,
        page_num: usize,
        total_pages: usize,
        text_chars: usize,
        source: TextSource,
    ) {
        let _ = (page_num, total_pages, text_chars, source);
    }

    /// Called once per page that ended with at least one error.
    ///
    /// `error` is the first error recorded for the page.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// Called once after all pages have been attempted and the document is closed.
    fn on_conversion_complete(&self, total_pages: usize, success_count: usize) {
        let _ = (total_pages, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
