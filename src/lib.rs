//! # pdf2text
//!
//! Export every page of a PDF as a PNG image plus a UTF-8 text file, with
//! OCR fallback for pages that carry little or no embedded text.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input    check the parent folder and the file exist
//!  ├─ 2. Open     bind pdfium, open the document, create <basename>/
//!  ├─ 3. Render   rasterise each page at `zoom` (default 2.0)
//!  ├─ 4. Extract  native text; < 30 trimmed chars counts as insufficient
//!  ├─ 5. OCR      tesseract -l fas+ara+eng on the raster, only when needed
//!  └─ 6. Write    page_<n>.png and page_<n>.txt, overwriting on rerun
//! ```
//!
//! A page that fails to load or render is skipped and reported; the rest of
//! the document is still exported. Only missing input, an unopenable
//! document, or an output folder that cannot be created abort the run.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2text::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder()
//!         .output_root("exports")
//!         .build()?;
//!     let report = convert("scans/report.pdf", &config).await?;
//!     eprintln!(
//!         "{} pages written to {}, {} via OCR",
//!         report.stats.processed_pages,
//!         report.output_dir.display(),
//!         report.stats.ocr_pages
//!     );
//!     for failure in report.failures() {
//!         eprintln!("  {failure}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2text` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf2text = { version = "0.1", default-features = false }
//! ```
//!
//! ## Runtime requirements
//!
//! * a pdfium shared library on the system library path, in
//!   `PDFIUM_LIB_PATH`, or given via [`ConversionConfig::pdfium_library`];
//! * the `tesseract` executable with the `fas`, `ara` and `eng` traineddata,
//!   unless OCR is disabled or a custom [`OcrEngine`] is injected.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, OcrLanguages, PageSelection};
pub use convert::{convert, convert_sync, inspect};
pub use error::{ConvertError, PageError};
pub use output::{ConversionReport, ConversionStats, DocumentMetadata, PageOutcome, TextSource};
pub use pipeline::document::{Document, DocumentBackend, DocumentVisitor, Page};
pub use pipeline::ocr::{OcrEngine, OcrError, TesseractOcr};
pub use pipeline::render::PdfiumBackend;
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
