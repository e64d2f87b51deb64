//! Pipeline stages for exporting PDF pages as text and PNG files.
//!
//! Each submodule implements exactly one step so it can be tested on its own
//! and the PDF or OCR backend can be swapped without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ document ──▶ render ──▶ extract ──▶ ocr? ──▶ encode ──▶ write
//! (exists)   (open)      (raster)   (native)   (short)   (PNG)     (page_n.*)
//! ```
//!
//! 1. [`input`]    — check the parent directory and the file exist
//! 2. [`document`] — the `DocumentBackend` / `Document` / `Page` seam
//! 3. [`render`]   — the pdfium implementation of that seam
//! 4. [`extract`]  — native text with the sufficiency test
//! 5. [`ocr`]      — recognition fallback through an `OcrEngine`
//! 6. [`encode`]   — `DynamicImage` → PNG bytes
//! 7. [`write`]    — output folder and per-page artifacts

pub mod document;
pub mod encode;
pub mod extract;
pub mod input;
pub mod ocr;
pub mod render;
pub mod write;
