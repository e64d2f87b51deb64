//! Conversion entry points and the per-run orchestrator.
//!
//! ## Pipeline shape
//!
//! ```text
//!  spawn_blocking (owns the document)          async consumer
//!  ───────────────────────────────────        ─────────────────────────────
//!  open ─ select pages ─ output folder ──────▶ Started
//!  for each page:                              buffer_unordered(concurrency):
//!    load → render → extract native  ──mpsc──▶   spawn_blocking:
//!                                                  write PNG
//!                                                  OCR if native text is short
//!                                                  write TXT
//!  close
//! ```
//!
//! The document never leaves the blocking task that opened it, so no two
//! operations touch it concurrently. Only owned rasters and strings cross the
//! channel, and artifacts of distinct pages have disjoint names, so the
//! finishing stage can run pages in parallel without coordination.

use crate::config::{ConversionConfig, OcrLanguages, PageSelection};
use crate::error::{ConvertError, PageError};
use crate::output::{ConversionReport, ConversionStats, DocumentMetadata, PageOutcome, TextSource};
use crate::pipeline::document::{Document, DocumentBackend};
use crate::pipeline::ocr::{self, OcrEngine, TesseractOcr};
use crate::pipeline::render::PdfiumBackend;
use crate::pipeline::write::{self, WritePolicy};
use crate::pipeline::{extract, input};
use crate::progress::ProgressCallback;
use futures::stream::StreamExt;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, info, warn};

/// Convert every selected page of `input` into `page_<n>.png` and
/// `page_<n>.txt` under `<output_root>/<document-basename>/`.
///
/// # Returns
/// `Ok(ConversionReport)` whenever the document was opened and the output
/// folder exists, even if some pages failed (check
/// `report.stats.failed_pages` or [`ConversionReport::failures`]).
///
/// # Errors
/// Returns `Err(ConvertError)` only for fatal errors, all of them raised
/// before any artifact is written:
/// - parent directory or file missing
/// - the document cannot be opened (corrupt, encrypted)
/// - an explicit page selection matches no page
/// - the output folder cannot be created
pub async fn convert(
    input: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionReport, ConvertError> {
    let total_start = Instant::now();
    let pdf_path = input::resolve_input(input)?;
    info!("Starting conversion: {}", pdf_path.display());

    let backend = resolve_backend(config);
    let ocr_engine = resolve_ocr(config);
    let concurrency = config.concurrency.max(1);

    let (started_tx, started_rx) = oneshot::channel::<Started>();
    let (page_tx, page_rx) = mpsc::channel::<Result<RasterizedPage, PageError>>(concurrency);

    let job = RenderJob {
        backend,
        pdf_path: pdf_path.clone(),
        password: config.password.clone(),
        pages: config.pages.clone(),
        output_root: config.output_root(),
        zoom: config.zoom,
    };
    let producer = tokio::task::spawn_blocking(move || job.run(started_tx, page_tx));

    // Fatal errors all happen before `Started` is sent.
    let started = match started_rx.await {
        Ok(started) => started,
        Err(_) => {
            join_producer(producer).await?;
            return Err(ConvertError::Internal(
                "document was closed before conversion started".into(),
            ));
        }
    };

    info!(
        "Converting {} of {} pages into '{}'",
        started.selected,
        started.total_pages,
        started.output_dir.display()
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(started.selected);
    }

    let ctx = Arc::new(FinishContext {
        output_dir: started.output_dir.clone(),
        ocr: ocr_engine,
        languages: config.ocr_languages.clone(),
        threshold: config.sufficiency_threshold,
        policy: WritePolicy {
            retries: config.write_retries,
            backoff_ms: config.retry_backoff_ms,
        },
        progress: config.progress_callback.clone(),
        selected: started.selected,
    });

    let mut pages: Vec<PageOutcome> = ReceiverStream::new(page_rx)
        .map(|item| finish_page(item, Arc::clone(&ctx)))
        .buffer_unordered(concurrency)
        .collect()
        .await;

    // Every page has been handed over; wait for the document to be closed.
    join_producer(producer).await?;

    pages.sort_by_key(|p| p.page_num);

    let stats = ConversionStats {
        total_pages: started.total_pages,
        selected_pages: started.selected,
        processed_pages: pages.iter().filter(|p| p.is_success()).count(),
        failed_pages: pages.iter().filter(|p| !p.errors.is_empty()).count(),
        ocr_pages: pages
            .iter()
            .filter(|p| p.text_source == Some(TextSource::Ocr))
            .count(),
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: {}/{} pages, {} via OCR, {}ms total",
        stats.processed_pages, stats.selected_pages, stats.ocr_pages, stats.total_duration_ms
    );
    if stats.failed_pages > 0 {
        warn!("{} page(s) failed", stats.failed_pages);
    }

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(started.selected, stats.processed_pages);
    }

    Ok(ConversionReport {
        source: pdf_path,
        output_dir: started.output_dir,
        pages,
        stats,
    })
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionReport, ConvertError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ConvertError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(input, config))
}

/// Read document metadata without rendering or writing anything.
///
/// Uses the same backend and password as [`convert`] would.
pub async fn inspect(
    input: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<DocumentMetadata, ConvertError> {
    let pdf_path = input::resolve_input(input)?;
    let backend = resolve_backend(config);
    let password = config.password.clone();

    tokio::task::spawn_blocking(move || {
        let mut metadata = None;
        backend.with_document(&pdf_path, password.as_deref(), &mut |doc| {
            metadata = Some(doc.metadata());
            Ok(())
        })?;
        metadata.ok_or_else(|| ConvertError::Internal("document was never visited".into()))
    })
    .await
    .map_err(|e| ConvertError::Internal(format!("Metadata task panicked: {}", e)))?
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Pre-built backend first, then pdfium with the configured library.
fn resolve_backend(config: &ConversionConfig) -> Arc<dyn DocumentBackend> {
    match config.backend {
        Some(ref backend) => Arc::clone(backend),
        None => Arc::new(PdfiumBackend::new(config.pdfium_library.clone())),
    }
}

/// Pre-built engine first; `None` when OCR is disabled; else Tesseract.
fn resolve_ocr(config: &ConversionConfig) -> Option<Arc<dyn OcrEngine>> {
    if let Some(ref engine) = config.ocr_engine {
        return Some(Arc::clone(engine));
    }
    if config.disable_ocr {
        debug!("OCR disabled; short native text is written as-is");
        return None;
    }
    Some(Arc::new(TesseractOcr::new(
        config.tesseract_cmd.clone(),
        config.tessdata_dir.clone(),
    )))
}

async fn join_producer(
    handle: tokio::task::JoinHandle<Result<(), ConvertError>>,
) -> Result<(), ConvertError> {
    handle
        .await
        .map_err(|e| ConvertError::Internal(format!("Render task panicked: {}", e)))?
}

/// Sent once the document is open and the output folder exists.
struct Started {
    output_dir: PathBuf,
    total_pages: usize,
    selected: usize,
}

/// A page that was loaded and rendered, ready to be finished off-thread.
struct RasterizedPage {
    page_num: usize,
    image: DynamicImage,
    native_text: String,
    warnings: Vec<String>,
    render_ms: u64,
}

/// Everything the blocking producer needs, owned.
struct RenderJob {
    backend: Arc<dyn DocumentBackend>,
    pdf_path: PathBuf,
    password: Option<String>,
    pages: PageSelection,
    output_root: PathBuf,
    zoom: f32,
}

impl RenderJob {
    fn run(
        self,
        started_tx: oneshot::Sender<Started>,
        page_tx: mpsc::Sender<Result<RasterizedPage, PageError>>,
    ) -> Result<(), ConvertError> {
        let mut started_tx = Some(started_tx);

        self.backend
            .with_document(&self.pdf_path, self.password.as_deref(), &mut |doc| {
                let total_pages = doc.page_count();
                let indices = self.pages.to_indices(total_pages);
                // An empty document still gets its (empty) folder.
                if indices.is_empty() && self.pages != PageSelection::All {
                    return Err(ConvertError::PageOutOfRange {
                        page: self.pages.first_requested(),
                        total: total_pages,
                    });
                }

                let output_dir = write::ensure_output_folder(&self.output_root, &self.pdf_path)?;

                if let Some(tx) = started_tx.take() {
                    let started = Started {
                        output_dir,
                        total_pages,
                        selected: indices.len(),
                    };
                    if tx.send(started).is_err() {
                        warn!("Conversion was abandoned before the first page");
                        return Ok(());
                    }
                }

                for index in indices {
                    let item = rasterize_page(doc, index, self.zoom);
                    if page_tx.blocking_send(item).is_err() {
                        warn!("Page consumer went away; stopping after page {}", index + 1);
                        break;
                    }
                }
                Ok(())
            })
    }
}

/// Load, render, and extract one page on the document's thread.
fn rasterize_page(
    doc: &dyn Document,
    index: usize,
    zoom: f32,
) -> Result<RasterizedPage, PageError> {
    let page_num = index + 1;
    let start = Instant::now();

    let page = doc.load_page(index).map_err(|detail| {
        error!("Error loading page {}: {}", page_num, detail);
        PageError::Load {
            page: page_num,
            detail,
        }
    })?;

    let image = page.render(zoom).map_err(|detail| {
        error!("Error rendering page {}: {}", page_num, detail);
        PageError::Render {
            page: page_num,
            detail,
        }
    })?;

    let (native_text, warning) = extract::extract_native_text(&*page, page_num);
    debug!(
        "Page {}: rendered {}x{}, {} native chars",
        page_num,
        image.width(),
        image.height(),
        extract::trimmed_len(&native_text)
    );

    Ok(RasterizedPage {
        page_num,
        image,
        native_text,
        warnings: warning.into_iter().collect(),
        render_ms: start.elapsed().as_millis() as u64,
    })
}

/// Shared state for the finishing stage.
struct FinishContext {
    output_dir: PathBuf,
    ocr: Option<Arc<dyn OcrEngine>>,
    languages: OcrLanguages,
    threshold: usize,
    policy: WritePolicy,
    progress: Option<ProgressCallback>,
    selected: usize,
}

/// Write a page's artifacts off the async runtime and report progress.
async fn finish_page(
    item: Result<RasterizedPage, PageError>,
    ctx: Arc<FinishContext>,
) -> PageOutcome {
    let outcome = match item {
        Err(e) => PageOutcome::skipped(e),
        Ok(page) => {
            let page_num = page.page_num;
            if let Some(ref cb) = ctx.progress {
                cb.on_page_start(page_num, ctx.selected);
            }
            let worker_ctx = Arc::clone(&ctx);
            tokio::task::spawn_blocking(move || finish_blocking(page, &worker_ctx))
                .await
                .unwrap_or_else(|e| {
                    error!("Worker for page {} panicked: {}", page_num, e);
                    PageOutcome::skipped(PageError::Internal {
                        page: page_num,
                        detail: e.to_string(),
                    })
                })
        }
    };

    if let Some(ref cb) = ctx.progress {
        match (outcome.errors.first(), outcome.text_source) {
            (Some(e), _) => cb.on_page_error(outcome.page_num, ctx.selected, &e.to_string()),
            (None, Some(source)) => {
                cb.on_page_complete(outcome.page_num, ctx.selected, outcome.text_chars, source)
            }
            (None, None) => {}
        }
    }
    outcome
}

/// Image first, then resolve the text (native or OCR), then write it.
///
/// A failed image write does not stop the text from being written.
fn finish_blocking(page: RasterizedPage, ctx: &FinishContext) -> PageOutcome {
    let start = Instant::now();
    let page_num = page.page_num;
    let mut outcome = PageOutcome::new(page_num);
    outcome.warnings = page.warnings;

    match write::write_image(&ctx.output_dir, page_num, &page.image, ctx.policy) {
        Ok(path) => outcome.image_path = Some(path),
        Err(e) => {
            error!("{}", e);
            outcome.errors.push(e);
        }
    }

    let (text, source) = if extract::is_sufficient(&page.native_text, ctx.threshold) {
        (page.native_text, TextSource::Native)
    } else if let Some(ref engine) = ctx.ocr {
        info!(
            "Page {} has insufficient native text ({} chars), falling back to OCR",
            page_num,
            extract::trimmed_len(&page.native_text)
        );
        let (text, warning) =
            ocr::recognize_or_empty(engine.as_ref(), &page.image, &ctx.languages, page_num);
        outcome.warnings.extend(warning);
        (text, TextSource::Ocr)
    } else {
        (page.native_text, TextSource::Native)
    };

    outcome.text_chars = text.chars().count();
    outcome.text_source = Some(source);

    match write::write_text(&ctx.output_dir, page_num, &text, ctx.policy) {
        Ok(path) => outcome.text_path = Some(path),
        Err(e) => {
            error!("{}", e);
            outcome.errors.push(e);
        }
    }

    outcome.duration_ms = page.render_ms + start.elapsed().as_millis() as u64;
    outcome
}
