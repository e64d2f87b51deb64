//! Pipeline integration tests against an in-memory document backend.
//!
//! `FakeBackend` stands in for pdfium and `FakeOcr` for Tesseract, so these
//! run everywhere without native libraries. Pages can be told to fail at
//! load or render time to exercise per-page isolation.

use image::{DynamicImage, Rgb, RgbImage};
use pdf2text::{
    convert, inspect, ConversionConfig, ConversionProgressCallback, ConvertError, Document,
    DocumentBackend, DocumentMetadata, DocumentVisitor, OcrEngine, OcrError, OcrLanguages, Page,
    PageError, PageSelection, TextSource,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ── Fakes ────────────────────────────────────────────────────────────────────

#[derive(Clone)]
struct FakePageSpec {
    text: Result<String, String>,
    load_fails: bool,
    render_fails: bool,
}

impl FakePageSpec {
    fn text(s: &str) -> Self {
        Self {
            text: Ok(s.to_string()),
            load_fails: false,
            render_fails: false,
        }
    }

    fn render_fails(mut self) -> Self {
        self.render_fails = true;
        self
    }

    fn load_fails(mut self) -> Self {
        self.load_fails = true;
        self
    }

    fn extraction_fails() -> Self {
        Self {
            text: Err("text layer unreadable".into()),
            load_fails: false,
            render_fails: false,
        }
    }
}

#[derive(Default)]
struct FakeBackend {
    pages: Vec<FakePageSpec>,
    open_error: Option<String>,
    opens: AtomicUsize,
    closes: AtomicUsize,
}

impl FakeBackend {
    fn with_pages(pages: Vec<FakePageSpec>) -> Arc<Self> {
        Arc::new(Self {
            pages,
            ..Default::default()
        })
    }

    fn unopenable(detail: &str) -> Arc<Self> {
        Arc::new(Self {
            open_error: Some(detail.to_string()),
            ..Default::default()
        })
    }
}

impl DocumentBackend for FakeBackend {
    fn with_document(
        &self,
        path: &Path,
        _password: Option<&str>,
        visit: &mut DocumentVisitor<'_>,
    ) -> Result<(), ConvertError> {
        if let Some(ref detail) = self.open_error {
            return Err(ConvertError::Open {
                path: path.to_path_buf(),
                detail: detail.clone(),
            });
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        let doc = FakeDocument { pages: &self.pages };
        let result = visit(&doc);
        self.closes.fetch_add(1, Ordering::SeqCst);
        result
    }
}

struct FakeDocument<'a> {
    pages: &'a [FakePageSpec],
}

impl Document for FakeDocument<'_> {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn metadata(&self) -> DocumentMetadata {
        DocumentMetadata {
            title: Some("Quarterly report".into()),
            page_count: self.pages.len(),
            pdf_version: "Pdf17".into(),
            ..Default::default()
        }
    }

    fn load_page<'p>(&'p self, index: usize) -> Result<Box<dyn Page + 'p>, String> {
        let spec = self
            .pages
            .get(index)
            .ok_or_else(|| format!("no page at index {index}"))?;
        if spec.load_fails {
            return Err("corrupt page object".into());
        }
        Ok(Box::new(FakePage { spec }))
    }
}

struct FakePage<'a> {
    spec: &'a FakePageSpec,
}

impl Page for FakePage<'_> {
    fn extract_text(&self) -> Result<String, String> {
        self.spec.text.clone()
    }

    fn render(&self, zoom: f32) -> Result<DynamicImage, String> {
        if self.spec.render_fails {
            return Err("simulated render failure".into());
        }
        let (w, h) = ((10.0 * zoom) as u32, (14.0 * zoom) as u32);
        Ok(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            w,
            h,
            Rgb([250, 250, 250]),
        )))
    }
}

#[derive(Default)]
struct FakeOcr {
    text: String,
    failure: Option<String>,
    calls: AtomicUsize,
    languages: Mutex<Vec<String>>,
}

impl FakeOcr {
    fn returning(text: &str) -> Arc<Self> {
        Arc::new(Self {
            text: text.to_string(),
            ..Default::default()
        })
    }

    fn failing(detail: &str) -> Arc<Self> {
        Arc::new(Self {
            failure: Some(detail.to_string()),
            ..Default::default()
        })
    }
}

impl OcrEngine for FakeOcr {
    fn name(&self) -> &str {
        "fake"
    }

    fn recognize(&self, _image: &DynamicImage, languages: &OcrLanguages) -> Result<String, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.languages.lock() {
            seen.push(languages.to_string());
        }
        match self.failure {
            Some(ref detail) => Err(OcrError::Failed(detail.clone())),
            None => Ok(self.text.clone()),
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("pdf2text=debug")
        .with_test_writer()
        .try_init();
}

/// A workspace with an (empty) input file; the fake backend ignores content.
struct Workspace {
    _tmp: tempfile::TempDir,
    input: PathBuf,
    out: PathBuf,
}

fn workspace(file_name: &str) -> Workspace {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join(file_name);
    std::fs::write(&input, b"%PDF-1.7").unwrap();
    let out = tmp.path().join("out");
    Workspace {
        _tmp: tmp,
        input,
        out,
    }
}

fn config(
    ws: &Workspace,
    backend: Arc<FakeBackend>,
    ocr: Arc<FakeOcr>,
) -> pdf2text::ConversionConfigBuilder {
    ConversionConfig::builder()
        .output_root(&ws.out)
        .backend(backend as Arc<dyn DocumentBackend>)
        .ocr_engine(ocr as Arc<dyn OcrEngine>)
}

fn long_text(n: usize) -> String {
    format!("Page {n}: the quarterly figures are summarised in the table below.")
}

fn read(path: impl AsRef<Path>) -> String {
    std::fs::read_to_string(path).unwrap()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn every_page_gets_an_image_and_a_text_file() {
    let ws = workspace("report.pdf");
    let backend = FakeBackend::with_pages((1..=3).map(|n| FakePageSpec::text(&long_text(n))).collect());
    let ocr = FakeOcr::returning("unused");
    let cfg = config(&ws, backend.clone(), ocr.clone()).build().unwrap();

    let report = convert(&ws.input, &cfg).await.unwrap();

    let dir = ws.out.join("report");
    assert_eq!(report.output_dir, dir);
    for n in 1..=3 {
        assert!(dir.join(format!("page_{n}.png")).is_file());
        assert_eq!(read(dir.join(format!("page_{n}.txt"))), long_text(n));
    }
    assert_eq!(report.stats.total_pages, 3);
    assert_eq!(report.stats.processed_pages, 3);
    assert_eq!(report.stats.failed_pages, 0);
    assert_eq!(report.stats.ocr_pages, 0);
    assert!(report.is_complete());
    assert_eq!(ocr.calls.load(Ordering::SeqCst), 0);
    assert_eq!(backend.opens.load(Ordering::SeqCst), 1);
    assert_eq!(backend.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn report_with_one_scanned_page() {
    let ws = workspace("report.pdf");
    let native = "x".repeat(200);
    let backend = FakeBackend::with_pages(vec![
        FakePageSpec::text(&native),
        FakePageSpec::text("abcde"),
    ]);
    let cfg = config(&ws, backend, FakeOcr::returning("Hello"))
        .build()
        .unwrap();

    convert(&ws.input, &cfg).await.unwrap();

    let dir = ws.out.join("report");
    let mut names: Vec<String> = std::fs::read_dir(&dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    assert_eq!(names, ["page_1.png", "page_1.txt", "page_2.png", "page_2.txt"]);
    assert_eq!(read(dir.join("page_1.txt")).chars().count(), 200);
    assert_eq!(read(dir.join("page_2.txt")), "Hello");
}

#[tokio::test]
async fn images_are_rendered_at_the_configured_zoom() {
    let ws = workspace("zoomed.pdf");
    let backend = FakeBackend::with_pages(vec![FakePageSpec::text(&long_text(1))]);

    let cfg = config(&ws, backend.clone(), FakeOcr::returning(""))
        .build()
        .unwrap();
    convert(&ws.input, &cfg).await.unwrap();
    let img = image::open(ws.out.join("zoomed/page_1.png")).unwrap();
    assert_eq!((img.width(), img.height()), (20, 28));

    let cfg = config(&ws, backend, FakeOcr::returning(""))
        .zoom(3.0)
        .build()
        .unwrap();
    convert(&ws.input, &cfg).await.unwrap();
    let img = image::open(ws.out.join("zoomed/page_1.png")).unwrap();
    assert_eq!((img.width(), img.height()), (30, 42));
}

#[tokio::test]
async fn short_native_text_falls_back_to_ocr() {
    let ws = workspace("scan.pdf");
    let backend = FakeBackend::with_pages(vec![
        FakePageSpec::text(&format!("  {}  \n", "a".repeat(29))),
        FakePageSpec::text(&"b".repeat(30)),
    ]);
    let ocr = FakeOcr::returning("متن فارسی و عربی");
    let cfg = config(&ws, backend, ocr.clone()).build().unwrap();

    let report = convert(&ws.input, &cfg).await.unwrap();

    let dir = ws.out.join("scan");
    assert_eq!(read(dir.join("page_1.txt")), "متن فارسی و عربی");
    assert_eq!(read(dir.join("page_2.txt")), "b".repeat(30));
    assert_eq!(ocr.calls.load(Ordering::SeqCst), 1);
    assert_eq!(*ocr.languages.lock().unwrap(), vec!["fas+ara+eng".to_string()]);

    assert_eq!(report.pages[0].text_source, Some(TextSource::Ocr));
    assert_eq!(report.pages[1].text_source, Some(TextSource::Native));
    assert_eq!(report.stats.ocr_pages, 1);
}

#[tokio::test]
async fn empty_ocr_result_still_writes_an_empty_text_file() {
    let ws = workspace("blank.pdf");
    let backend = FakeBackend::with_pages(vec![FakePageSpec::text("")]);
    let cfg = config(&ws, backend, FakeOcr::returning(""))
        .build()
        .unwrap();

    let report = convert(&ws.input, &cfg).await.unwrap();

    let txt = ws.out.join("blank/page_1.txt");
    assert!(txt.is_file());
    assert_eq!(std::fs::metadata(&txt).unwrap().len(), 0);
    assert!(report.pages[0].is_success());
    assert_eq!(report.pages[0].text_chars, 0);
}

#[tokio::test]
async fn ocr_error_still_writes_an_empty_text_file() {
    let ws = workspace("scan.pdf");
    let backend = FakeBackend::with_pages(vec![FakePageSpec::text("p. 4")]);
    let ocr = FakeOcr::failing("engine crashed");
    let cfg = config(&ws, backend, ocr.clone()).build().unwrap();

    let report = convert(&ws.input, &cfg).await.unwrap();

    let dir = ws.out.join("scan");
    assert!(dir.join("page_1.png").is_file());
    assert_eq!(read(dir.join("page_1.txt")), "");
    assert_eq!(ocr.calls.load(Ordering::SeqCst), 1);

    let page = &report.pages[0];
    assert!(page.is_success());
    assert_eq!(page.text_source, Some(TextSource::Ocr));
    assert_eq!(page.text_chars, 0);
    assert_eq!(page.warnings.len(), 1);
    assert!(page.warnings[0].contains("engine crashed"), "{:?}", page.warnings);
    assert_eq!(report.stats.ocr_pages, 1);
    assert_eq!(report.stats.failed_pages, 0);
}

#[tokio::test]
async fn extraction_failure_degrades_to_ocr_with_a_warning() {
    let ws = workspace("broken-text.pdf");
    let backend = FakeBackend::with_pages(vec![FakePageSpec::extraction_fails()]);
    let ocr = FakeOcr::returning("recognised text");
    let cfg = config(&ws, backend, ocr.clone()).build().unwrap();

    let report = convert(&ws.input, &cfg).await.unwrap();

    assert_eq!(read(ws.out.join("broken-text/page_1.txt")), "recognised text");
    let page = &report.pages[0];
    assert!(page.is_success());
    assert_eq!(page.warnings.len(), 1);
    assert!(page.warnings[0].contains("text layer unreadable"));
}

#[tokio::test]
async fn render_failure_only_affects_that_page() {
    let ws = workspace("three.pdf");
    let backend = FakeBackend::with_pages(vec![
        FakePageSpec::text(&long_text(1)),
        FakePageSpec::text(&long_text(2)).render_fails(),
        FakePageSpec::text(&long_text(3)),
    ]);
    let cfg = config(&ws, backend.clone(), FakeOcr::returning(""))
        .build()
        .unwrap();

    let report = convert(&ws.input, &cfg).await.unwrap();

    let dir = ws.out.join("three");
    for n in [1, 3] {
        assert!(dir.join(format!("page_{n}.png")).is_file());
        assert_eq!(read(dir.join(format!("page_{n}.txt"))), long_text(n));
    }
    assert!(!dir.join("page_2.png").exists());
    assert!(!dir.join("page_2.txt").exists());

    let failures: Vec<&PageError> = report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert!(matches!(failures[0], PageError::Render { page: 2, .. }));
    assert_eq!(report.stats.processed_pages, 2);
    assert_eq!(report.stats.failed_pages, 1);
    assert_eq!(backend.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn load_failure_skips_the_page() {
    let ws = workspace("corrupt.pdf");
    let backend = FakeBackend::with_pages(vec![
        FakePageSpec::text(&long_text(1)).load_fails(),
        FakePageSpec::text(&long_text(2)),
    ]);
    let cfg = config(&ws, backend, FakeOcr::returning(""))
        .build()
        .unwrap();

    let report = convert(&ws.input, &cfg).await.unwrap();

    let dir = ws.out.join("corrupt");
    assert!(!dir.join("page_1.png").exists());
    assert!(dir.join("page_2.png").is_file());
    assert!(matches!(
        report.pages[0].errors.as_slice(),
        [PageError::Load { page: 1, .. }]
    ));
    assert!(report.clone().into_result().is_err());
}

#[tokio::test]
async fn image_write_failure_still_writes_the_text() {
    let ws = workspace("locked.pdf");
    // A directory in the way makes the PNG write fail without touching the txt.
    std::fs::create_dir_all(ws.out.join("locked/page_1.png")).unwrap();
    let backend = FakeBackend::with_pages(vec![
        FakePageSpec::text(&long_text(1)),
        FakePageSpec::text(&long_text(2)),
    ]);
    let ocr = FakeOcr::returning("unused");
    let cfg = config(&ws, backend, ocr.clone()).build().unwrap();

    let report = convert(&ws.input, &cfg).await.unwrap();

    let dir = ws.out.join("locked");
    assert!(dir.join("page_1.png").is_dir());
    assert_eq!(read(dir.join("page_1.txt")), long_text(1));
    assert!(dir.join("page_2.png").is_file());

    let page = &report.pages[0];
    assert!(matches!(page.errors.as_slice(), [PageError::WriteImage { page: 1, .. }]));
    assert!(page.image_path.is_none());
    assert_eq!(page.text_path.as_deref(), Some(dir.join("page_1.txt").as_path()));
    assert!(!page.is_success());
    assert!(report.pages[1].is_success());
    assert_eq!(report.stats.failed_pages, 1);
    assert_eq!(ocr.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_document_gets_an_empty_folder() {
    let ws = workspace("empty.pdf");
    let backend = FakeBackend::with_pages(vec![]);
    let cfg = config(&ws, backend.clone(), FakeOcr::returning(""))
        .build()
        .unwrap();

    let report = convert(&ws.input, &cfg).await.unwrap();

    let dir = ws.out.join("empty");
    assert_eq!(report.output_dir, dir);
    assert!(dir.is_dir());
    assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
    assert!(report.pages.is_empty());
    assert_eq!(report.stats.total_pages, 0);
    assert_eq!(report.stats.selected_pages, 0);
    assert!(report.is_complete());
    assert_eq!(backend.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn explicit_page_on_an_empty_document_is_out_of_range() {
    let ws = workspace("empty.pdf");
    let cfg = config(&ws, FakeBackend::with_pages(vec![]), FakeOcr::returning(""))
        .pages(PageSelection::Single(1))
        .build()
        .unwrap();

    let err = convert(&ws.input, &cfg).await.unwrap_err();

    assert!(
        matches!(err, ConvertError::PageOutOfRange { page: 1, total: 0 }),
        "got {err:?}"
    );
    assert!(!ws.out.exists());
}

#[tokio::test]
async fn missing_parent_directory_fails_before_any_io() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("no-such-folder").join("report.pdf");
    let backend = FakeBackend::with_pages(vec![FakePageSpec::text("x")]);
    let cfg = ConversionConfig::builder()
        .output_root(tmp.path())
        .backend(backend.clone() as Arc<dyn DocumentBackend>)
        .build()
        .unwrap();

    let err = convert(&input, &cfg).await.unwrap_err();

    assert!(matches!(err, ConvertError::DirectoryNotFound { .. }), "got {err:?}");
    assert!(err.is_not_found());
    assert_eq!(backend.opens.load(Ordering::SeqCst), 0);
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn missing_file_is_not_found() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let cfg = ConversionConfig::builder()
        .output_root(tmp.path())
        .backend(FakeBackend::with_pages(vec![]) as Arc<dyn DocumentBackend>)
        .build()
        .unwrap();

    let err = convert(tmp.path().join("absent.pdf"), &cfg).await.unwrap_err();
    assert!(matches!(err, ConvertError::FileNotFound { .. }), "got {err:?}");
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn unopenable_document_is_fatal_and_creates_no_folder() {
    let ws = workspace("garbage.pdf");
    let cfg = config(&ws, FakeBackend::unopenable("not a PDF"), FakeOcr::returning(""))
        .build()
        .unwrap();

    let err = convert(&ws.input, &cfg).await.unwrap_err();

    assert!(err.is_open_failure());
    assert!(err.to_string().contains("not a PDF"));
    assert!(!ws.out.exists());
}

#[tokio::test]
async fn output_folder_failure_is_fatal_and_closes_the_document() {
    let ws = workspace("report.pdf");
    // A regular file where the output root should be.
    std::fs::write(&ws.out, b"").unwrap();
    let backend = FakeBackend::with_pages(vec![FakePageSpec::text(&long_text(1))]);
    let cfg = config(&ws, backend.clone(), FakeOcr::returning(""))
        .build()
        .unwrap();

    let err = convert(&ws.input, &cfg).await.unwrap_err();

    assert!(matches!(err, ConvertError::OutputDir { .. }), "got {err:?}");
    assert_eq!(backend.opens.load(Ordering::SeqCst), 1);
    assert_eq!(backend.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn rerun_overwrites_artifacts_in_place() {
    let ws = workspace("report.pdf");
    let backend = FakeBackend::with_pages(vec![
        FakePageSpec::text(&long_text(1)),
        FakePageSpec::text("short"),
    ]);
    let ocr = FakeOcr::returning("ocr says hello");
    let cfg = config(&ws, backend, ocr).build().unwrap();

    convert(&ws.input, &cfg).await.unwrap();
    let dir = ws.out.join("report");
    let first: Vec<String> = (1..=2).map(|n| read(dir.join(format!("page_{n}.txt")))).collect();
    let first_png = std::fs::read(dir.join("page_1.png")).unwrap();

    let report = convert(&ws.input, &cfg).await.unwrap();
    let second: Vec<String> = (1..=2).map(|n| read(dir.join(format!("page_{n}.txt")))).collect();

    assert!(report.is_complete());
    assert_eq!(first, second);
    assert_eq!(first_png, std::fs::read(dir.join("page_1.png")).unwrap());
    assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 4);
}

#[tokio::test]
async fn disabled_ocr_keeps_short_native_text() {
    let ws = workspace("notes.pdf");
    let backend = FakeBackend::with_pages(vec![FakePageSpec::text("tiny")]);
    let cfg = ConversionConfig::builder()
        .output_root(&ws.out)
        .backend(backend as Arc<dyn DocumentBackend>)
        .disable_ocr(true)
        .build()
        .unwrap();

    let report = convert(&ws.input, &cfg).await.unwrap();

    assert_eq!(read(ws.out.join("notes/page_1.txt")), "tiny");
    assert_eq!(report.pages[0].text_source, Some(TextSource::Native));
    assert_eq!(report.stats.ocr_pages, 0);
}

#[tokio::test]
async fn page_selection_limits_the_output() {
    let ws = workspace("book.pdf");
    let backend = FakeBackend::with_pages((1..=4).map(|n| FakePageSpec::text(&long_text(n))).collect());
    let cfg = config(&ws, backend.clone(), FakeOcr::returning(""))
        .pages(PageSelection::Set(vec![3, 1]))
        .build()
        .unwrap();

    let report = convert(&ws.input, &cfg).await.unwrap();

    let dir = ws.out.join("book");
    let nums: Vec<usize> = report.pages.iter().map(|p| p.page_num).collect();
    assert_eq!(nums, vec![1, 3]);
    assert!(dir.join("page_3.png").is_file());
    assert!(!dir.join("page_2.png").exists());
    assert_eq!(report.stats.total_pages, 4);
    assert_eq!(report.stats.selected_pages, 2);

    let cfg = config(&ws, backend, FakeOcr::returning(""))
        .pages(PageSelection::Single(9))
        .build()
        .unwrap();
    let err = convert(&ws.input, &cfg).await.unwrap_err();
    assert!(matches!(err, ConvertError::PageOutOfRange { page: 9, total: 4 }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_finishing_produces_the_same_files() {
    let ws = workspace("parallel.pdf");
    let pages: Vec<FakePageSpec> = (1..=12)
        .map(|n| {
            if n % 3 == 0 {
                FakePageSpec::text("")
            } else {
                FakePageSpec::text(&long_text(n))
            }
        })
        .collect();
    let ocr = FakeOcr::returning("from ocr");
    let cfg = config(&ws, FakeBackend::with_pages(pages), ocr.clone())
        .concurrency(4)
        .build()
        .unwrap();

    let report = convert(&ws.input, &cfg).await.unwrap();

    let dir = ws.out.join("parallel");
    let nums: Vec<usize> = report.pages.iter().map(|p| p.page_num).collect();
    assert_eq!(nums, (1..=12).collect::<Vec<_>>());
    for n in 1..=12 {
        let expected = if n % 3 == 0 { "from ocr".to_string() } else { long_text(n) };
        assert_eq!(read(dir.join(format!("page_{n}.txt"))), expected);
    }
    assert_eq!(ocr.calls.load(Ordering::SeqCst), 4);
    assert_eq!(report.stats.ocr_pages, 4);
}

#[derive(Default)]
struct RecordingCallback {
    started: AtomicUsize,
    page_starts: AtomicUsize,
    completes: AtomicUsize,
    errors: Mutex<Vec<usize>>,
    finished: Mutex<Option<(usize, usize)>>,
}

impl ConversionProgressCallback for RecordingCallback {
    fn on_conversion_start(&self, total_pages: usize) {
        self.started.store(total_pages, Ordering::SeqCst);
    }

    fn on_page_start(&self, _page_num: usize, _total_pages: usize) {
        self.page_starts.fetch_add(1, Ordering::SeqCst);
    }

    fn on_page_complete(&self, _page: usize, _total: usize, _chars: usize, _source: TextSource) {
        self.completes.fetch_add(1, Ordering::SeqCst);
    }

    fn on_page_error(&self, page_num: usize, _total_pages: usize, _error: &str) {
        self.errors.lock().unwrap().push(page_num);
    }

    fn on_conversion_complete(&self, total_pages: usize, success_count: usize) {
        *self.finished.lock().unwrap() = Some((total_pages, success_count));
    }
}

#[tokio::test]
async fn progress_events_follow_the_run() {
    let ws = workspace("progress.pdf");
    let backend = FakeBackend::with_pages(vec![
        FakePageSpec::text(&long_text(1)),
        FakePageSpec::text(&long_text(2)).render_fails(),
        FakePageSpec::text(""),
    ]);
    let recorder = Arc::new(RecordingCallback::default());
    let cfg = config(&ws, backend, FakeOcr::returning("ocr"))
        .progress_callback(recorder.clone() as Arc<dyn ConversionProgressCallback>)
        .build()
        .unwrap();

    convert(&ws.input, &cfg).await.unwrap();

    assert_eq!(recorder.started.load(Ordering::SeqCst), 3);
    assert_eq!(recorder.page_starts.load(Ordering::SeqCst), 2);
    assert_eq!(recorder.completes.load(Ordering::SeqCst), 2);
    assert_eq!(*recorder.errors.lock().unwrap(), vec![2]);
    assert_eq!(*recorder.finished.lock().unwrap(), Some((3, 2)));
}

#[tokio::test]
async fn inspect_reads_metadata_without_writing() {
    let ws = workspace("report.pdf");
    let backend = FakeBackend::with_pages(vec![FakePageSpec::text("a"), FakePageSpec::text("b")]);
    let cfg = config(&ws, backend.clone(), FakeOcr::returning(""))
        .build()
        .unwrap();

    let meta = inspect(&ws.input, &cfg).await.unwrap();

    assert_eq!(meta.page_count, 2);
    assert_eq!(meta.title.as_deref(), Some("Quarterly report"));
    assert_eq!(backend.closes.load(Ordering::SeqCst), 1);
    assert!(!ws.out.exists());
}

#[test]
fn convert_sync_runs_without_a_runtime() {
    let ws = workspace("sync.pdf");
    let backend = FakeBackend::with_pages(vec![FakePageSpec::text(&long_text(1))]);
    let cfg = config(&ws, backend, FakeOcr::returning(""))
        .build()
        .unwrap();

    let report = pdf2text::convert_sync(&ws.input, &cfg).unwrap();
    assert_eq!(report.stats.processed_pages, 1);
    assert!(ws.out.join("sync/page_1.txt").is_file());
}
