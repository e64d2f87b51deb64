//! Configuration types for PDF page export.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Collaborators that used to be global
//! state (the Tesseract executable path, the pdfium library location) are
//! plain fields here and are handed to the engines when they are constructed.

use crate::error::ConvertError;
use crate::pipeline::document::DocumentBackend;
use crate::pipeline::ocr::OcrEngine;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Upper bound for the render zoom factor; 16× of an A4 page is already
/// ~9500 × 13500 px.
pub const MAX_ZOOM: f32 = 16.0;

/// Upper bound for extra write attempts per artifact.
pub const MAX_WRITE_RETRIES: u32 = 10;

/// Configuration for a PDF-to-text-and-images run.
///
/// # Example
/// ```rust
/// use pdf2text::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .zoom(3.0)
///     .ocr_languages("eng+deu".parse().unwrap())
///     .sufficiency_threshold(50)
///     .build()
///     .unwrap();
/// assert_eq!(config.ocr_languages.to_string(), "eng+deu");
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Uniform scale applied to both page axes when rasterising. Default: 2.0.
    ///
    /// 1.0 renders at the page's point size (72 DPI). Higher values sharpen
    /// the PNG and improve OCR accuracy at the cost of time and disk space.
    pub zoom: f32,

    /// Tesseract languages combined into a single recognition pass.
    /// Default: `fas+ara+eng`.
    pub ocr_languages: OcrLanguages,

    /// Minimum trimmed character count for native text to be kept. Default: 30.
    ///
    /// Pages whose trimmed native text is strictly shorter fall back to OCR.
    pub sufficiency_threshold: usize,

    /// Directory in which the per-document output folder is created.
    /// If None, the current working directory.
    pub output_root: Option<PathBuf>,

    /// Number of pages finished (OCR + writes) in parallel. Default: 1.
    ///
    /// Loading and rendering always happen on a single thread that owns the
    /// document; this only bounds the OCR/write stage.
    pub concurrency: usize,

    /// Page selection. Default: All pages.
    pub pages: PageSelection,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Skip OCR entirely; short native text is written as-is.
    pub disable_ocr: bool,

    /// Path to the pdfium shared library (file or containing directory).
    /// If None, `PDFIUM_LIB_PATH` and then the system library path are tried.
    pub pdfium_library: Option<PathBuf>,

    /// Tesseract executable. If None, `TESSERACT_CMD` and then `tesseract`.
    pub tesseract_cmd: Option<PathBuf>,

    /// Directory holding `*.traineddata` files (sets `TESSDATA_PREFIX`).
    pub tessdata_dir: Option<PathBuf>,

    /// Extra attempts for a failed artifact write. Default: 2.
    pub write_retries: u32,

    /// Initial write retry delay in milliseconds, doubled per attempt. Default: 50.
    pub retry_backoff_ms: u64,

    /// Pre-constructed document backend. Takes precedence over pdfium binding.
    pub backend: Option<Arc<dyn DocumentBackend>>,

    /// Pre-constructed OCR engine. Takes precedence over `tesseract_cmd`.
    pub ocr_engine: Option<Arc<dyn OcrEngine>>,

    /// Receives per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            zoom: 2.0,
            ocr_languages: OcrLanguages::default(),
            sufficiency_threshold: 30,
            output_root: None,
            concurrency: 1,
            pages: PageSelection::default(),
            password: None,
            disable_ocr: false,
            pdfium_library: None,
            tesseract_cmd: None,
            tessdata_dir: None,
            write_retries: 2,
            retry_backoff_ms: 50,
            backend: None,
            ocr_engine: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("zoom", &self.zoom)
            .field("ocr_languages", &self.ocr_languages)
            .field("sufficiency_threshold", &self.sufficiency_threshold)
            .field("output_root", &self.output_root)
            .field("concurrency", &self.concurrency)
            .field("pages", &self.pages)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("disable_ocr", &self.disable_ocr)
            .field("pdfium_library", &self.pdfium_library)
            .field("tesseract_cmd", &self.tesseract_cmd)
            .field("tessdata_dir", &self.tessdata_dir)
            .field("write_retries", &self.write_retries)
            .field("backend", &self.backend.as_ref().map(|_| "<dyn DocumentBackend>"))
            .field("ocr_engine", &self.ocr_engine.as_ref().map(|_| "<dyn OcrEngine>"))
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// The directory artifacts are written under, before the per-document folder.
    pub fn output_root(&self) -> PathBuf {
        self.output_root
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Builder for [`ConversionConfig`].
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl fmt::Debug for ConversionConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl ConversionConfigBuilder {
    pub fn zoom(mut self, zoom: f32) -> Self {
        self.config.zoom = zoom;
        self
    }

    pub fn ocr_languages(mut self, languages: OcrLanguages) -> Self {
        self.config.ocr_languages = languages;
        self
    }

    pub fn sufficiency_threshold(mut self, chars: usize) -> Self {
        self.config.sufficiency_threshold = chars;
        self
    }

    pub fn output_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_root = Some(dir.into());
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn disable_ocr(mut self, v: bool) -> Self {
        self.config.disable_ocr = v;
        self
    }

    pub fn pdfium_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library = Some(path.into());
        self
    }

    pub fn tesseract_cmd(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.tesseract_cmd = Some(path.into());
        self
    }

    pub fn tessdata_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.tessdata_dir = Some(dir.into());
        self
    }

    pub fn write_retries(mut self, n: u32) -> Self {
        self.config.write_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn backend(mut self, backend: Arc<dyn DocumentBackend>) -> Self {
        self.config.backend = Some(backend);
        self
    }

    pub fn ocr_engine(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.config.ocr_engine = Some(engine);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, ConvertError> {
        let c = &self.config;
        if !c.zoom.is_finite() || c.zoom <= 0.0 || c.zoom > MAX_ZOOM {
            return Err(ConvertError::InvalidConfig(format!(
                "zoom must be > 0 and ≤ {MAX_ZOOM}, got {}",
                c.zoom
            )));
        }
        if c.ocr_languages.is_empty() && !c.disable_ocr {
            return Err(ConvertError::InvalidConfig(
                "at least one OCR language is required".into(),
            ));
        }
        if c.write_retries > MAX_WRITE_RETRIES {
            return Err(ConvertError::InvalidConfig(format!(
                "write_retries must be ≤ {MAX_WRITE_RETRIES}, got {}",
                c.write_retries
            )));
        }
        if c.concurrency == 0 {
            return Err(ConvertError::InvalidConfig("concurrency must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}

// ── OCR languages ────────────────────────────────────────────────────────

/// Ordered set of Tesseract language codes, rendered as `fas+ara+eng`.
///
/// Order is preserved because Tesseract treats the first language as primary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct OcrLanguages(Vec<String>);

impl OcrLanguages {
    /// Build from codes, dropping blanks and duplicates while keeping order.
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for code in codes {
            let code = code.as_ref().trim();
            if !code.is_empty() && !out.iter().any(|c| c == code) {
                out.push(code.to_string());
            }
        }
        Self(out)
    }

    pub fn codes(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for OcrLanguages {
    /// Persian, Arabic and English considered together.
    fn default() -> Self {
        Self::new(["fas", "ara", "eng"])
    }
}

impl fmt::Display for OcrLanguages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("+"))
    }
}

impl FromStr for OcrLanguages {
    type Err = ConvertError;

    /// Accepts `fas+ara+eng`, `fas,ara,eng` or whitespace-separated codes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let langs = Self::new(s.split(|c: char| c == '+' || c == ',' || c.is_whitespace()));
        if langs.is_empty() {
            return Err(ConvertError::InvalidConfig(format!(
                "no OCR language codes in '{s}'"
            )));
        }
        if let Some(bad) = langs
            .0
            .iter()
            .find(|c| !c.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_'))
        {
            return Err(ConvertError::InvalidConfig(format!(
                "invalid OCR language code '{bad}'"
            )));
        }
        Ok(langs)
    }
}

impl From<OcrLanguages> for String {
    fn from(l: OcrLanguages) -> Self {
        l.to_string()
    }
}

impl TryFrom<String> for OcrLanguages {
    type Error = ConvertError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

// ── Page selection ───────────────────────────────────────────────────────

/// Specifies which pages of the PDF to export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSelection {
    /// Export all pages (default).
    #[default]
    All,
    /// Export a single page (1-indexed).
    Single(usize),
    /// Export a contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Export specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed page numbers.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => {
                if *p >= 1 && *p <= total_pages {
                    vec![p - 1]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1) - 1;
                let e = (*end).min(total_pages);
                (s..e).collect()
            }
            PageSelection::Set(pages) => pages
                .iter()
                .filter(|&&p| p >= 1 && p <= total_pages)
                .map(|p| p - 1)
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }

    /// First requested page, used when reporting an empty selection.
    pub fn first_requested(&self) -> usize {
        match self {
            PageSelection::All => 1,
            PageSelection::Single(p) => *p,
            PageSelection::Range(s, _) => *s,
            PageSelection::Set(pages) => pages.iter().copied().min().unwrap_or(0),
        }
    }
}

impl FromStr for PageSelection {
    type Err = ConvertError;

    /// Parse `all`, `5`, `3-15` or `1,3,5,7`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        let parse = |p: &str| -> Result<usize, ConvertError> {
            let n: usize = p.trim().parse().map_err(|_| {
                ConvertError::InvalidConfig(format!("invalid page number '{}'", p.trim()))
            })?;
            if n < 1 {
                return Err(ConvertError::InvalidConfig(format!(
                    "pages are 1-indexed, minimum is 1 (got {n})"
                )));
            }
            Ok(n)
        };

        if s == "all" {
            return Ok(PageSelection::All);
        }

        if let Some((start, end)) = s.split_once('-') {
            let (start, end) = (parse(start)?, parse(end)?);
            if start > end {
                return Err(ConvertError::InvalidConfig(format!(
                    "invalid page range '{start}-{end}': start must be <= end"
                )));
            }
            return Ok(PageSelection::Range(start, end));
        }

        if s.contains(',') {
            let pages = s.split(',').map(parse).collect::<Result<Vec<_>, _>>()?;
            return Ok(PageSelection::Set(pages));
        }

        Ok(PageSelection::Single(parse(&s)?))
    }
}
