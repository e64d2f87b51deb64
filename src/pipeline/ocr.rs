//! OCR fallback for pages whose native text is too short.
//!
//! [`OcrEngine`] is the seam; [`TesseractOcr`] drives the `tesseract`
//! executable. The executable path is chosen when the engine is built and
//! never changes afterwards, so two engines with different binaries can
//! coexist in one process.

use crate::config::OcrLanguages;
use image::{DynamicImage, ImageFormat};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, warn};

/// Environment variable naming the Tesseract executable.
pub const TESSERACT_CMD_ENV: &str = "TESSERACT_CMD";

/// Errors from OCR engines. Never escalated past the page that hit them.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR engine not available: {0}")]
    EngineUnavailable(String),

    #[error("OCR failed: {0}")]
    Failed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// A text recogniser for rendered pages.
pub trait OcrEngine: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Recognise the text in `image`, considering all `languages` in one pass.
    fn recognize(&self, image: &DynamicImage, languages: &OcrLanguages) -> Result<String, OcrError>;
}

/// Run `engine`, turning any failure into an empty string plus a warning.
pub fn recognize_or_empty(
    engine: &dyn OcrEngine,
    image: &DynamicImage,
    languages: &OcrLanguages,
    page_num: usize,
) -> (String, Option<String>) {
    let start = Instant::now();
    match engine.recognize(image, languages) {
        Ok(text) => {
            debug!(
                "Page {}: {} recognised {} chars in {}ms",
                page_num,
                engine.name(),
                text.chars().count(),
                start.elapsed().as_millis()
            );
            (text, None)
        }
        Err(e) => {
            warn!("Error during OCR extraction for page {}: {}", page_num, e);
            (String::new(), Some(format!("OCR failed: {e}")))
        }
    }
}

/// Tesseract OCR via its command-line interface.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    binary: PathBuf,
    tessdata_dir: Option<PathBuf>,
}

impl TesseractOcr {
    /// Build an engine for `binary`, falling back to `TESSERACT_CMD`, then
    /// `tesseract` on `PATH`.
    pub fn new(binary: Option<PathBuf>, tessdata_dir: Option<PathBuf>) -> Self {
        let binary = binary
            .or_else(|| std::env::var_os(TESSERACT_CMD_ENV).map(PathBuf::from))
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| PathBuf::from("tesseract"));
        Self {
            binary,
            tessdata_dir,
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// `true` when `tesseract --version` runs successfully.
    pub fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn command(&self, image_path: &Path, languages: &OcrLanguages) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg(image_path)
            .arg("stdout")
            .args(["-l", &languages.to_string()]);
        if let Some(dir) = &self.tessdata_dir {
            cmd.env("TESSDATA_PREFIX", dir);
        }
        cmd
    }

    fn run(&self, image_path: &Path, languages: &OcrLanguages) -> Result<String, OcrError> {
        debug!(
            "Running {} {} stdout -l {}",
            self.binary.display(),
            image_path.display(),
            languages
        );
        match self.command(image_path, languages).output() {
            Ok(output) if output.status.success() => {
                Ok(String::from_utf8_lossy(&output.stdout).to_string())
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(OcrError::Failed(format!("tesseract failed: {}", stderr.trim())))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(OcrError::EngineUnavailable(format!(
                    "'{}' not found (install tesseract-ocr or pass --tesseract-cmd)",
                    self.binary.display()
                )))
            }
            Err(e) => Err(OcrError::Io(e)),
        }
    }
}

impl OcrEngine for TesseractOcr {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(&self, image: &DynamicImage, languages: &OcrLanguages) -> Result<String, OcrError> {
        let tmp = tempfile::Builder::new()
            .prefix("pdf2text-ocr-")
            .suffix(".png")
            .tempfile()?;
        image.save_with_format(tmp.path(), ImageFormat::Png)?;
        self.run(tmp.path(), languages)
    }
}
