//! pdfium implementation of the document seam.
//!
//! pdfium is not safe to drive from several threads at once, so a
//! `PdfiumDocument` never leaves the blocking task that opened it; the
//! orchestrator hands out rendered images, not pages.
//!
//! Rendering scales the page's point size (72 pt per inch) uniformly by the
//! configured zoom, so zoom 2.0 on an A4 page gives 1190 × 1684 px.

use crate::error::ConvertError;
use crate::output::DocumentMetadata;
use crate::pipeline::document::{Document, DocumentBackend, DocumentVisitor, Page};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming an existing pdfium library (file or directory).
pub const PDFIUM_LIB_ENV: &str = "PDFIUM_LIB_PATH";

/// Document backend that binds pdfium on the thread that opens the document.
///
/// Only the library location is stored, so the backend itself is freely
/// shareable; the bound library and every handle derived from it live inside
/// one [`DocumentBackend::with_document`] call.
#[derive(Debug, Clone, Default)]
pub struct PdfiumBackend {
    library: Option<PathBuf>,
}

impl PdfiumBackend {
    /// `library` is a pdfium shared library file or the directory holding it.
    pub fn new(library: Option<PathBuf>) -> Self {
        Self { library }
    }
}

/// Bind to pdfium.
///
/// Resolution order: `library` argument, `PDFIUM_LIB_PATH`, then the system
/// library search path. A directory is expanded to the platform's library
/// file name inside it.
pub fn bind_pdfium(library: Option<&Path>) -> Result<Pdfium, ConvertError> {
    let explicit: Option<PathBuf> = library
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(PDFIUM_LIB_ENV).map(PathBuf::from))
        .filter(|p| !p.as_os_str().is_empty());

    let bindings = match explicit {
        Some(path) => {
            let lib_path = if path.is_dir() {
                Pdfium::pdfium_platform_library_name_at_path(&path)
            } else {
                path
            };
            debug!("Binding pdfium from {}", lib_path.display());
            Pdfium::bind_to_library(&lib_path).map_err(|e| {
                ConvertError::PdfiumBindingFailed(format!("'{}': {}", lib_path.display(), e))
            })?
        }
        None => Pdfium::bind_to_system_library()
            .map_err(|e| ConvertError::PdfiumBindingFailed(e.to_string()))?,
    };

    Ok(Pdfium::new(bindings))
}

impl DocumentBackend for PdfiumBackend {
    fn with_document(
        &self,
        path: &Path,
        password: Option<&str>,
        visit: &mut DocumentVisitor<'_>,
    ) -> Result<(), ConvertError> {
        let pdfium = bind_pdfium(self.library.as_deref())?;

        let document = pdfium
            .load_pdf_from_file(path, password)
            .map_err(|e| classify_open_error(path, password.is_some(), format!("{:?}", e)))?;

        info!("PDF loaded: {} pages", document.pages().len());
        let document = PdfiumDocument { document };
        let result = visit(&document);

        // pdfium releases the document handle on drop; there is no fallible close.
        drop(document);
        debug!("Closed PDF document '{}'", path.display());
        result
    }
}

/// Map a pdfium load failure onto the open-class errors.
fn classify_open_error(path: &Path, had_password: bool, detail: String) -> ConvertError {
    if detail.contains("Password") || detail.contains("password") {
        if had_password {
            ConvertError::WrongPassword {
                path: path.to_path_buf(),
            }
        } else {
            ConvertError::PasswordRequired {
                path: path.to_path_buf(),
            }
        }
    } else {
        ConvertError::Open {
            path: path.to_path_buf(),
            detail,
        }
    }
}

struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
}

impl<'a> Document for PdfiumDocument<'a> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn metadata(&self) -> DocumentMetadata {
        let metadata = self.document.metadata();

        let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
            metadata.get(tag).and_then(|t| {
                let v = t.value().to_string();
                if v.is_empty() {
                    None
                } else {
                    Some(v)
                }
            })
        };

        DocumentMetadata {
            title: get_meta(PdfDocumentMetadataTagType::Title),
            author: get_meta(PdfDocumentMetadataTagType::Author),
            subject: get_meta(PdfDocumentMetadataTagType::Subject),
            creator: get_meta(PdfDocumentMetadataTagType::Creator),
            producer: get_meta(PdfDocumentMetadataTagType::Producer),
            creation_date: get_meta(PdfDocumentMetadataTagType::CreationDate),
            modification_date: get_meta(PdfDocumentMetadataTagType::ModificationDate),
            page_count: self.page_count(),
            pdf_version: format!("{:?}", self.document.version()),
        }
    }

    fn load_page<'p>(&'p self, index: usize) -> Result<Box<dyn Page + 'p>, String> {
        let total = self.page_count();
        if index >= total {
            return Err(format!("index {index} out of range (total={total})"));
        }
        let page = self
            .document
            .pages()
            .get(index as u16)
            .map_err(|e| format!("{:?}", e))?;
        Ok(Box::new(PdfiumPage { page }))
    }
}

struct PdfiumPage<'a> {
    page: PdfPage<'a>,
}

impl<'a> Page for PdfiumPage<'a> {
    fn extract_text(&self) -> Result<String, String> {
        self.page
            .text()
            .map(|text| text.all())
            .map_err(|e| format!("{:?}", e))
    }

    fn render(&self, zoom: f32) -> Result<DynamicImage, String> {
        let render_config = PdfRenderConfig::new().scale_page_by_factor(zoom);

        let bitmap = self
            .page
            .render_with_config(&render_config)
            .map_err(|e| format!("{:?}", e))?;

        let image = bitmap.as_image();
        debug!("Rendered page → {}x{} px", image.width(), image.height());
        Ok(image)
    }
}
