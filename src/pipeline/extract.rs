//! Text extraction: PDF → plain text via pdfium.
//!
//! The outline pipeline never looks at page layout; it only needs the
//! linearised text of each page. [`TextExtractor`] is the seam: the
//! pipeline and the example loader take `&dyn TextExtractor`, so tests can
//! substitute canned text without a pdfium library on the machine.
//!
//! ## Why spawn_blocking?
//!
//! pdfium is a C++ library with thread-local state and is CPU-bound on large
//! documents. [`extract_text`] moves the call onto tokio's blocking pool so
//! the async executor never stalls on it.

use crate::error::{OutlineError, Stage};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Turns a PDF file into a text string.
pub trait TextExtractor: Send + Sync {
    /// Extract the text of every page, in page order.
    ///
    /// Blocking. Returns `ExtractionFailed` when the document cannot be
    /// parsed; an empty string is a valid result (the caller decides whether
    /// that is an error).
    fn extract(&self, pdf_path: &Path) -> Result<String, OutlineError>;
}

/// [`TextExtractor`] backed by pdfium, bound through `pdfium-auto`.
///
/// The library is downloaded and cached on first use; set
/// `PDFIUM_LIB_PATH` to use an existing copy.
#[derive(Debug, Default, Clone)]
pub struct PdfiumExtractor {
    password: Option<String>,
}

impl PdfiumExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `password` to open encrypted documents.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }
}

impl TextExtractor for PdfiumExtractor {
    fn extract(&self, pdf_path: &Path) -> Result<String, OutlineError> {
        let pdfium = pdfium_auto::bind_pdfium_silent()
            .map_err(|e| OutlineError::PdfiumBindingFailed(e.to_string()))?;

        let document = pdfium
            .load_pdf_from_file(pdf_path, self.password.as_deref())
            .map_err(|e| OutlineError::ExtractionFailed {
                path: pdf_path.to_path_buf(),
                detail: format!("{:?}", e),
            })?;

        let pages = document.pages();
        info!("PDF loaded: {} pages", pages.len());

        let mut texts = Vec::with_capacity(pages.len() as usize);
        for (idx, page) in pages.iter().enumerate() {
            let text = page
                .text()
                .map_err(|e| OutlineError::ExtractionFailed {
                    path: pdf_path.to_path_buf(),
                    detail: format!("page {}: {:?}", idx + 1, e),
                })?
                .all();
            debug!("Extracted page {} → {} chars", idx + 1, text.chars().count());
            texts.push(text);
        }

        Ok(join_pages(&texts))
    }
}

/// Join page texts with a blank line, dropping pages with no text.
fn join_pages(pages: &[String]) -> String {
    pages
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Run `extractor` on tokio's blocking pool.
pub async fn extract_text(
    extractor: Arc<dyn TextExtractor>,
    pdf_path: &Path,
) -> Result<String, OutlineError> {
    let path = pdf_path.to_path_buf();
    tokio::task::spawn_blocking(move || extractor.extract(&path))
        .await
        .map_err(|e| OutlineError::Internal {
            stage: Stage::Extraction,
            detail: format!("Extraction task panicked: {}", e),
        })?
}

/// Cut `text` to at most `max_chars` chars, appending `marker` when cut.
///
/// The marker counts against `max_chars`, so the result never exceeds it;
/// when the marker alone would not fit, the text is cut without one.
/// Never splits a char.
pub fn truncate_chars(text: &str, max_chars: usize, marker: &str) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let marker_len = marker.chars().count();
    let (keep, marker) = if marker_len < max_chars {
        (max_chars - marker_len, marker)
    } else {
        (max_chars, "")
    };
    let cut = text
        .char_indices()
        .nth(keep)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let mut out = String::with_capacity(cut + marker.len());
    out.push_str(&text[..cut]);
    out.push_str(marker);
    out
}
