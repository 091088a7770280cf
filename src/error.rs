//! Error types for the edgequake-pdf2outline library.
//!
//! Every failure is fatal to the current document: there is no
//! partial-success mode. Either a complete outline is produced or the run
//! fails with an [`OutlineError`] that names the [`Stage`] it came from,
//! so a caller can tell "the PDF is unreadable" apart from "the model
//! answered with prose".

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Pipeline stage that produced an error or a progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Validating the target PDF path.
    Input,
    /// Discovering and reading example pairs.
    Examples,
    /// Extracting text from the target PDF.
    Extraction,
    /// Assembling the few-shot prompt.
    Prompt,
    /// Talking to the model-serving collaborator.
    Model,
    /// Turning the raw completion into a LaTeX document.
    Outline,
    /// Writing the outline file.
    Output,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Input => "input",
            Stage::Examples => "examples",
            Stage::Extraction => "extraction",
            Stage::Prompt => "prompt",
            Stage::Model => "model",
            Stage::Outline => "outline",
            Stage::Output => "output",
        };
        f.write_str(name)
    }
}

/// All fatal errors returned by the edgequake-pdf2outline library.
#[derive(Debug, Error)]
pub enum OutlineError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Example errors ────────────────────────────────────────────────────
    /// Two outline files claim the same base name with different content.
    #[error(
        "Ambiguous example '{base_name}': '{first}' and '{second}' differ.\n\
Remove or rename one of them."
    )]
    AmbiguousExample {
        base_name: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// The examples directory, or an outline file in it, cannot be read.
    #[error("Cannot read example path '{path}': {source}")]
    ExampleUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// pdfium could not parse the document.
    #[error("Text extraction failed for '{path}': {detail}")]
    ExtractionFailed { path: PathBuf, detail: String },

    /// The PDF parsed, but contains no extractable text (e.g. a scan).
    #[error("No text could be extracted from {document}\nScanned PDFs need OCR before outlining.")]
    EmptyExtraction { document: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium is normally downloaded automatically on first run.\n\
If the auto-download failed, set PDFIUM_LIB_PATH=/path/to/libpdfium."
    )]
    PdfiumBindingFailed(String),

    // ── Prompt errors ─────────────────────────────────────────────────────
    /// Instructions and target text alone do not fit the prompt budget.
    #[error(
        "Prompt needs {required} chars without examples but the budget is {budget}.\n\
Raise --budget or lower --max-target-chars."
    )]
    PromptBudgetExceeded { required: usize, budget: usize },

    // ── Model errors ──────────────────────────────────────────────────────
    /// The model-serving process could not be reached.
    #[error("Cannot reach model server at '{url}': {reason}\nIs it running? Try: ollama serve")]
    Connection { url: String, reason: String },

    /// The requested model is not installed on the server.
    #[error(
        "Model '{model}' is not available (installed: {})\nTry: ollama pull {model}",
        display_models(.available)
    )]
    ModelNotFound { model: String, available: Vec<String> },

    /// The model server answered, but not with a usable completion.
    #[error("Model API error: {message}")]
    ModelApi { message: String },

    // ── Outline errors ────────────────────────────────────────────────────
    /// The completion holds no recoverable LaTeX document structure.
    #[error("Model response is not a LaTeX document: {detail}")]
    OutlineFormat { detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error during {stage}: {detail}")]
    Internal { stage: Stage, detail: String },
}

fn display_models(models: &[String]) -> String {
    if models.is_empty() {
        "none".to_string()
    } else {
        models.join(", ")
    }
}

impl OutlineError {
    /// The pipeline stage this error belongs to.
    pub fn stage(&self) -> Stage {
        match self {
            OutlineError::FileNotFound { .. }
            | OutlineError::PermissionDenied { .. }
            | OutlineError::NotAPdf { .. } => Stage::Input,
            OutlineError::AmbiguousExample { .. } | OutlineError::ExampleUnreadable { .. } => {
                Stage::Examples
            }
            OutlineError::ExtractionFailed { .. }
            | OutlineError::EmptyExtraction { .. }
            | OutlineError::PdfiumBindingFailed(_) => Stage::Extraction,
            OutlineError::PromptBudgetExceeded { .. } | OutlineError::InvalidConfig(_) => {
                Stage::Prompt
            }
            OutlineError::Connection { .. }
            | OutlineError::ModelNotFound { .. }
            | OutlineError::ModelApi { .. } => Stage::Model,
            OutlineError::OutlineFormat { .. } => Stage::Outline,
            OutlineError::OutputWriteFailed { .. } => Stage::Output,
            OutlineError::Internal { stage, .. } => *stage,
        }
    }

    /// True for failures caused by the examples directory or the config
    /// rather than by the document or the model.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            OutlineError::AmbiguousExample { .. }
                | OutlineError::ExampleUnreadable { .. }
                | OutlineError::PromptBudgetExceeded { .. }
                | OutlineError::InvalidConfig(_)
        )
    }

    /// True when another generation attempt could succeed: the model
    /// answered badly or the server dropped the request.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OutlineError::Connection { .. }
                | OutlineError::ModelApi { .. }
                | OutlineError::OutlineFormat { .. }
        )
    }
}
