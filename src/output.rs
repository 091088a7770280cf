//! Data types produced by the outline pipeline.

use serde::{Deserialize, Serialize};

/// One few-shot example: an outline file, optionally paired with the text
/// of the source document it was written for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamplePair {
    /// Shared filename stem, e.g. `paper` for `paper.pdf` / `paper_outline.tex`.
    pub base_name: String,
    /// Extracted text of `<base_name>.pdf`, if that file exists.
    pub source_text: Option<String>,
    /// Contents of the outline `.tex` file.
    pub outline_text: String,
}

/// Everything sent to the model for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptSpec {
    pub instructions: String,
    /// Examples in prompt order.
    pub examples: Vec<ExamplePair>,
    pub target_text: String,
    pub model_name: String,
}

/// The model's answer and the outline recovered from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Completion exactly as returned by the model.
    pub raw_text: String,
    /// Normalised LaTeX document, starting with `\documentclass`.
    pub extracted_outline: String,
}

/// Timing and size statistics for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutlineStats {
    /// Example pairs found in the examples directory.
    pub examples_loaded: usize,
    /// Example pairs that made it into the prompt.
    pub examples_used: usize,
    /// Whether the last used example had to be shortened to fit the budget.
    pub example_truncated: bool,
    /// Length of the assembled prompt, in chars.
    pub prompt_chars: usize,
    /// Length of the target text sent to the model, after the target cap, in chars.
    pub target_chars: usize,
    pub raw_bytes: usize,
    pub outline_bytes: usize,
    pub extraction_duration_ms: u64,
    pub model_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Complete result of [`crate::generate::generate_outline`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlineOutput {
    pub result: GenerationResult,
    pub prompt: PromptSpec,
    pub stats: OutlineStats,
}

impl OutlineOutput {
    /// The outline document to write.
    pub fn outline(&self) -> &str {
        &self.result.extracted_outline
    }
}
