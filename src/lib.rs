//! # edgequake-pdf2outline
//!
//! Generate a LaTeX outline (document class, sections, subsections) for a
//! PDF, using a local language model steered by example outlines.
//!
//! ## Why examples?
//!
//! Small local models produce far better structure when shown what a good
//! outline looks like for a comparable document. The crate reads a
//! directory of `X.pdf` + `X_outline.tex` pairs, places as many as fit the
//! prompt budget in front of the new document, and cuts the model's reply
//! down to a compilable `.tex` file.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     validate the local file (exists, readable, %PDF magic)
//!  ├─ 2. Extract   page text via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 3. Examples  X.pdf ↔ X_outline.tex / X.tex pairs, sorted by name
//!  ├─ 4. Prompt    instructions + examples + target under a char budget
//!  ├─ 5. Model     health check, model check, one generation (Ollama / hosted)
//!  ├─ 6. Outline   marker-based LaTeX extraction
//!  └─ 7. Output    atomic write to <output>/<stem>_outline.tex
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf2outline::{
//!     default_output_path, generate_outline_to_file, NoopProgressCallback, OllamaClient,
//!     OutlineConfig, PdfiumExtractor,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = OutlineConfig::default();
//!     let client = OllamaClient::from_env()?;
//!     let output = default_output_path("paper.pdf", &config.output_dir);
//!     let stats = generate_outline_to_file(
//!         "paper.pdf",
//!         &output,
//!         &client,
//!         Arc::new(PdfiumExtractor::new()),
//!         &config,
//!         &NoopProgressCallback,
//!     )
//!     .await?;
//!     eprintln!("{} example(s) used", stats.examples_used);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2outline` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-pdf2outline = { version = "0.1", default-features = false }
//! ```

pub mod config;
pub mod error;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

pub use config::{OutlineConfig, OutlineConfigBuilder, DEFAULT_MODEL, DEFAULT_OLLAMA_HOST};
pub use error::{OutlineError, Stage};
pub use generate::{
    default_output_path, generate_outline, generate_outline_sync, generate_outline_to_file,
};
pub use output::{ExamplePair, GenerationResult, OutlineOutput, OutlineStats, PromptSpec};
pub use pipeline::examples::{load_examples, pair_outline_name};
pub use pipeline::extract::{PdfiumExtractor, TextExtractor};
pub use pipeline::llm::{model_matches, GenerateOptions, ModelClient, ProviderClient};
pub use pipeline::ollama::OllamaClient;
pub use pipeline::postprocess::extract_outline;
pub use pipeline::prompt::{build_prompt, BuiltPrompt};
pub use progress::{NoopProgressCallback, OutlineProgressCallback, ProgressCallback};
