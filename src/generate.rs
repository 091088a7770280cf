//! Outline generation entry points.
//!
//! ```text
//! validate ─▶ extract target ─▶ load examples ─▶ build prompt
//!                                                     │
//!          write ◀─ extract outline ◀─ generate ◀─ model check
//! ```
//!
//! [`generate_outline`] runs every stage and returns the outline in memory;
//! [`generate_outline_to_file`] adds the atomic write. All expensive or
//! external work happens before the write, so a failure at any stage leaves
//! no output file behind.

use crate::config::OutlineConfig;
use crate::error::{OutlineError, Stage};
use crate::output::{OutlineOutput, OutlineStats, PromptSpec};
use crate::pipeline::extract::{extract_text, truncate_chars, TextExtractor};
use crate::pipeline::llm::{ensure_model_available, GenerateOptions, ModelClient};
use crate::pipeline::{examples, input, postprocess, prompt};
use crate::progress::OutlineProgressCallback;
use crate::prompts::TARGET_TRUNCATED_MARKER;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Suffix added to the input stem for default output names.
pub const OUTLINE_SUFFIX: &str = "_outline";

/// Generate a LaTeX outline for the PDF at `input`.
///
/// Nothing is written to disk; see [`generate_outline_to_file`].
///
/// # Errors
/// Any fatal [`OutlineError`]; [`OutlineError::stage`] tells where the
/// pipeline stopped.
pub async fn generate_outline(
    input: impl AsRef<Path>,
    client: &dyn ModelClient,
    extractor: Arc<dyn TextExtractor>,
    config: &OutlineConfig,
    progress: &dyn OutlineProgressCallback,
) -> Result<OutlineOutput, OutlineError> {
    let total_start = Instant::now();
    let input = input.as_ref();
    info!("Generating outline for {}", input.display());

    // ── Step 1: Validate input ───────────────────────────────────────────
    progress.on_stage_start(Stage::Input);
    let pdf_path = input::resolve_local(input)?;
    progress.on_stage_complete(Stage::Input);

    // ── Step 2: Extract target text ──────────────────────────────────────
    progress.on_stage_start(Stage::Extraction);
    let extraction_start = Instant::now();
    let full_text = extract_text(Arc::clone(&extractor), &pdf_path).await?;
    if full_text.trim().is_empty() {
        return Err(OutlineError::EmptyExtraction {
            document: pdf_path.display().to_string(),
        });
    }
    let target_text = truncate_chars(&full_text, config.max_target_chars, TARGET_TRUNCATED_MARKER);
    let extraction_duration_ms = extraction_start.elapsed().as_millis() as u64;
    info!(
        "Extracted {} chars from {} ({}ms)",
        full_text.chars().count(),
        pdf_path.display(),
        extraction_duration_ms
    );
    if target_text.len() < full_text.len() {
        debug!(
            "Target text capped at {} chars",
            config.max_target_chars
        );
    }
    progress.on_stage_complete(Stage::Extraction);

    // ── Step 3: Load examples ────────────────────────────────────────────
    progress.on_stage_start(Stage::Examples);
    let examples = {
        let dir = config.examples_dir.clone();
        let max_source = config.max_example_source_chars;
        let extractor = Arc::clone(&extractor);
        tokio::task::spawn_blocking(move || {
            examples::load_examples(&dir, extractor.as_ref(), max_source)
        })
        .await
        .map_err(|e| OutlineError::Internal {
            stage: Stage::Examples,
            detail: format!("Example loading task panicked: {}", e),
        })??
    };
    progress.on_examples_loaded(examples.len());
    progress.on_stage_complete(Stage::Examples);

    // ── Step 4: Build prompt ─────────────────────────────────────────────
    progress.on_stage_start(Stage::Prompt);
    let spec = PromptSpec {
        instructions: config.instructions().to_string(),
        examples,
        target_text,
        model_name: config.model.clone(),
    };
    let built = prompt::build_prompt(&spec, config.prompt_budget_chars)?;
    progress.on_stage_complete(Stage::Prompt);

    // ── Step 5: Model ────────────────────────────────────────────────────
    progress.on_stage_start(Stage::Model);
    ensure_model_available(client, &config.model).await?;
    let model_start = Instant::now();
    let options = GenerateOptions {
        temperature: config.temperature,
    };
    info!(
        "Generating with {} at {} ({} chars of prompt)",
        config.model,
        client.endpoint(),
        built.char_len()
    );
    let raw = client
        .generate(&config.model, &built.text, &options, progress)
        .await?;
    let model_duration_ms = model_start.elapsed().as_millis() as u64;
    progress.on_stage_complete(Stage::Model);

    // ── Step 6: Extract outline ──────────────────────────────────────────
    progress.on_stage_start(Stage::Outline);
    let result = postprocess::extract_generation(&raw)?;
    progress.on_stage_complete(Stage::Outline);

    let stats = OutlineStats {
        examples_loaded: spec.examples.len(),
        examples_used: built.examples_used,
        example_truncated: built.example_truncated,
        prompt_chars: built.char_len(),
        target_chars: spec.target_text.chars().count(),
        raw_bytes: result.raw_text.len(),
        outline_bytes: result.extracted_outline.len(),
        extraction_duration_ms,
        model_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };
    info!(
        "Outline ready: {} bytes from {} bytes of output in {}ms",
        stats.outline_bytes, stats.raw_bytes, stats.total_duration_ms
    );

    Ok(OutlineOutput {
        result,
        prompt: spec,
        stats,
    })
}

/// Generate an outline and write it to `output_path`.
///
/// Parent directories are created and an existing file is replaced. The
/// write goes through a temp file, so on any error `output_path` is left
/// as it was.
pub async fn generate_outline_to_file(
    input: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    client: &dyn ModelClient,
    extractor: Arc<dyn TextExtractor>,
    config: &OutlineConfig,
    progress: &dyn OutlineProgressCallback,
) -> Result<OutlineStats, OutlineError> {
    let output = generate_outline(input, client, extractor, config, progress).await?;

    progress.on_stage_start(Stage::Output);
    postprocess::write_outline(output_path.as_ref(), output.outline()).await?;
    progress.on_stage_complete(Stage::Output);

    Ok(output.stats)
}

/// Blocking wrapper around [`generate_outline`] for non-async callers.
///
/// Creates a tokio runtime; do not call from inside one.
pub fn generate_outline_sync(
    input: impl AsRef<Path>,
    client: &dyn ModelClient,
    extractor: Arc<dyn TextExtractor>,
    config: &OutlineConfig,
    progress: &dyn OutlineProgressCallback,
) -> Result<OutlineOutput, OutlineError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| OutlineError::Internal {
            stage: Stage::Input,
            detail: format!("Failed to create tokio runtime: {}", e),
        })?
        .block_on(generate_outline(input, client, extractor, config, progress))
}

/// `<output_dir>/<input stem>_outline.tex`.
pub fn default_output_path(input: impl AsRef<Path>, output_dir: impl AsRef<Path>) -> PathBuf {
    let stem = input
        .as_ref()
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    output_dir
        .as_ref()
        .join(format!("{stem}{OUTLINE_SUFFIX}.tex"))
}
