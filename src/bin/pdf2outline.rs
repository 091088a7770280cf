//! CLI binary for edgequake-pdf2outline.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `OutlineConfig`, picks a model client and writes the result.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdf2outline::pipeline::postprocess::write_outline;
use edgequake_pdf2outline::progress::{self, ProgressCallback};
use edgequake_pdf2outline::{
    default_output_path, generate_outline, model_matches, ModelClient, OllamaClient,
    OutlineConfig, OutlineError, OutlineOutput, OutlineProgressCallback, PdfiumExtractor,
    ProviderClient, Stage, TextExtractor, DEFAULT_MODEL, DEFAULT_OLLAMA_HOST,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: one spinner whose message follows the current stage,
/// plus a running byte count while the model streams.
struct CliProgressCallback {
    bar: ProgressBar,
    generated: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self {
            bar,
            generated: AtomicUsize::new(0),
        })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl OutlineProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        let (prefix, msg) = match stage {
            Stage::Input => ("Checking", "input PDF…"),
            Stage::Extraction => ("Extracting", "document text…"),
            Stage::Examples => ("Loading", "example outlines…"),
            Stage::Prompt => ("Building", "prompt…"),
            Stage::Model => ("Generating", "waiting for the model…"),
            Stage::Outline => ("Extracting", "LaTeX outline…"),
            Stage::Output => ("Writing", "outline file…"),
        };
        self.bar.set_prefix(prefix);
        self.bar.set_message(msg);
    }

    fn on_examples_loaded(&self, count: usize) {
        self.bar.println(format!(
            "  {} {} example pair(s) found",
            green("✓"),
            bold(&count.to_string())
        ));
    }

    fn on_model_chunk(&self, bytes: usize) {
        let total = self.generated.fetch_add(bytes, Ordering::SeqCst) + bytes;
        self.bar.set_message(format!("{total} bytes received"));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Outline a paper with the default model, using ./examples
  pdf2outline paper.pdf

  # Choose the output file and the model
  pdf2outline paper.pdf -o paper.tex -m mistral

  # Use another examples directory and print to stdout
  pdf2outline paper.pdf -e ~/outlines --stdout

  # Full result (raw reply, prompt, stats) as JSON
  pdf2outline paper.pdf --json > paper.json

  # Is the Ollama server up, and which models does it have?
  pdf2outline --check
  pdf2outline --list-models

  # Hosted provider instead of Ollama
  pdf2outline paper.pdf --provider openai -m gpt-4.1-mini

EXAMPLES DIRECTORY:
  Pairs are matched by file name:
    report.pdf + report_outline.tex    (preferred)
    report.pdf + report.tex
    report.tex on its own              (structure-only example)

ENVIRONMENT VARIABLES:
  OLLAMA_HOST             Ollama server (default http://localhost:11434)
  PDF2OUTLINE_MODEL       Default model
  PDF2OUTLINE_EXAMPLES    Default examples directory
  EDGEQUAKE_LLM_PROVIDER  Hosted provider (openai, anthropic, gemini, …)
  OPENAI_API_KEY          API keys read by hosted providers
  PDFIUM_LIB_PATH         Path to an existing libpdfium, skips auto-download
  RUST_LOG                Overrides the log filter
"#;

/// Generate LaTeX outlines from PDFs using a local language model.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2outline",
    version,
    about = "Generate LaTeX outlines from PDF documents with a local LLM",
    long_about = "Extract the text of a PDF, show the model example outlines from an examples \
directory, and save the LaTeX outline it produces. Runs against a local Ollama server by \
default; any edgequake-llm provider can be used instead.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF file to outline.
    #[arg(required_unless_present_any = ["check", "list_models"])]
    pdf: Option<PathBuf>,

    /// Output file (default: <output-dir>/<name>_outline.tex).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Model name.
    #[arg(short, long, env = "PDF2OUTLINE_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Directory of example PDF / outline pairs.
    #[arg(short, long, env = "PDF2OUTLINE_EXAMPLES", default_value = "examples")]
    examples: PathBuf,

    /// Directory for default output paths.
    #[arg(long, env = "PDF2OUTLINE_OUTPUT_DIR", default_value = "output")]
    output_dir: PathBuf,

    /// Use an edgequake-llm provider instead of Ollama.
    #[arg(long, env = "EDGEQUAKE_LLM_PROVIDER")]
    provider: Option<String>,

    /// Ollama server URL.
    #[arg(long, env = "OLLAMA_HOST", default_value = DEFAULT_OLLAMA_HOST)]
    host: String,

    /// Maximum prompt length in characters.
    #[arg(long, env = "PDF2OUTLINE_BUDGET", default_value_t = 16_000)]
    budget: usize,

    /// Characters of the document sent to the model.
    #[arg(long, env = "PDF2OUTLINE_MAX_TARGET_CHARS", default_value_t = 6_000)]
    max_target_chars: usize,

    /// Characters of each example PDF sent to the model.
    #[arg(long, env = "PDF2OUTLINE_MAX_EXAMPLE_CHARS", default_value_t = 2_000)]
    max_example_chars: usize,

    /// Text file replacing the built-in instructions.
    #[arg(long, env = "PDF2OUTLINE_INSTRUCTIONS")]
    instructions: Option<PathBuf>,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, env = "PDF2OUTLINE_TEMPERATURE")]
    temperature: Option<f32>,

    /// Extra attempts when the model fails or answers without LaTeX.
    #[arg(long, env = "PDF2OUTLINE_RETRIES", default_value_t = 0)]
    retries: u32,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2OUTLINE_PASSWORD")]
    password: Option<String>,

    /// Print the outline to stdout instead of writing a file.
    #[arg(long, conflicts_with = "json")]
    stdout: bool,

    /// Print the full result (outline, raw reply, prompt, stats) as JSON.
    #[arg(long)]
    json: bool,

    /// List the models installed on the server and exit.
    #[arg(long)]
    list_models: bool,

    /// Check that the model server is reachable and exit.
    #[arg(long)]
    check: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "PDF2OUTLINE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner carries the user-facing feedback; INFO logs would tear it.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.verbose && cli.pdf.is_some();
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let client = build_client(&cli)?;

    // ── Server-only modes ────────────────────────────────────────────────
    if cli.check {
        client
            .health_check()
            .await
            .context("Model server check failed")?;
        if !cli.quiet {
            eprintln!("{} model server reachable at {}", green("✔"), client.endpoint());
        }
        return Ok(());
    }

    if cli.list_models {
        let models = client.list_models().await.context("Failed to list models")?;
        for name in &models {
            let marker = if model_matches(&cli.model, name) {
                green("*")
            } else {
                " ".to_string()
            };
            println!("{marker} {name}");
        }
        return Ok(());
    }

    let Some(pdf) = cli.pdf.clone() else {
        anyhow::bail!("No input PDF given");
    };

    ensure_pdfium(cli.quiet)?;

    let config = build_config(&cli).await?;
    let extractor: Arc<dyn TextExtractor> = Arc::new(match cli.password {
        Some(ref password) => PdfiumExtractor::new().with_password(password),
        None => PdfiumExtractor::new(),
    });

    let spinner = show_progress.then(CliProgressCallback::new);
    let progress: ProgressCallback = match spinner {
        Some(ref cb) => Arc::clone(cb) as ProgressCallback,
        None => progress::noop(),
    };

    // ── Generate, with explicit retries ──────────────────────────────────
    let result = generate_with_retries(
        &pdf,
        client.as_ref(),
        extractor,
        &config,
        progress.as_ref(),
        cli.retries,
    )
    .await;
    if let Some(ref cb) = spinner {
        cb.finish();
    }
    let output = result.with_context(|| format!("Failed to outline '{}'", pdf.display()))?;

    // ── Emit ─────────────────────────────────────────────────────────────
    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if cli.stdout {
        io::stdout()
            .lock()
            .write_all(output.outline().as_bytes())
            .context("Failed to write to stdout")?;
    }

    if (!cli.json && !cli.stdout) || cli.output.is_some() {
        let path = cli
            .output
            .clone()
            .unwrap_or_else(|| default_output_path(&pdf, &config.output_dir));
        write_outline(&path, output.outline())
            .await
            .context("Failed to save outline")?;

        if !cli.quiet {
            let stats = &output.stats;
            eprintln!(
                "{}  {} example(s) used  {}ms  →  {}",
                green("✔"),
                stats.examples_used,
                stats.total_duration_ms,
                bold(&path.display().to_string()),
            );
            eprintln!(
                "   {}",
                dim(&format!(
                    "prompt {} chars  /  reply {} bytes  /  outline {} bytes",
                    stats.prompt_chars, stats.raw_bytes, stats.outline_bytes
                ))
            );
        }
    }

    Ok(())
}

/// Run the pipeline up to `1 + retries` times, retrying only failures a
/// new generation can fix.
async fn generate_with_retries(
    pdf: &Path,
    client: &dyn ModelClient,
    extractor: Arc<dyn TextExtractor>,
    config: &OutlineConfig,
    progress: &dyn OutlineProgressCallback,
    retries: u32,
) -> std::result::Result<OutlineOutput, OutlineError> {
    let mut attempt = 0;
    loop {
        match generate_outline(pdf, client, Arc::clone(&extractor), config, progress).await {
            Err(e) if e.is_retryable() && attempt < retries => {
                attempt += 1;
                warn!("Attempt {}/{} failed: {}", attempt, retries + 1, e);
                eprintln!("{} {}  retrying ({}/{})", red("✗"), e, attempt, retries);
            }
            other => return other,
        }
    }
}

/// Pick Ollama or a hosted provider.
fn build_client(cli: &Cli) -> Result<Box<dyn ModelClient>> {
    match cli.provider.as_deref() {
        None | Some("ollama") | Some("") => Ok(Box::new(
            OllamaClient::new(&cli.host).context("Failed to create Ollama client")?,
        )),
        Some(name) => Ok(Box::new(
            ProviderClient::from_name(name, &cli.model)
                .with_context(|| format!("Failed to create provider '{name}'"))?,
        )),
    }
}

/// Map CLI args to `OutlineConfig`.
async fn build_config(cli: &Cli) -> Result<OutlineConfig> {
    let mut builder = OutlineConfig::builder()
        .model(&cli.model)
        .examples_dir(&cli.examples)
        .output_dir(&cli.output_dir)
        .prompt_budget_chars(cli.budget)
        .max_target_chars(cli.max_target_chars)
        .max_example_source_chars(cli.max_example_chars);

    if let Some(ref path) = cli.instructions {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read instructions from {:?}", path))?;
        builder = builder.instructions(text.trim_end());
    }
    if let Some(t) = cli.temperature {
        builder = builder.temperature(t);
    }

    builder.build().context("Invalid configuration")
}

/// Make sure the pdfium library is on disk before the pipeline binds it.
///
/// On the very first run pdfium (~30 MB) is downloaded to the user cache;
/// later runs only check the path.
fn ensure_pdfium(quiet: bool) -> Result<()> {
    if pdfium_auto::is_pdfium_cached() {
        return Ok(());
    }
    if quiet {
        tokio::task::block_in_place(|| pdfium_auto::ensure_pdfium_library(None))
            .context("Failed to download PDFium engine")?;
        return Ok(());
    }

    let dl_bar = ProgressBar::new(0);
    dl_bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS),
    );
    dl_bar.set_prefix("PDF engine");
    dl_bar.enable_steady_tick(Duration::from_millis(80));

    let bar = dl_bar.clone();
    tokio::task::block_in_place(|| {
        pdfium_auto::ensure_pdfium_library(Some(&|downloaded, total| {
            if let Some(t) = total {
                if bar.length().unwrap_or(0) != t {
                    bar.set_length(t);
                }
            }
            bar.set_position(downloaded);
        }))
    })
    .context("Failed to download PDFium engine")?;

    dl_bar.finish_with_message("ready ✓");
    Ok(())
}
