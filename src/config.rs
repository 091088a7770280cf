//! Configuration types for PDF-to-outline generation.
//!
//! All tunable behaviour lives in [`OutlineConfig`], built via its
//! [`OutlineConfigBuilder`]. The model client is *not* part of the config:
//! it is process state owned by the caller and passed into
//! [`crate::generate::generate_outline`] explicitly.

use crate::error::OutlineError;
use crate::prompts::{DEFAULT_INSTRUCTIONS, FINAL_DIRECTIVE, TARGET_LABEL};
use std::path::PathBuf;

/// Model used when the caller does not pick one.
pub const DEFAULT_MODEL: &str = "llama3.2:3b";

/// Default address of a local Ollama server.
pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";

/// Configuration for one outline generation run.
///
/// # Example
/// ```rust
/// use edgequake_pdf2outline::OutlineConfig;
///
/// let config = OutlineConfig::builder()
///     .model("llama3.2:1b")
///     .examples_dir("my_examples")
///     .prompt_budget_chars(24_000)
///     .build()
///     .unwrap();
/// assert_eq!(config.model, "llama3.2:1b");
/// ```
#[derive(Debug, Clone)]
pub struct OutlineConfig {
    /// Model name sent to the model client. Default: `llama3.2:3b`.
    pub model: String,

    /// Directory holding `<base>.pdf` / `<base>_outline.tex` example pairs.
    /// Default: `examples`.
    pub examples_dir: PathBuf,

    /// Directory for default output paths. Default: `output`.
    pub output_dir: PathBuf,

    /// Custom prompt instructions. If None, uses the built-in default.
    pub instructions: Option<String>,

    /// Upper bound on the assembled prompt, in chars. Default: 16 000.
    ///
    /// Small local models are usually served with a 4–8k token context;
    /// 16k chars stays inside that for Latin-script text.
    pub prompt_budget_chars: usize,

    /// Target text is cut to this many chars before prompt building.
    /// Default: 6 000.
    ///
    /// An outline only needs the document's shape, and the opening pages
    /// usually carry the table of contents and the first headings.
    pub max_target_chars: usize,

    /// Each example's source text is cut to this many chars. Default: 2 000.
    pub max_example_source_chars: usize,

    /// Sampling temperature forwarded to the model, if set.
    pub temperature: Option<f32>,
}

impl Default for OutlineConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            examples_dir: PathBuf::from("examples"),
            output_dir: PathBuf::from("output"),
            instructions: None,
            prompt_budget_chars: 16_000,
            max_target_chars: 6_000,
            max_example_source_chars: 2_000,
            temperature: None,
        }
    }
}

impl OutlineConfig {
    /// Create a new builder for `OutlineConfig`.
    pub fn builder() -> OutlineConfigBuilder {
        OutlineConfigBuilder {
            config: Self::default(),
        }
    }

    /// Instructions in effect for this run.
    pub fn instructions(&self) -> &str {
        self.instructions.as_deref().unwrap_or(DEFAULT_INSTRUCTIONS)
    }
}

/// Builder for [`OutlineConfig`].
#[derive(Debug)]
pub struct OutlineConfigBuilder {
    config: OutlineConfig,
}

impl OutlineConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn examples_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.examples_dir = dir.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn instructions(mut self, text: impl Into<String>) -> Self {
        self.config.instructions = Some(text.into());
        self
    }

    pub fn prompt_budget_chars(mut self, n: usize) -> Self {
        self.config.prompt_budget_chars = n;
        self
    }

    pub fn max_target_chars(mut self, n: usize) -> Self {
        self.config.max_target_chars = n.max(1);
        self
    }

    pub fn max_example_source_chars(mut self, n: usize) -> Self {
        self.config.max_example_source_chars = n;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<OutlineConfig, OutlineError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(OutlineError::InvalidConfig(
                "Model name must not be empty".into(),
            ));
        }
        let overhead = c.instructions().chars().count()
            + TARGET_LABEL.chars().count()
            + FINAL_DIRECTIVE.chars().count();
        if c.prompt_budget_chars <= overhead {
            return Err(OutlineError::InvalidConfig(format!(
                "Prompt budget of {} chars leaves no room for document text \
                 (instructions and directive need {})",
                c.prompt_budget_chars, overhead
            )));
        }
        Ok(self.config)
    }
}
