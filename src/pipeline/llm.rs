//! Model client seam: the interface the pipeline uses to talk to a model.
//!
//! The model-serving process is caller-owned state. The pipeline never
//! starts it or assumes it is up; it receives a [`ModelClient`] and calls
//! [`ModelClient::health_check`] and [`ModelClient::list_models`]
//! explicitly before generating, so a stopped server or a missing model
//! surfaces as `Connection` / `ModelNotFound` rather than an opaque
//! failure halfway through generation.
//!
//! ## No hidden retries
//!
//! Generation is non-deterministic: a retry produces a *different* outline.
//! Clients therefore make exactly one attempt per call. Retrying is a
//! caller decision (see `--retries` in the CLI), logged at each attempt.
//!
//! Two implementations ship with the crate:
//! - [`crate::pipeline::ollama::OllamaClient`]: a local Ollama server
//! - [`ProviderClient`]: any hosted provider supported by `edgequake-llm`

use crate::error::OutlineError;
use crate::progress::OutlineProgressCallback;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Per-request generation knobs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateOptions {
    /// Sampling temperature; provider default when `None`.
    pub temperature: Option<f32>,
}

/// Request/response interface to a model-serving collaborator.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Human-readable endpoint description for logs and errors.
    fn endpoint(&self) -> String;

    /// Check that the server is reachable. Fails with `Connection`.
    async fn health_check(&self) -> Result<(), OutlineError>;

    /// Names of the models the server can run.
    async fn list_models(&self) -> Result<BTreeSet<String>, OutlineError>;

    /// Generate a completion for `prompt`, buffered to completion.
    ///
    /// `progress` receives one `on_model_chunk` per streamed chunk when the
    /// client streams.
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerateOptions,
        progress: &dyn OutlineProgressCallback,
    ) -> Result<String, OutlineError>;
}

/// True when `available` names the requested `model`.
///
/// A bare name matches its `:latest` tag, the way `ollama run llama3.2`
/// resolves to `llama3.2:latest`.
pub fn model_matches(requested: &str, available: &str) -> bool {
    requested == available
        || (!requested.contains(':') && available == format!("{requested}:latest"))
}

/// Health-check the server and confirm `model` is installed.
pub async fn ensure_model_available(
    client: &dyn ModelClient,
    model: &str,
) -> Result<(), OutlineError> {
    client.health_check().await?;
    let models = client.list_models().await?;
    if models.iter().any(|m| model_matches(model, m)) {
        debug!("Model '{}' available at {}", model, client.endpoint());
        Ok(())
    } else {
        Err(OutlineError::ModelNotFound {
            model: model.to_string(),
            available: models.into_iter().collect(),
        })
    }
}

// ── edgequake-llm adapter ────────────────────────────────────────────────────

/// [`ModelClient`] over an `edgequake-llm` provider.
///
/// Hosted providers have no "installed models" notion the tool can query,
/// so the adapter reports exactly its configured model as available.
pub struct ProviderClient {
    provider: Arc<dyn LLMProvider>,
    provider_name: String,
    model: String,
}

impl ProviderClient {
    /// Wrap a pre-built provider serving `model`.
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        provider_name: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            provider_name: provider_name.into(),
            model: model.into(),
        }
    }

    /// Build a provider by name (`openai`, `anthropic`, `gemini`, …).
    ///
    /// The provider reads its API key from the environment.
    pub fn from_name(provider_name: &str, model: &str) -> Result<Self, OutlineError> {
        let provider = ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
            OutlineError::InvalidConfig(format!("provider '{provider_name}' not configured: {e}"))
        })?;
        Ok(Self::new(provider, provider_name, model))
    }
}

#[async_trait]
impl ModelClient for ProviderClient {
    fn endpoint(&self) -> String {
        format!("provider '{}'", self.provider_name)
    }

    async fn health_check(&self) -> Result<(), OutlineError> {
        Ok(())
    }

    async fn list_models(&self) -> Result<BTreeSet<String>, OutlineError> {
        Ok(BTreeSet::from([self.model.clone()]))
    }

    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerateOptions,
        progress: &dyn OutlineProgressCallback,
    ) -> Result<String, OutlineError> {
        if !model_matches(model, &self.model) {
            return Err(OutlineError::ModelNotFound {
                model: model.to_string(),
                available: vec![self.model.clone()],
            });
        }

        let start = Instant::now();
        let messages = vec![ChatMessage::user(prompt)];
        let completion = CompletionOptions {
            temperature: options.temperature,
            ..Default::default()
        };

        let response = self
            .provider
            .chat(&messages, Some(&completion))
            .await
            .map_err(|e| OutlineError::ModelApi {
                message: format!("{}: {}", self.provider_name, e),
            })?;

        info!(
            "{}: {} input tokens, {} output tokens, {:?}",
            self.provider_name,
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );
        progress.on_model_chunk(response.content.len());
        Ok(response.content)
    }
}
