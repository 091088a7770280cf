//! HTTP client for a local Ollama server.
//!
//! Three endpoints are used:
//!
//! | call | endpoint |
//! |------|----------|
//! | health check | `GET /api/version` |
//! | installed models | `GET /api/tags` |
//! | generation | `POST /api/generate` (`stream: true`) |
//!
//! Generation streams newline-delimited JSON. Each line carries a
//! `response` fragment; the last one has `done: true`. The client buffers
//! the fragments into one string and reports every fragment to the
//! progress callback, which keeps a spinner alive on slow CPU-only
//! machines without exposing partial text to the pipeline.

use crate::config::DEFAULT_OLLAMA_HOST;
use crate::error::OutlineError;
use crate::pipeline::llm::{GenerateOptions, ModelClient};
use crate::progress::OutlineProgressCallback;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Environment variable naming the server, as the `ollama` CLI reads it.
pub const OLLAMA_HOST_ENV: &str = "OLLAMA_HOST";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<RequestOptions>,
}

#[derive(Serialize)]
struct RequestOptions {
    temperature: f32,
}

#[derive(Deserialize, Debug)]
struct GenerateChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    eval_count: Option<u64>,
}

#[derive(Deserialize, Debug)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Deserialize, Debug)]
struct ModelTag {
    name: String,
}

#[derive(Deserialize, Debug)]
struct VersionResponse {
    version: String,
}

#[derive(Deserialize, Debug)]
struct ErrorBody {
    error: String,
}

/// [`ModelClient`] for an Ollama server.
#[derive(Clone, Debug)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
}

impl OllamaClient {
    /// Client for the server at `host` (`http://host:port`; a bare
    /// `host:port` gets `http://`).
    pub fn new(host: impl AsRef<str>) -> Result<Self, OutlineError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| OutlineError::InvalidConfig(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: normalise_host(host.as_ref()),
        })
    }

    /// Client for `$OLLAMA_HOST`, or the default local server.
    pub fn from_env() -> Result<Self, OutlineError> {
        match std::env::var(OLLAMA_HOST_ENV) {
            Ok(host) if !host.trim().is_empty() => Self::new(host.trim()),
            _ => Self::new(DEFAULT_OLLAMA_HOST),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn connection_error(&self, err: reqwest::Error) -> OutlineError {
        OutlineError::Connection {
            url: self.base_url.clone(),
            reason: err.to_string(),
        }
    }

    fn request_error(&self, err: reqwest::Error) -> OutlineError {
        if err.is_connect() || err.is_timeout() {
            self.connection_error(err)
        } else {
            OutlineError::ModelApi {
                message: err.to_string(),
            }
        }
    }

    /// Installed models, or none when the listing itself fails.
    async fn installed_or_empty(&self) -> Vec<String> {
        self.list_models()
            .await
            .map(|m| m.into_iter().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ModelClient for OllamaClient {
    fn endpoint(&self) -> String {
        self.base_url.clone()
    }

    async fn health_check(&self) -> Result<(), OutlineError> {
        let response = self
            .client
            .get(self.url("/api/version"))
            .send()
            .await
            .map_err(|e| self.connection_error(e))?;

        if !response.status().is_success() {
            return Err(OutlineError::Connection {
                url: self.base_url.clone(),
                reason: format!("health check returned HTTP {}", response.status()),
            });
        }
        let version: VersionResponse = response.json().await.map_err(|e| {
            OutlineError::Connection {
                url: self.base_url.clone(),
                reason: format!("not an Ollama server: {e}"),
            }
        })?;
        debug!("Ollama {} at {}", version.version, self.base_url);
        Ok(())
    }

    async fn list_models(&self) -> Result<BTreeSet<String>, OutlineError> {
        let response = self
            .client
            .get(self.url("/api/tags"))
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OutlineError::ModelApi {
                message: format!("listing models returned HTTP {status}: {}", error_text(&body)),
            });
        }
        let tags: TagsResponse = response.json().await.map_err(|e| OutlineError::ModelApi {
            message: format!("undecodable model list: {e}"),
        })?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerateOptions,
        progress: &dyn OutlineProgressCallback,
    ) -> Result<String, OutlineError> {
        let start = Instant::now();
        let request = GenerateRequest {
            model,
            prompt,
            stream: true,
            options: options
                .temperature
                .map(|temperature| RequestOptions { temperature }),
        };

        let response = self
            .client
            .post(self.url("/api/generate"))
            .json(&request)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(OutlineError::ModelNotFound {
                model: model.to_string(),
                available: self.installed_or_empty().await,
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OutlineError::ModelApi {
                message: format!("generation returned HTTP {status}: {}", error_text(&body)),
            });
        }

        let mut stream = response.bytes_stream();
        let mut pending: Vec<u8> = Vec::new();
        let mut assembler = ChunkAssembler::default();

        while let Some(bytes) = stream.next().await {
            let bytes = bytes.map_err(|e| self.request_error(e))?;
            pending.extend_from_slice(&bytes);
            while let Some(newline) = pending.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = pending.drain(..=newline).collect();
                assembler.push_line(&line, progress)?;
            }
        }
        if !pending.is_empty() {
            assembler.push_line(&pending, progress)?;
        }

        let text = assembler.finish()?;
        info!(
            "{}: {} chars generated in {:?}",
            model,
            text.chars().count(),
            start.elapsed()
        );
        Ok(text)
    }
}

/// Accumulates NDJSON generation chunks into the full reply.
#[derive(Default)]
struct ChunkAssembler {
    text: String,
    done: bool,
    chunks: usize,
}

impl ChunkAssembler {
    fn push_line(
        &mut self,
        line: &[u8],
        progress: &dyn OutlineProgressCallback,
    ) -> Result<(), OutlineError> {
        let line = String::from_utf8_lossy(line);
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }
        let chunk: GenerateChunk =
            serde_json::from_str(line).map_err(|e| OutlineError::ModelApi {
                message: format!("undecodable stream chunk: {e}"),
            })?;
        if let Some(error) = chunk.error {
            return Err(OutlineError::ModelApi { message: error });
        }
        if !chunk.response.is_empty() {
            progress.on_model_chunk(chunk.response.len());
            self.text.push_str(&chunk.response);
        }
        self.chunks += 1;
        if chunk.done {
            self.done = true;
            if let Some(tokens) = chunk.eval_count {
                debug!("Generation done after {} chunks, {} tokens", self.chunks, tokens);
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<String, OutlineError> {
        if !self.done {
            return Err(OutlineError::ModelApi {
                message: format!("stream ended after {} chunks without completion", self.chunks),
            });
        }
        Ok(self.text)
    }
}

fn normalise_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{host}")
    }
}

/// The `error` field of an Ollama error body, or the body itself.
fn error_text(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| body.trim().to_string())
}
