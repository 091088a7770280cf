#![allow(dead_code)]
//! # Common Test Utilities
//!
//! Stub collaborators for the pipeline: a text extractor serving canned
//! text by file name, and a model client replaying scripted replies. Both
//! record what they were asked so tests can inspect the prompt.

use async_trait::async_trait;
use edgequake_pdf2outline::{
    GenerateOptions, ModelClient, OutlineError, OutlineProgressCallback, TextExtractor,
};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once, RwLock};

static INIT: Once = Once::new();

/// Initializes the tracing subscriber once per test binary.
pub fn setup_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Write a file that passes the `%PDF` magic check.
pub fn write_pdf(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"%PDF-1.4\n% stub\n").unwrap();
    path
}

pub fn write_text(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, text).unwrap();
    path
}

// --- Stub text extractor ---

/// Serves canned text keyed by file name; unknown files fail to extract.
#[derive(Default)]
pub struct StubExtractor {
    texts: HashMap<String, String>,
    pub calls: RwLock<Vec<String>>,
}

impl StubExtractor {
    pub fn new(texts: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            texts: texts
                .iter()
                .map(|(name, text)| (name.to_string(), text.to_string()))
                .collect(),
            calls: RwLock::new(Vec::new()),
        })
    }
}

impl TextExtractor for StubExtractor {
    fn extract(&self, pdf_path: &Path) -> Result<String, OutlineError> {
        let name = pdf_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.calls.write().unwrap().push(name.clone());
        self.texts
            .get(&name)
            .cloned()
            .ok_or_else(|| OutlineError::ExtractionFailed {
                path: pdf_path.to_path_buf(),
                detail: "no canned text".to_string(),
            })
    }
}

// --- Stub model client ---

/// Replays `replies` in order (the last one repeats) and records prompts.
pub struct StubClient {
    pub models: Vec<String>,
    pub reachable: bool,
    replies: RwLock<Vec<Result<String, String>>>,
    pub prompts: RwLock<Vec<String>>,
}

impl StubClient {
    pub fn new(models: &[&str], replies: Vec<Result<&str, &str>>) -> Self {
        Self {
            models: models.iter().map(|m| m.to_string()).collect(),
            reachable: true,
            replies: RwLock::new(
                replies
                    .into_iter()
                    .map(|r| r.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
            prompts: RwLock::new(Vec::new()),
        }
    }

    pub fn replying(reply: &str) -> Self {
        Self::new(&["llama3.2:3b"], vec![Ok(reply)])
    }

    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::replying("")
        }
    }

    pub fn last_prompt(&self) -> String {
        self.prompts.read().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl ModelClient for StubClient {
    fn endpoint(&self) -> String {
        "stub://model".to_string()
    }

    async fn health_check(&self) -> Result<(), OutlineError> {
        if self.reachable {
            Ok(())
        } else {
            Err(OutlineError::Connection {
                url: self.endpoint(),
                reason: "connection refused".to_string(),
            })
        }
    }

    async fn list_models(&self) -> Result<BTreeSet<String>, OutlineError> {
        Ok(self.models.iter().cloned().collect())
    }

    async fn generate(
        &self,
        _model: &str,
        prompt: &str,
        _options: &GenerateOptions,
        progress: &dyn OutlineProgressCallback,
    ) -> Result<String, OutlineError> {
        self.prompts.write().unwrap().push(prompt.to_string());
        let mut replies = self.replies.write().unwrap();
        let reply = if replies.len() > 1 {
            replies.remove(0)
        } else {
            replies
                .first()
                .cloned()
                .unwrap_or_else(|| Err("no scripted reply".to_string()))
        };
        match reply {
            Ok(text) => {
                progress.on_model_chunk(text.len());
                Ok(text)
            }
            Err(message) => Err(OutlineError::ModelApi { message }),
        }
    }
}
