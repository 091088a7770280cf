//! # Ollama Client Tests
//!
//! Drive `OllamaClient` against a `wiremock` server speaking the Ollama
//! HTTP API: health check, model listing, streamed generation and the
//! error mapping for each.

mod common;

use common::{setup_tracing, write_pdf, write_text, StubExtractor};
use edgequake_pdf2outline::{
    generate_outline, GenerateOptions, ModelClient, NoopProgressCallback, OllamaClient,
    OutlineConfig, OutlineError, OutlineProgressCallback,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TAGS: &str = r#"{"models":[{"name":"llama3.2:3b","size":2019393189},{"name":"mistral:latest","size":4113301824}]}"#;

fn ndjson(lines: &[serde_json::Value]) -> String {
    lines
        .iter()
        .map(|l| format!("{l}\n"))
        .collect::<Vec<_>>()
        .concat()
}

async fn mount_tags(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_string(TAGS))
        .mount(server)
        .await;
}

async fn mount_version(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/version"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "version": "0.5.7" })))
        .mount(server)
        .await;
}

#[derive(Default)]
struct ChunkCounter {
    chunks: AtomicUsize,
    bytes: AtomicUsize,
}

impl OutlineProgressCallback for ChunkCounter {
    fn on_model_chunk(&self, bytes: usize) {
        self.chunks.fetch_add(1, Ordering::SeqCst);
        self.bytes.fetch_add(bytes, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn test_health_check_succeeds_on_version() {
    // --- 1. Arrange ---
    setup_tracing();
    let server = MockServer::start().await;
    mount_version(&server).await;
    let client = OllamaClient::new(server.uri()).unwrap();

    // --- 2. Act ---
    let result = client.health_check().await;

    // --- 3. Assert ---
    assert!(result.is_ok(), "health check failed: {:?}", result.err());
}

#[tokio::test]
async fn test_health_check_rejects_error_status() {
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/version"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let client = OllamaClient::new(server.uri()).unwrap();

    let err = client.health_check().await.unwrap_err();

    assert!(matches!(err, OutlineError::Connection { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_list_models_reads_tags() {
    setup_tracing();
    let server = MockServer::start().await;
    mount_tags(&server).await;
    let client = OllamaClient::new(server.uri()).unwrap();

    let models = client.list_models().await.unwrap();

    let names: Vec<_> = models.iter().map(String::as_str).collect();
    assert_eq!(names, ["llama3.2:3b", "mistral:latest"]);
}

#[tokio::test]
async fn test_generate_buffers_the_stream() {
    // --- 1. Arrange ---
    setup_tracing();
    let server = MockServer::start().await;
    let body = ndjson(&[
        json!({ "model": "llama3.2:3b", "response": "\\documentclass{article}\n", "done": false }),
        json!({ "model": "llama3.2:3b", "response": "\\begin{document}\n", "done": false }),
        json!({ "model": "llama3.2:3b", "response": "\\end{document}", "done": false }),
        json!({ "model": "llama3.2:3b", "response": "", "done": true, "eval_count": 21 }),
    ]);
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({
            "model": "llama3.2:3b",
            "prompt": "Outline this",
            "stream": true,
            "options": { "temperature": 0.2 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(&server)
        .await;
    let client = OllamaClient::new(server.uri()).unwrap();
    let progress = ChunkCounter::default();
    let options = GenerateOptions {
        temperature: Some(0.2),
    };

    // --- 2. Act ---
    let text = client
        .generate("llama3.2:3b", "Outline this", &options, &progress)
        .await
        .unwrap();

    // --- 3. Assert ---
    assert_eq!(
        text,
        "\\documentclass{article}\n\\begin{document}\n\\end{document}"
    );
    assert_eq!(progress.chunks.load(Ordering::SeqCst), 3);
    assert_eq!(progress.bytes.load(Ordering::SeqCst), text.len());
}

#[tokio::test]
async fn test_generate_404_is_model_not_found() {
    setup_tracing();
    let server = MockServer::start().await;
    mount_tags(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({ "error": "model 'phi3' not found, try pulling it first" })),
        )
        .mount(&server)
        .await;
    let client = OllamaClient::new(server.uri()).unwrap();

    let err = client
        .generate("phi3", "x", &GenerateOptions::default(), &NoopProgressCallback)
        .await
        .unwrap_err();

    match err {
        OutlineError::ModelNotFound { model, available } => {
            assert_eq!(model, "phi3");
            assert_eq!(available, vec!["llama3.2:3b", "mistral:latest"]);
        }
        other => panic!("expected ModelNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_generate_server_error_is_model_api() {
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "error": "llama runner crashed" })),
        )
        .mount(&server)
        .await;
    let client = OllamaClient::new(server.uri()).unwrap();

    let err = client
        .generate("llama3.2:3b", "x", &GenerateOptions::default(), &NoopProgressCallback)
        .await
        .unwrap_err();

    match err {
        OutlineError::ModelApi { message } => assert!(message.contains("llama runner crashed")),
        other => panic!("expected ModelApi, got {other:?}"),
    }
}

#[tokio::test]
async fn test_error_inside_stream_is_model_api() {
    setup_tracing();
    let server = MockServer::start().await;
    let body = ndjson(&[
        json!({ "response": "\\documentclass", "done": false }),
        json!({ "error": "context window exceeded" }),
    ]);
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;
    let client = OllamaClient::new(server.uri()).unwrap();

    let err = client
        .generate("llama3.2:3b", "x", &GenerateOptions::default(), &NoopProgressCallback)
        .await
        .unwrap_err();

    assert!(
        matches!(err, OutlineError::ModelApi { ref message } if message == "context window exceeded"),
        "got {err:?}"
    );
}

#[tokio::test]
async fn test_pipeline_against_mock_ollama() {
    // --- 1. Arrange ---
    setup_tracing();
    let server = MockServer::start().await;
    mount_version(&server).await;
    mount_tags(&server).await;
    let body = ndjson(&[
        json!({ "response": "Here is the outline:\n```latex\n\\documentclass{article}\n", "done": false }),
        json!({ "response": "\\begin{document}\n\\section{Hello World}\n", "done": false }),
        json!({ "response": "\\end{document}\n```", "done": false }),
        json!({ "response": "", "done": true }),
    ]);
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({ "model": "llama3.2:3b", "stream": true })))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let pdf = write_pdf(dir.path(), "hello.pdf");
    let examples = dir.path().join("examples");
    std::fs::create_dir(&examples).unwrap();
    write_text(&examples, "sample_outline.tex", "\\section{Sample}\n");
    let config = OutlineConfig::builder()
        .examples_dir(&examples)
        .build()
        .unwrap();
    let client = OllamaClient::new(server.uri()).unwrap();

    // --- 2. Act ---
    let output = generate_outline(
        &pdf,
        &client,
        StubExtractor::new(&[("hello.pdf", "Hello World")]),
        &config,
        &NoopProgressCallback,
    )
    .await
    .unwrap();

    // --- 3. Assert ---
    assert_eq!(
        output.outline(),
        "\\documentclass{article}\n\\begin{document}\n\\section{Hello World}\n\\end{document}\n"
    );
    assert_eq!(output.stats.examples_used, 1);
    assert!(output.result.raw_text.starts_with("Here is the outline:"));
}

#[tokio::test]
async fn test_pipeline_reports_missing_model_from_tags() {
    setup_tracing();
    let server = MockServer::start().await;
    mount_version(&server).await;
    mount_tags(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let pdf = write_pdf(dir.path(), "hello.pdf");
    let config = OutlineConfig::builder()
        .model("qwen2.5:7b")
        .examples_dir(dir.path().join("examples"))
        .build()
        .unwrap();
    let client = OllamaClient::new(server.uri()).unwrap();

    let err = generate_outline(
        &pdf,
        &client,
        StubExtractor::new(&[("hello.pdf", "Hello World")]),
        &config,
        &NoopProgressCallback,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, OutlineError::ModelNotFound { .. }), "got {err:?}");
}
