//! HTTP boundary tests against the real router with mock providers.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use ragserve_core::{
    EmbedPurpose, EmbeddingProvider, GenerationModel, InMemoryStore, Profile, RagEngine,
    SearchResult,
};
use ragserve_http::app;
use tower::ServiceExt;

const DIMS: usize = 32;

struct TokenEmbedding;

#[async_trait]
impl EmbeddingProvider for TokenEmbedding {
    async fn embed(&self, text: &str, _purpose: EmbedPurpose) -> ragserve_core::Result<Vec<f32>> {
        let mut vector = vec![0.0f32; DIMS];
        for token in text.split_whitespace() {
            let mut hasher = DefaultHasher::new();
            token.to_ascii_lowercase().hash(&mut hasher);
            vector[(hasher.finish() as usize) % DIMS] += 1.0;
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        DIMS
    }
}

struct EchoGeneration;

#[async_trait]
impl GenerationModel for EchoGeneration {
    async fn generate(
        &self,
        _query: &str,
        context: &[SearchResult],
    ) -> ragserve_core::Result<String> {
        let texts: Vec<&str> = context.iter().map(|r| r.chunk.text.as_str()).collect();
        Ok(format!("from context: {}", texts.join(" / ")))
    }
}

fn test_app() -> Router {
    let engine = RagEngine::builder()
        .profile(Profile::SelfHosted)
        .embedder(Arc::new(TokenEmbedding))
        .store(Arc::new(InMemoryStore::new()))
        .generator(Arc::new(EchoGeneration))
        .build()
        .unwrap();
    app(Arc::new(engine))
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn chat_request(query: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(format!(r#"{{"query":{}}}"#, serde_json::json!(query))))
        .unwrap()
}

const BOUNDARY: &str = "ragserve-test-boundary";

fn upload_request(parts: &[(&str, &str, &str)]) -> Request<Body> {
    let mut body = String::new();
    for (filename, content_type, content) in parts {
        body.push_str(&format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"files\"; filename=\"{filename}\"\r\n\
             Content-Type: {content_type}\r\n\r\n{content}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn health_reports_profile() {
    let response = test_app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["profile"], "self-hosted");
}

#[tokio::test]
async fn chat_before_upload_is_conflict() {
    let response = test_app().oneshot(chat_request("anything")).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let json = body_json(response).await;
    assert_eq!(json["kind"], "not_initialized");
    assert!(json["error"].as_str().unwrap().contains("not initialized"));
}

#[tokio::test]
async fn upload_then_chat_round_trip() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(upload_request(&[(
            "manual.txt",
            "text/plain",
            "the maintenance hatch opens with the hexagonal key",
        )]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["indexed_documents"], 1);
    assert_eq!(json["indexed_total"], 1);
    assert!(json["message"].as_str().unwrap().contains("indexed"));

    let response = app.oneshot(chat_request("how do I open the hatch")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert!(json["response"].as_str().unwrap().contains("hexagonal key"));
    assert_eq!(json["sources"][0], "manual.txt");
}

#[tokio::test]
async fn upload_without_files_is_bad_request() {
    let response = test_app().oneshot(upload_request(&[])).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["kind"], "load");
}

#[tokio::test]
async fn unsupported_upload_is_bad_request() {
    let response = test_app()
        .oneshot(upload_request(&[("photo.png", "image/png", "not really a png")]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["kind"], "load");
}

#[tokio::test]
async fn malformed_chat_body_is_a_client_error() {
    let request = Request::builder()
        .method("POST")
        .uri("/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = test_app().oneshot(request).await.unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn index_serves_a_page() {
    let response = test_app()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
