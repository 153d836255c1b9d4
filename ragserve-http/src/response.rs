//! Request/response types and error → status-code mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ragserve_core::RagError;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// `POST /chat` request body.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    /// The natural-language query.
    pub query: String,
}

/// `POST /chat` success body.
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    /// The answer text.
    pub response: String,
    /// Source filenames the answer was drawn from.
    pub sources: Vec<String>,
}

/// `POST /upload` success body.
#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    /// Human-readable confirmation.
    pub message: String,
    /// Documents indexed from this upload.
    pub indexed_documents: usize,
    /// Total chunks in the index after this upload.
    pub indexed_total: usize,
}

/// `GET /health` body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the service is up.
    pub status: &'static str,
    /// The active deployment profile.
    pub profile: String,
}

/// An error response: HTTP status plus an `{"error", "kind"}` JSON body.
///
/// Failed requests never crash the service; every engine error converts
/// into one of these.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl ApiError {
    /// A 400 for requests that fail before reaching the engine
    /// (e.g. undecodable multipart bodies).
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, kind: "bad_request", message: message.into() }
    }
}

impl From<RagError> for ApiError {
    fn from(err: RagError) -> Self {
        let status = match &err {
            RagError::NotInitialized => StatusCode::CONFLICT,
            RagError::Load(_) => StatusCode::BAD_REQUEST,
            RagError::Embedding { .. } | RagError::Store { .. } | RagError::Generation { .. } => {
                StatusCode::BAD_GATEWAY
            }
            RagError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self { status, kind: err.kind(), message: err.to_string() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.message, "kind": self.kind }));
        (self.status, body).into_response()
    }
}
