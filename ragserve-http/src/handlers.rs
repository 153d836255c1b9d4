//! Route handlers.

use axum::Json;
use axum::extract::{Multipart, State};
use axum::response::Html;
use ragserve_core::UploadedFile;
use tracing::info;

use crate::AppState;
use crate::response::{ApiError, ChatRequest, ChatResponse, HealthResponse, UploadResponse};

/// `POST /chat` — answer a query from indexed context.
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let answer = state.engine.answer(&request.query).await?;
    Ok(Json(ChatResponse { response: answer.response, sources: answer.sources }))
}

/// `POST /upload` — index a multipart batch of files.
///
/// Every field with a filename is treated as an uploaded file; other
/// fields are ignored. An upload with no files is a 400.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("malformed multipart body: {e}")))?
    {
        let filename = match field.file_name() {
            Some(name) => name.to_string(),
            None => continue,
        };
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("failed to read '{filename}': {e}")))?;
        files.push(UploadedFile { filename, content_type, bytes: bytes.to_vec() });
    }

    info!(files = files.len(), "received upload");
    let report = state.engine.ingest(&files).await?;

    Ok(Json(UploadResponse {
        message: "documents uploaded and indexed successfully".to_string(),
        indexed_documents: report.documents,
        indexed_total: report.indexed_total,
    }))
}

/// `GET /health` — liveness probe.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok", profile: state.engine.profile().to_string() })
}

/// `GET /` — minimal landing page.
pub async fn index() -> Html<&'static str> {
    Html(
        "<!doctype html><html><head><title>ragserve</title></head>\
         <body><h1>ragserve</h1>\
         <p>POST files to <code>/upload</code>, then query <code>/chat</code>.</p>\
         </body></html>",
    )
}
