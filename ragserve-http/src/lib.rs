//! HTTP boundary for the `ragserve` backend.
//!
//! Marshals JSON and multipart requests into
//! [`RagEngine`](ragserve_core::RagEngine) calls and maps typed errors to
//! status codes. Routes:
//!
//! | Route | Method | Body |
//! |---|---|---|
//! | `/chat` | POST | `{"query": "..."}` |
//! | `/upload` | POST | multipart file list |
//! | `/health` | GET | — |
//! | `/` | GET | — (minimal HTML page) |

pub mod handlers;
pub mod response;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use ragserve_core::RagEngine;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Maximum accepted upload size.
const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// The engine every handler calls into.
    pub engine: Arc<RagEngine>,
}

/// Build the application router around an engine.
pub fn app(engine: Arc<RagEngine>) -> Router {
    Router::new()
        .route("/chat", post(handlers::chat))
        .route("/upload", post(handlers::upload))
        .route("/health", get(handlers::health))
        .route("/", get(handlers::index))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        // The original deployment allowed all origins; restrict per
        // deployment if this ever becomes multi-tenant.
        .layer(CorsLayer::permissive())
        .with_state(AppState { engine })
}
