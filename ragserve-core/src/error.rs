//! Error types for the `ragserve-core` crate.

use thiserror::Error;

/// Errors that can occur while loading, indexing, or answering.
///
/// Every variant maps to a stable [`kind`](RagError::kind) string so the
/// HTTP boundary can translate errors into status codes without matching
/// on message text.
#[derive(Debug, Error)]
pub enum RagError {
    /// A query arrived before any documents were uploaded.
    #[error("index is not initialized; upload documents first")]
    NotInitialized,

    /// An uploaded file could not be converted into a document.
    #[error("document load error: {0}")]
    Load(String),

    /// An embedding service call failed.
    #[error("embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A vector store call failed.
    #[error("vector store error ({backend}): {message}")]
    Store {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A generation model call failed.
    #[error("generation error ({model}): {message}")]
    Generation {
        /// The generation model that produced the error.
        model: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl RagError {
    /// Stable machine-readable kind for this error.
    pub fn kind(&self) -> &'static str {
        match self {
            RagError::NotInitialized => "not_initialized",
            RagError::Load(_) => "load",
            RagError::Embedding { .. } => "embedding",
            RagError::Store { .. } => "store",
            RagError::Generation { .. } => "generation",
            RagError::Config(_) => "config",
        }
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
