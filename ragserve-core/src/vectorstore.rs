//! Vector store trait: the capability interface over external vector
//! databases.

use async_trait::async_trait;

use crate::document::{Chunk, SearchResult};
use crate::error::Result;

/// A storage backend for embedded chunks with similarity search.
///
/// Implementations are network clients for external services; failures
/// surface immediately as [`RagError::Store`](crate::RagError::Store) —
/// no retries, no local caching.
///
/// # Example
///
/// ```rust,ignore
/// use ragserve_core::{InMemoryStore, VectorStore};
///
/// let store = InMemoryStore::new();
/// store.ensure_collection("documents", 1024).await?;
/// store.upsert("documents", &chunks).await?;
/// let hits = store.search("documents", &query_embedding, 5).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create a named collection if it does not exist. No-op otherwise.
    async fn ensure_collection(&self, name: &str, dimensions: usize) -> Result<()>;

    /// Upsert chunks into a collection. Embeddings must already be set.
    /// Chunks with the same id overwrite previous entries.
    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()>;

    /// Return the `top_k` chunks most similar to `embedding`, ordered by
    /// descending score.
    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>>;

    /// Number of chunks currently stored in a collection.
    async fn count(&self, collection: &str) -> Result<usize>;
}
