//! Embedding provider trait for turning text into vectors.

use async_trait::async_trait;

use crate::error::Result;

/// What an embedding will be used for.
///
/// Retrieval embedding models distinguish stored passages from queries
/// and may produce different vectors for each; providers that do not care
/// can ignore this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedPurpose {
    /// Text being ingested into the index.
    Passage,
    /// A query searching the index.
    Query,
}

/// A service that produces fixed-size embedding vectors from text.
///
/// Implementations wrap external embedding APIs behind a unified async
/// interface. The default [`embed_batch`](EmbeddingProvider::embed_batch)
/// embeds inputs one at a time; backends with native batching should
/// override it.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str, purpose: EmbedPurpose) -> Result<Vec<f32>>;

    /// Embed a batch of texts, preserving order.
    async fn embed_batch(&self, texts: &[&str], purpose: EmbedPurpose) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text, purpose).await?);
        }
        Ok(embeddings)
    }

    /// The dimensionality of vectors this provider produces.
    fn dimensions(&self) -> usize;
}
