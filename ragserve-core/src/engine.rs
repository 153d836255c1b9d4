//! The RAG engine: ingestion and query routing.
//!
//! [`RagEngine`] composes an [`EmbeddingProvider`], a [`VectorStore`], a
//! [`TextSplitter`], an optional [`GenerationModel`], and the
//! [`IndexState`] guard. Construct one via [`RagEngine::builder()`].
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ragserve_core::{Profile, RagEngine};
//!
//! let engine = RagEngine::builder()
//!     .profile(Profile::SelfHosted)
//!     .embedder(Arc::new(embedder))
//!     .store(Arc::new(store))
//!     .generator(Arc::new(model))
//!     .build()?;
//! ```

use std::sync::Arc;

use tracing::{error, info};

use crate::chunk::TextSplitter;
use crate::config::{Profile, ServiceConfig};
use crate::document::{Answer, Chunk, SearchResult};
use crate::embedding::{EmbedPurpose, EmbeddingProvider};
use crate::error::{RagError, Result};
use crate::generation::GenerationModel;
use crate::loader::{UploadedFile, load_documents};
use crate::state::{IndexState, IndexStatus};
use crate::vectorstore::VectorStore;

/// The answer returned by the managed profile when a search comes back
/// empty.
pub const NO_CONTEXT_SENTINEL: &str = "no relevant context found";

/// Summary of one ingested upload batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    /// Documents loaded from the upload.
    pub documents: usize,
    /// Chunks produced and indexed from this batch.
    pub chunks: usize,
    /// Total chunks in the collection after this batch.
    pub indexed_total: usize,
}

/// Orchestrates the load → chunk → embed → store ingestion flow and the
/// embed → search → answer query flow.
pub struct RagEngine {
    profile: Profile,
    collection: String,
    top_k: usize,
    splitter: TextSplitter,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    generator: Option<Arc<dyn GenerationModel>>,
    state: IndexState,
}

impl std::fmt::Debug for RagEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagEngine")
            .field("profile", &self.profile)
            .field("collection", &self.collection)
            .field("top_k", &self.top_k)
            .field("splitter", &self.splitter)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl RagEngine {
    /// Create a new [`RagEngineBuilder`].
    pub fn builder() -> RagEngineBuilder {
        RagEngineBuilder::default()
    }

    /// The engine's deployment profile.
    pub fn profile(&self) -> Profile {
        self.profile
    }

    /// The collection this engine reads and writes.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Ingest an upload batch: load → chunk → embed → upsert.
    ///
    /// The first successful upload creates the collection and moves the
    /// index to [`IndexStatus::Ready`]; later uploads append. The store
    /// mutation runs under the single-writer guard, so concurrent uploads
    /// queue rather than racing.
    ///
    /// # Errors
    ///
    /// - [`RagError::Load`] for an empty batch, an unparseable file, or
    ///   files with no indexable text
    /// - [`RagError::Embedding`] / [`RagError::Store`] for provider
    ///   failures (nothing is retried)
    pub async fn ingest(&self, files: &[UploadedFile]) -> Result<IngestReport> {
        let documents = load_documents(files)?;

        let mut chunks: Vec<Chunk> = Vec::new();
        for document in &documents {
            chunks.extend(self.splitter.split(document));
        }
        if chunks.is_empty() {
            // Don't flip the index to Ready over an upload that stored
            // nothing.
            return Err(RagError::Load("uploaded files contain no indexable text".to_string()));
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts, EmbedPurpose::Passage).await.map_err(
            |e| {
                error!(error = %e, "embedding failed during ingestion");
                e
            },
        )?;
        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.embedding = embedding;
        }

        let mut writer = self.state.writer().await;
        if writer.status() == IndexStatus::Uninitialized {
            self.store
                .ensure_collection(&self.collection, self.embedder.dimensions())
                .await
                .map_err(|e| {
                    error!(collection = %self.collection, error = %e, "collection creation failed");
                    e
                })?;
        }
        self.store.upsert(&self.collection, &chunks).await.map_err(|e| {
            error!(collection = %self.collection, error = %e, "upsert failed during ingestion");
            e
        })?;
        writer.mark_ready();
        drop(writer);

        let indexed_total = self.store.count(&self.collection).await?;
        info!(
            documents = documents.len(),
            chunks = chunks.len(),
            indexed_total,
            "ingested upload batch"
        );

        Ok(IngestReport { documents: documents.len(), chunks: chunks.len(), indexed_total })
    }

    /// Answer a natural-language query.
    ///
    /// Self-hosted profile: retrieve top-k context, then synthesize an
    /// answer with the generation model. Managed profile: return the best
    /// matching chunk verbatim, or [`NO_CONTEXT_SENTINEL`] when the
    /// search comes back empty.
    ///
    /// # Errors
    ///
    /// - [`RagError::NotInitialized`] for a self-hosted query before any
    ///   upload; the store is not contacted
    /// - [`RagError::Embedding`] / [`RagError::Store`] /
    ///   [`RagError::Generation`] for provider failures
    pub async fn answer(&self, query: &str) -> Result<Answer> {
        if self.profile.requires_ready_index()
            && self.state.status().await == IndexStatus::Uninitialized
        {
            return Err(RagError::NotInitialized);
        }

        let embedding = self.embedder.embed(query, EmbedPurpose::Query).await.map_err(|e| {
            error!(error = %e, "query embedding failed");
            e
        })?;
        let results =
            self.store.search(&self.collection, &embedding, self.top_k).await.map_err(|e| {
                error!(collection = %self.collection, error = %e, "search failed");
                e
            })?;

        let answer = if self.profile.generates() {
            let generator = self.generator.as_ref().ok_or_else(|| {
                RagError::Config("self-hosted profile requires a generation model".to_string())
            })?;
            let response = generator.generate(query, &results).await.map_err(|e| {
                error!(error = %e, "generation failed");
                e
            })?;
            Answer { response, sources: collect_sources(&results) }
        } else {
            match results.first() {
                Some(best) => Answer {
                    response: best.chunk.text.clone(),
                    sources: collect_sources(&results[..1]),
                },
                None => Answer { response: NO_CONTEXT_SENTINEL.to_string(), sources: Vec::new() },
            }
        };

        info!(result_count = results.len(), "answered query");
        Ok(answer)
    }
}

/// Unique source filenames of the given results, in retrieval order.
fn collect_sources(results: &[SearchResult]) -> Vec<String> {
    let mut sources: Vec<String> = Vec::new();
    for result in results {
        if let Some(source) = result.chunk.source() {
            if !sources.iter().any(|s| s == source) {
                sources.push(source.to_string());
            }
        }
    }
    sources
}

/// Builder for a [`RagEngine`].
///
/// `embedder` and `store` are required; `generator` is required for the
/// self-hosted profile.
#[derive(Default)]
pub struct RagEngineBuilder {
    profile: Option<Profile>,
    collection: Option<String>,
    top_k: Option<usize>,
    splitter: Option<TextSplitter>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    store: Option<Arc<dyn VectorStore>>,
    generator: Option<Arc<dyn GenerationModel>>,
}

impl RagEngineBuilder {
    /// Set the deployment profile (default: [`Profile::SelfHosted`]).
    pub fn profile(mut self, profile: Profile) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Set the collection name (default: `documents`).
    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    /// Override the profile's default top-k.
    pub fn top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    /// Set the text splitter (default: 512/100).
    pub fn splitter(mut self, splitter: TextSplitter) -> Self {
        self.splitter = Some(splitter);
        self
    }

    /// Set the embedding provider (required).
    pub fn embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Set the vector store backend (required).
    pub fn store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the generation model (required for the self-hosted profile).
    pub fn generator(mut self, generator: Arc<dyn GenerationModel>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Take profile, collection, top-k, and splitter settings from a
    /// [`ServiceConfig`].
    pub fn with_config(mut self, config: &ServiceConfig) -> Self {
        self.profile = Some(config.profile);
        self.collection = Some(config.collection.clone());
        self.top_k = Some(config.top_k);
        self.splitter = Some(TextSplitter::new(config.chunk_size, config.chunk_overlap));
        self
    }

    /// Build the engine, validating required components.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if a required component is missing or
    /// `top_k` is zero.
    pub fn build(self) -> Result<RagEngine> {
        let profile = self.profile.unwrap_or(Profile::SelfHosted);
        let top_k = self.top_k.unwrap_or_else(|| profile.default_top_k());
        if top_k == 0 {
            return Err(RagError::Config("top_k must be greater than zero".to_string()));
        }
        let embedder = self
            .embedder
            .ok_or_else(|| RagError::Config("embedder is required".to_string()))?;
        let store = self.store.ok_or_else(|| RagError::Config("store is required".to_string()))?;
        if profile.generates() && self.generator.is_none() {
            return Err(RagError::Config(
                "self-hosted profile requires a generation model".to_string(),
            ));
        }

        Ok(RagEngine {
            profile,
            collection: self.collection.unwrap_or_else(|| "documents".to_string()),
            top_k,
            splitter: self.splitter.unwrap_or_default(),
            embedder,
            store,
            generator: self.generator,
            state: IndexState::new(),
        })
    }
}
