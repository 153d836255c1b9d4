//! # ragserve-core
//!
//! The engine behind the `ragserve` HTTP backend: document loading,
//! chunking, embedding, vector search, and answer synthesis.
//!
//! ## Overview
//!
//! Uploads flow through [`load_documents`] into [`Document`]s, which the
//! [`RagEngine`] splits, embeds, and upserts into a [`VectorStore`].
//! Queries are embedded and searched, then answered according to the
//! configured [`Profile`]:
//!
//! - [`Profile::SelfHosted`] — retrieve top-k context and synthesize an
//!   answer with a [`GenerationModel`] (Qdrant + NVIDIA NIM by default).
//! - [`Profile::Managed`] — retrieval-only against a managed vector API;
//!   the best-matching chunk is returned verbatim.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ragserve_core::{InMemoryStore, RagEngine};
//!
//! let engine = RagEngine::builder()
//!     .embedder(Arc::new(my_embedder))
//!     .store(Arc::new(InMemoryStore::new()))
//!     .generator(Arc::new(my_model))
//!     .build()?;
//!
//! engine.ingest(files).await?;
//! let answer = engine.answer("what does the manual say about restarts?").await?;
//! ```

pub mod chunk;
pub mod config;
pub mod document;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod generation;
pub mod inmemory;
pub mod loader;
pub mod nvidia;
pub mod pinecone;
pub mod qdrant;
pub mod state;
pub mod vectorstore;

pub use chunk::TextSplitter;
pub use config::{Profile, ServiceConfig, ServiceConfigBuilder};
pub use document::{Answer, Chunk, Document, SearchResult};
pub use embedding::{EmbedPurpose, EmbeddingProvider};
pub use engine::{IngestReport, NO_CONTEXT_SENTINEL, RagEngine, RagEngineBuilder};
pub use error::{RagError, Result};
pub use generation::GenerationModel;
pub use inmemory::InMemoryStore;
pub use loader::{UploadedFile, load_documents};
pub use nvidia::{NvidiaEmbedding, NvidiaGeneration};
pub use pinecone::PineconeStore;
pub use qdrant::QdrantStore;
pub use state::{IndexState, IndexStatus};
pub use vectorstore::VectorStore;
