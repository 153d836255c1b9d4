//! Data types for documents, chunks, search results, and answers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The metadata key holding the originating filename of a document.
///
/// The loader guarantees every [`Document`] carries this key.
pub const SOURCE_KEY: &str = "source";

/// A normalized source document: extracted text plus metadata.
///
/// Documents are immutable once created by the loader. `metadata` always
/// contains a [`SOURCE_KEY`] entry equal to the uploaded filename.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique identifier for the document.
    pub id: String,
    /// The extracted text content.
    pub text: String,
    /// Key-value metadata, including the `source` filename.
    pub metadata: HashMap<String, String>,
}

impl Document {
    /// The `source` metadata value, if present.
    pub fn source(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).map(String::as_str)
    }
}

/// A segment of a [`Document`] carrying its vector embedding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique identifier, `{document_id}_{chunk_index}`.
    pub id: String,
    /// The chunk text.
    pub text: String,
    /// The embedding vector (empty until the engine attaches one).
    pub embedding: Vec<f32>,
    /// Metadata inherited from the parent document plus `chunk_index`.
    pub metadata: HashMap<String, String>,
    /// The parent [`Document`] id.
    pub document_id: String,
}

impl Chunk {
    /// The `source` metadata value, if present.
    pub fn source(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).map(String::as_str)
    }
}

/// A retrieved [`Chunk`] with its similarity score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// Similarity score, higher is more relevant.
    pub score: f32,
}

/// The result of answering a query.
///
/// `response` is either generated text (self-hosted profile) or the best
/// matching chunk verbatim (managed profile).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// The answer text.
    pub response: String,
    /// Source filenames of the context the answer was drawn from,
    /// deduplicated in retrieval order.
    pub sources: Vec<String>,
}
