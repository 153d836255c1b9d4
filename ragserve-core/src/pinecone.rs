//! Pinecone vector store backend (the managed deployment profile).
//!
//! Speaks the Pinecone data-plane REST API against an index host:
//! `POST /vectors/upsert`, `POST /query`, and `POST /describe_index_stats`,
//! authenticated with the `Api-Key` header. Collection names map to
//! Pinecone namespaces, which serverless indexes create implicitly on
//! first upsert.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// A [`VectorStore`] backed by a managed [Pinecone](https://www.pinecone.io/)
/// index.
///
/// The index itself (and its dimensionality) is provisioned out of band;
/// this client only reads and writes vectors. Chunk text, document id, and
/// metadata are stored as Pinecone vector metadata.
pub struct PineconeStore {
    client: reqwest::Client,
    host: String,
    api_key: String,
}

impl PineconeStore {
    /// Create a client for the given index host and API key.
    ///
    /// `host` is the per-index data-plane endpoint, e.g.
    /// `https://my-index-abc123.svc.us-east-1-aws.pinecone.io`.
    pub fn new(host: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::Store {
                backend: "pinecone".into(),
                message: "API key must not be empty".into(),
            });
        }
        Ok(Self {
            client: reqwest::Client::new(),
            host: host.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn post<Req: Serialize, Resp: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        request: &Req,
    ) -> Result<Resp> {
        let response = self
            .client
            .post(format!("{}{path}", self.host))
            .header("Api-Key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!(backend = "pinecone", path, error = %e, "request failed");
                RagError::Store {
                    backend: "pinecone".into(),
                    message: format!("request failed: {e}"),
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(backend = "pinecone", path, %status, "API error");
            return Err(RagError::Store {
                backend: "pinecone".into(),
                message: format!("API returned {status}: {body}"),
            });
        }

        response.json().await.map_err(|e| RagError::Store {
            backend: "pinecone".into(),
            message: format!("failed to parse response: {e}"),
        })
    }
}

// ── Pinecone wire types ────────────────────────────────────────────

#[derive(Serialize)]
struct UpsertRequest {
    vectors: Vec<Vector>,
    namespace: String,
}

#[derive(Serialize)]
struct Vector {
    id: String,
    values: Vec<f32>,
    metadata: HashMap<String, String>,
}

#[derive(Deserialize)]
struct UpsertResponse {
    #[serde(rename = "upsertedCount")]
    #[allow(dead_code)]
    upserted_count: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest {
    vector: Vec<f32>,
    top_k: usize,
    namespace: String,
    include_metadata: bool,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<Match>,
}

#[derive(Deserialize)]
struct Match {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<HashMap<String, String>>,
}

#[derive(Serialize)]
struct StatsRequest {}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    #[serde(default)]
    namespaces: HashMap<String, NamespaceStats>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NamespaceStats {
    #[serde(default)]
    vector_count: usize,
}

#[async_trait]
impl VectorStore for PineconeStore {
    async fn ensure_collection(&self, name: &str, _dimensions: usize) -> Result<()> {
        // Namespaces are created implicitly on first upsert; the index is
        // provisioned out of band.
        debug!(namespace = name, "pinecone namespace ready (implicit)");
        Ok(())
    }

    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let vectors = chunks
            .iter()
            .map(|chunk| {
                let mut metadata = chunk.metadata.clone();
                metadata.insert("text".to_string(), chunk.text.clone());
                metadata.insert("document_id".to_string(), chunk.document_id.clone());
                Vector { id: chunk.id.clone(), values: chunk.embedding.clone(), metadata }
            })
            .collect();

        let _: UpsertResponse = self
            .post("/vectors/upsert", &UpsertRequest { vectors, namespace: collection.to_string() })
            .await?;

        debug!(namespace = collection, count = chunks.len(), "upserted vectors to pinecone");
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        let response: QueryResponse = self
            .post(
                "/query",
                &QueryRequest {
                    vector: embedding.to_vec(),
                    top_k,
                    namespace: collection.to_string(),
                    include_metadata: true,
                },
            )
            .await?;

        let results = response
            .matches
            .into_iter()
            .map(|m| {
                let mut metadata = m.metadata.unwrap_or_default();
                let text = metadata.remove("text").unwrap_or_default();
                let document_id = metadata.remove("document_id").unwrap_or_default();
                SearchResult {
                    chunk: Chunk {
                        id: m.id,
                        text,
                        embedding: Vec::new(),
                        metadata,
                        document_id,
                    },
                    score: m.score,
                }
            })
            .collect();

        Ok(results)
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let response: StatsResponse = self.post("/describe_index_stats", &StatsRequest {}).await?;
        Ok(response.namespaces.get(collection).map(|ns| ns.vector_count).unwrap_or(0))
    }
}
