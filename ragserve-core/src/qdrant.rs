//! Qdrant vector store backend (the self-hosted deployment profile).
//!
//! Wraps the [qdrant-client](https://docs.rs/qdrant-client) gRPC client.
//! Collections use cosine distance. Chunk text and metadata live in the
//! point payload; metadata entries are stored under flat `meta.*` keys.

use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    CountPointsBuilder, CreateCollectionBuilder, Distance, PointStruct, SearchPointsBuilder,
    UpsertPointsBuilder, Value as QdrantValue, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// Prefix for chunk metadata keys inside the Qdrant payload.
const META_PREFIX: &str = "meta.";

/// A [`VectorStore`] backed by a self-hosted [Qdrant](https://qdrant.tech/)
/// instance.
///
/// Qdrant point ids must be UUIDs or integers, so chunk ids are hashed to
/// deterministic v5 UUIDs; the original chunk id is kept in the payload.
/// Re-upserting a chunk therefore still overwrites its previous point.
pub struct QdrantStore {
    client: Qdrant,
}

impl QdrantStore {
    /// Connect to a Qdrant instance at the given gRPC URL.
    pub fn new(url: &str) -> Result<Self> {
        let client = Qdrant::from_url(url).build().map_err(Self::store_err)?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn from_client(client: Qdrant) -> Self {
        Self { client }
    }

    fn store_err(e: impl std::fmt::Display) -> RagError {
        RagError::Store { backend: "qdrant".to_string(), message: e.to_string() }
    }

    /// Deterministic point id for a chunk id.
    fn point_id(chunk_id: &str) -> String {
        Uuid::new_v5(&Uuid::NAMESPACE_OID, chunk_id.as_bytes()).to_string()
    }

    fn payload_str(payload: &HashMap<String, QdrantValue>, key: &str) -> Option<String> {
        match payload.get(key).and_then(|v| v.kind.as_ref()) {
            Some(Kind::StringValue(s)) => Some(s.clone()),
            _ => None,
        }
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn ensure_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        if self.client.collection_exists(name).await.map_err(Self::store_err)? {
            debug!(collection = name, "qdrant collection already exists");
            return Ok(());
        }

        self.client
            .create_collection(
                CreateCollectionBuilder::new(name)
                    .vectors_config(VectorParamsBuilder::new(dimensions as u64, Distance::Cosine)),
            )
            .await
            .map_err(Self::store_err)?;

        debug!(collection = name, dimensions, "created qdrant collection");
        Ok(())
    }

    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let mut points = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let mut fields = serde_json::Map::new();
            fields.insert("chunk_id".to_string(), json!(chunk.id));
            fields.insert("document_id".to_string(), json!(chunk.document_id));
            fields.insert("text".to_string(), json!(chunk.text));
            for (key, value) in &chunk.metadata {
                fields.insert(format!("{META_PREFIX}{key}"), json!(value));
            }

            let payload = Payload::try_from(serde_json::Value::Object(fields))
                .map_err(Self::store_err)?;
            points.push(PointStruct::new(
                Self::point_id(&chunk.id),
                chunk.embedding.clone(),
                payload,
            ));
        }

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, points).wait(true))
            .await
            .map_err(Self::store_err)?;

        debug!(collection, count = chunks.len(), "upserted chunks to qdrant");
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(collection, embedding.to_vec(), top_k as u64)
                    .with_payload(true),
            )
            .await
            .map_err(Self::store_err)?;

        let results = response
            .result
            .into_iter()
            .map(|point| {
                let metadata: HashMap<String, String> = point
                    .payload
                    .iter()
                    .filter_map(|(key, value)| {
                        let stripped = key.strip_prefix(META_PREFIX)?;
                        match value.kind.as_ref() {
                            Some(Kind::StringValue(s)) => {
                                Some((stripped.to_string(), s.clone()))
                            }
                            _ => None,
                        }
                    })
                    .collect();

                SearchResult {
                    chunk: Chunk {
                        id: Self::payload_str(&point.payload, "chunk_id").unwrap_or_default(),
                        text: Self::payload_str(&point.payload, "text").unwrap_or_default(),
                        // Search hits do not carry their vectors back.
                        embedding: Vec::new(),
                        metadata,
                        document_id: Self::payload_str(&point.payload, "document_id")
                            .unwrap_or_default(),
                    },
                    score: point.score,
                }
            })
            .collect();

        Ok(results)
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let response = self
            .client
            .count(CountPointsBuilder::new(collection).exact(true))
            .await
            .map_err(Self::store_err)?;
        Ok(response.result.map(|r| r.count as usize).unwrap_or(0))
    }
}
