//! In-memory store tests: search ordering, top-k bound, upsert overwrite.

use std::collections::HashMap;

use proptest::prelude::*;
use ragserve_core::{Chunk, InMemoryStore, VectorStore};

const DIM: usize = 12;

fn chunk_with(id: &str, embedding: Vec<f32>) -> Chunk {
    Chunk {
        id: id.to_string(),
        text: format!("text for {id}"),
        embedding,
        metadata: HashMap::new(),
        document_id: "doc".to_string(),
    }
}

/// Unit-norm embeddings, rejecting near-zero vectors.
fn unit_vector() -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0, DIM).prop_filter_map("zero vector", |mut v| {
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm < 1e-6 {
            return None;
        }
        v.iter_mut().for_each(|x| *x /= norm);
        Some(v)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Search results come back in descending score order, never more
    /// than `top_k` of them, never more than the store holds.
    #[test]
    fn search_is_ordered_and_bounded(
        embeddings in proptest::collection::vec(unit_vector(), 1..16),
        query in unit_vector(),
        top_k in 1usize..20,
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let store = InMemoryStore::new();
            store.ensure_collection("c", DIM).await.unwrap();

            let chunks: Vec<Chunk> = embeddings
                .iter()
                .enumerate()
                .map(|(i, e)| chunk_with(&format!("chunk_{i}"), e.clone()))
                .collect();
            store.upsert("c", &chunks).await.unwrap();

            let results = store.search("c", &query, top_k).await.unwrap();
            prop_assert!(results.len() <= top_k);
            prop_assert!(results.len() <= chunks.len());
            for pair in results.windows(2) {
                prop_assert!(pair[0].score >= pair[1].score);
            }
            Ok(())
        })?;
    }
}

#[tokio::test]
async fn upsert_with_same_id_overwrites() {
    let store = InMemoryStore::new();
    store.ensure_collection("c", DIM).await.unwrap();

    store.upsert("c", &[chunk_with("x", vec![1.0; DIM])]).await.unwrap();
    store.upsert("c", &[chunk_with("x", vec![0.5; DIM])]).await.unwrap();

    assert_eq!(store.count("c").await.unwrap(), 1);
}

#[tokio::test]
async fn operations_on_missing_collection_fail() {
    let store = InMemoryStore::new();
    assert!(store.count("nope").await.is_err());
    assert!(store.search("nope", &[0.0; DIM], 3).await.is_err());
    assert!(store.upsert("nope", &[chunk_with("x", vec![1.0; DIM])]).await.is_err());
}

#[tokio::test]
async fn ensure_collection_is_idempotent() {
    let store = InMemoryStore::new();
    store.ensure_collection("c", DIM).await.unwrap();
    store.upsert("c", &[chunk_with("x", vec![1.0; DIM])]).await.unwrap();
    // Re-ensuring must not wipe existing data.
    store.ensure_collection("c", DIM).await.unwrap();
    assert_eq!(store.count("c").await.unwrap(), 1);
}
