//! Engine behavior tests: initialization guard, retrieval correctness,
//! accumulation, and concurrent upload serialization.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use ragserve_core::{
    Chunk, EmbedPurpose, EmbeddingProvider, GenerationModel, InMemoryStore, Profile, RagEngine,
    RagError, SearchResult, UploadedFile, VectorStore, NO_CONTEXT_SENTINEL,
};

const DIMS: usize = 64;

/// Deterministic bag-of-words embedder: each token bumps one bucket.
/// Texts sharing tokens get positive cosine similarity.
struct TokenEmbedding;

#[async_trait]
impl EmbeddingProvider for TokenEmbedding {
    async fn embed(&self, text: &str, _purpose: EmbedPurpose) -> ragserve_core::Result<Vec<f32>> {
        let mut vector = vec![0.0f32; DIMS];
        for token in text.split_whitespace() {
            let mut hasher = DefaultHasher::new();
            token.to_ascii_lowercase().hash(&mut hasher);
            vector[(hasher.finish() as usize) % DIMS] += 1.0;
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        DIMS
    }
}

/// Wraps an [`InMemoryStore`] and counts calls, so tests can assert the
/// store was never contacted.
struct RecordingStore {
    inner: InMemoryStore,
    searches: AtomicUsize,
    upserts: AtomicUsize,
}

impl RecordingStore {
    fn new() -> Self {
        Self { inner: InMemoryStore::new(), searches: AtomicUsize::new(0), upserts: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl VectorStore for RecordingStore {
    async fn ensure_collection(&self, name: &str, dimensions: usize) -> ragserve_core::Result<()> {
        self.inner.ensure_collection(name, dimensions).await
    }

    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> ragserve_core::Result<()> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        self.inner.upsert(collection, chunks).await
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> ragserve_core::Result<Vec<SearchResult>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        self.inner.search(collection, embedding, top_k).await
    }

    async fn count(&self, collection: &str) -> ragserve_core::Result<usize> {
        self.inner.count(collection).await
    }
}

/// Echoes retrieved context back, so assertions can check grounding.
struct EchoGeneration;

#[async_trait]
impl GenerationModel for EchoGeneration {
    async fn generate(
        &self,
        query: &str,
        context: &[SearchResult],
    ) -> ragserve_core::Result<String> {
        let texts: Vec<&str> = context.iter().map(|r| r.chunk.text.as_str()).collect();
        Ok(format!("Q: {query} | context: {}", texts.join(" / ")))
    }
}

fn text_file(name: &str, content: &str) -> UploadedFile {
    UploadedFile {
        filename: name.to_string(),
        content_type: Some("text/plain".to_string()),
        bytes: content.as_bytes().to_vec(),
    }
}

fn self_hosted_engine(store: Arc<dyn VectorStore>) -> RagEngine {
    RagEngine::builder()
        .profile(Profile::SelfHosted)
        .embedder(Arc::new(TokenEmbedding))
        .store(store)
        .generator(Arc::new(EchoGeneration))
        .build()
        .unwrap()
}

fn managed_engine(store: Arc<dyn VectorStore>) -> RagEngine {
    RagEngine::builder()
        .profile(Profile::Managed)
        .embedder(Arc::new(TokenEmbedding))
        .store(store)
        .build()
        .unwrap()
}

#[tokio::test]
async fn query_before_upload_is_rejected_without_touching_the_store() {
    let store = Arc::new(RecordingStore::new());
    let engine = self_hosted_engine(store.clone());

    let err = engine.answer("anything at all").await.unwrap_err();
    assert!(matches!(err, RagError::NotInitialized));
    assert_eq!(err.kind(), "not_initialized");
    assert_eq!(store.searches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn managed_profile_has_no_initialization_guard() {
    let store = Arc::new(InMemoryStore::new());
    store.ensure_collection("documents", DIMS).await.unwrap();
    let engine = managed_engine(store);

    // Empty index: the sentinel, not an error.
    let answer = engine.answer("whatever").await.unwrap();
    assert_eq!(answer.response, NO_CONTEXT_SENTINEL);
    assert!(answer.sources.is_empty());
}

#[tokio::test]
async fn upload_then_query_retrieves_the_uploaded_content() {
    let store = Arc::new(InMemoryStore::new());
    let engine = managed_engine(store);

    engine
        .ingest(&[text_file("note.txt", "the access code is zanzibar seventeen")])
        .await
        .unwrap();

    let answer = engine.answer("zanzibar").await.unwrap();
    assert!(answer.response.contains("zanzibar"));
    assert_eq!(answer.sources, vec!["note.txt".to_string()]);
}

#[tokio::test]
async fn generated_answer_references_retrieved_context() {
    let store = Arc::new(InMemoryStore::new());
    let engine = self_hosted_engine(store);

    engine
        .ingest(&[text_file("manual.txt", "restart the router by holding the recessed button")])
        .await
        .unwrap();

    let answer = engine.answer("how do I restart the router").await.unwrap();
    assert!(answer.response.contains("recessed button"));
    assert_eq!(answer.sources, vec!["manual.txt".to_string()]);
}

#[tokio::test]
async fn repeated_uploads_accumulate() {
    let store = Arc::new(InMemoryStore::new());
    let engine = self_hosted_engine(store.clone());

    let first = engine
        .ingest(&[
            text_file("a1.txt", "alpaca grazing notes one"),
            text_file("a2.txt", "alpaca shearing notes two"),
        ])
        .await
        .unwrap();
    assert_eq!(first.documents, 2);
    assert_eq!(first.indexed_total, 2);

    let second = engine
        .ingest(&[
            text_file("b1.txt", "alpaca feeding notes three"),
            text_file("b2.txt", "alpaca vet notes four"),
            text_file("b3.txt", "alpaca herd notes five"),
        ])
        .await
        .unwrap();
    assert_eq!(second.documents, 3);
    assert_eq!(second.indexed_total, 5);

    // A broad query sees documents from both batches.
    let answer = engine.answer("alpaca notes").await.unwrap();
    assert!(answer.sources.iter().any(|s| s.starts_with('a')));
    assert!(answer.sources.iter().any(|s| s.starts_with('b')));
}

#[tokio::test]
async fn empty_query_does_not_crash() {
    let store = Arc::new(InMemoryStore::new());
    let engine = self_hosted_engine(store);
    engine.ingest(&[text_file("doc.txt", "some indexed text")]).await.unwrap();

    let answer = engine.answer("").await.unwrap();
    assert!(!answer.response.is_empty());
}

#[tokio::test]
async fn empty_file_list_is_a_load_error() {
    let engine = self_hosted_engine(Arc::new(InMemoryStore::new()));
    let err = engine.ingest(&[]).await.unwrap_err();
    assert!(matches!(err, RagError::Load(_)));
}

#[tokio::test]
async fn undecodable_file_fails_the_whole_batch() {
    let store = Arc::new(RecordingStore::new());
    let engine = self_hosted_engine(store.clone());

    let bad = UploadedFile {
        filename: "garbage.txt".to_string(),
        content_type: Some("text/plain".to_string()),
        bytes: vec![0xff, 0xfe, 0x00],
    };
    let err = engine.ingest(&[text_file("good.txt", "fine content"), bad]).await.unwrap_err();
    assert!(matches!(err, RagError::Load(_)));
    // No partial success: nothing was stored.
    assert_eq!(store.upserts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn upload_with_no_indexable_text_is_a_load_error() {
    let engine = self_hosted_engine(Arc::new(InMemoryStore::new()));
    let err = engine.ingest(&[text_file("blank.txt", "")]).await.unwrap_err();
    assert!(matches!(err, RagError::Load(_)));

    // The failed upload must not have initialized the index.
    let err = engine.answer("query").await.unwrap_err();
    assert!(matches!(err, RagError::NotInitialized));
}

#[tokio::test]
async fn concurrent_uploads_do_not_lose_documents() {
    let store = Arc::new(InMemoryStore::new());
    let engine = Arc::new(self_hosted_engine(store.clone()));

    let mut handles = Vec::new();
    for i in 0..8 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine
                .ingest(&[text_file(
                    &format!("batch{i}.txt"),
                    &format!("payload number {i} for the concurrency check"),
                )])
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(store.count("documents").await.unwrap(), 8);
}

#[tokio::test]
async fn self_hosted_engine_requires_a_generator() {
    let err = RagEngine::builder()
        .profile(Profile::SelfHosted)
        .embedder(Arc::new(TokenEmbedding))
        .store(Arc::new(InMemoryStore::new()))
        .build()
        .unwrap_err();
    assert!(matches!(err, RagError::Config(_)));
}
