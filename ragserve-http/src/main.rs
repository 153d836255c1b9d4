//! `ragserve` binary: configuration, backend wiring, and serving.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use ragserve_core::{
    GenerationModel, NvidiaEmbedding, NvidiaGeneration, PineconeStore, Profile, QdrantStore,
    RagEngine, RagError, ServiceConfig, VectorStore,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServiceConfig::from_env()?;
    let engine = build_engine(&config)?;

    let addr: SocketAddr =
        config.bind.parse().with_context(|| format!("invalid bind address '{}'", config.bind))?;
    info!(%addr, profile = %config.profile, collection = %config.collection, "starting ragserve");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, ragserve_http::app(Arc::new(engine))).await?;
    Ok(())
}

/// Wire providers and the store according to the deployment profile.
fn build_engine(config: &ServiceConfig) -> anyhow::Result<RagEngine> {
    let api_key = config
        .nvidia_api_key
        .clone()
        .ok_or_else(|| RagError::Config("NVIDIA_API_KEY is required".to_string()))?;

    let mut embedder = NvidiaEmbedding::new(api_key.clone())?;
    if let Some(model) = &config.embed_model {
        embedder = embedder.with_model(model);
    }

    let store: Arc<dyn VectorStore> = match config.profile {
        Profile::SelfHosted => Arc::new(QdrantStore::new(&config.qdrant_url)?),
        Profile::Managed => {
            // Presence of both is validated by ServiceConfig::build.
            let host = config
                .pinecone_index_host
                .clone()
                .ok_or_else(|| RagError::Config("PINECONE_INDEX_HOST is required".to_string()))?;
            let key = config
                .pinecone_api_key
                .clone()
                .ok_or_else(|| RagError::Config("PINECONE_API_KEY is required".to_string()))?;
            Arc::new(PineconeStore::new(host, key)?)
        }
    };

    let mut builder =
        RagEngine::builder().with_config(config).embedder(Arc::new(embedder)).store(store);

    if config.profile.generates() {
        let mut generation = NvidiaGeneration::new(api_key)?;
        if let Some(model) = &config.gen_model {
            generation = generation.with_model(model);
        }
        let generator: Arc<dyn GenerationModel> = Arc::new(generation);
        builder = builder.generator(generator);
    }

    Ok(builder.build()?)
}
