//! Service configuration, read from the environment at startup.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Deployment profile: which backend stack runs and how queries are
/// answered.
///
/// The two profiles deliberately differ (they mirror the two deployments
/// this service replaces):
///
/// | | store | top-k | answer |
/// |---|---|---|---|
/// | `SelfHosted` | Qdrant | 20 | retrieved context + generation |
/// | `Managed` | Pinecone | 5 | best chunk verbatim, no generation |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Profile {
    /// Self-hosted vector store with a generation step.
    SelfHosted,
    /// Managed vector store, retrieval-only.
    Managed,
}

impl Profile {
    /// The profile's default number of search results.
    pub fn default_top_k(self) -> usize {
        match self {
            Profile::SelfHosted => 20,
            Profile::Managed => 5,
        }
    }

    /// Whether answers go through a generation model.
    pub fn generates(self) -> bool {
        matches!(self, Profile::SelfHosted)
    }

    /// Whether queries require the index to be initialized first.
    ///
    /// The managed store is the source of truth, so it has no local
    /// initialization guard.
    pub fn requires_ready_index(self) -> bool {
        matches!(self, Profile::SelfHosted)
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Profile::SelfHosted => write!(f, "self-hosted"),
            Profile::Managed => write!(f, "managed"),
        }
    }
}

impl FromStr for Profile {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "self-hosted" | "selfhosted" => Ok(Profile::SelfHosted),
            "managed" => Ok(Profile::Managed),
            other => Err(RagError::Config(format!(
                "unknown profile '{other}' (expected 'self-hosted' or 'managed')"
            ))),
        }
    }
}

/// Validated service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Deployment profile.
    pub profile: Profile,
    /// Socket address the HTTP server binds to.
    pub bind: String,
    /// Vector store collection (or namespace) name.
    pub collection: String,
    /// Number of search results per query.
    pub top_k: usize,
    /// Chunk size in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters.
    pub chunk_overlap: usize,
    /// Embedding model identifier override.
    pub embed_model: Option<String>,
    /// Generation model identifier override.
    pub gen_model: Option<String>,
    /// NVIDIA NIM API key.
    pub nvidia_api_key: Option<String>,
    /// Qdrant gRPC URL (self-hosted profile).
    pub qdrant_url: String,
    /// Pinecone API key (managed profile).
    pub pinecone_api_key: Option<String>,
    /// Pinecone index data-plane host (managed profile).
    pub pinecone_index_host: Option<String>,
}

impl ServiceConfig {
    /// Create a builder with defaults for the self-hosted profile.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::default()
    }

    /// Read configuration from `RAGSERVE_*` (and provider) environment
    /// variables and validate it.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] on unparseable values or missing
    /// profile-required settings.
    pub fn from_env() -> Result<Self> {
        let mut builder = ServiceConfigBuilder::default();

        if let Ok(profile) = std::env::var("RAGSERVE_PROFILE") {
            builder = builder.profile(profile.parse()?);
        }
        if let Ok(bind) = std::env::var("RAGSERVE_BIND") {
            builder = builder.bind(bind);
        }
        if let Ok(collection) = std::env::var("RAGSERVE_COLLECTION") {
            builder = builder.collection(collection);
        }
        if let Ok(top_k) = std::env::var("RAGSERVE_TOP_K") {
            let top_k = top_k.parse::<usize>().map_err(|_| {
                RagError::Config(format!("RAGSERVE_TOP_K must be a positive integer, got '{top_k}'"))
            })?;
            builder = builder.top_k(top_k);
        }
        if let Ok(model) = std::env::var("RAGSERVE_EMBED_MODEL") {
            builder = builder.embed_model(model);
        }
        if let Ok(model) = std::env::var("RAGSERVE_GEN_MODEL") {
            builder = builder.gen_model(model);
        }
        if let Ok(key) = std::env::var(crate::nvidia::API_KEY_VAR) {
            builder = builder.nvidia_api_key(key);
        }
        if let Ok(url) = std::env::var("QDRANT_URL") {
            builder = builder.qdrant_url(url);
        }
        if let Ok(key) = std::env::var("PINECONE_API_KEY") {
            builder = builder.pinecone_api_key(key);
        }
        if let Ok(host) = std::env::var("PINECONE_INDEX_HOST") {
            builder = builder.pinecone_index_host(host);
        }

        builder.build()
    }
}

/// Builder for a validated [`ServiceConfig`].
#[derive(Debug, Clone)]
pub struct ServiceConfigBuilder {
    profile: Profile,
    bind: String,
    collection: String,
    top_k: Option<usize>,
    chunk_size: usize,
    chunk_overlap: usize,
    embed_model: Option<String>,
    gen_model: Option<String>,
    nvidia_api_key: Option<String>,
    qdrant_url: String,
    pinecone_api_key: Option<String>,
    pinecone_index_host: Option<String>,
}

impl Default for ServiceConfigBuilder {
    fn default() -> Self {
        Self {
            profile: Profile::SelfHosted,
            bind: "0.0.0.0:8080".to_string(),
            collection: "documents".to_string(),
            top_k: None,
            chunk_size: 512,
            chunk_overlap: 100,
            embed_model: None,
            gen_model: None,
            nvidia_api_key: None,
            qdrant_url: "http://localhost:6334".to_string(),
            pinecone_api_key: None,
            pinecone_index_host: None,
        }
    }
}

impl ServiceConfigBuilder {
    /// Set the deployment profile.
    pub fn profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }

    /// Set the HTTP bind address.
    pub fn bind(mut self, bind: impl Into<String>) -> Self {
        self.bind = bind.into();
        self
    }

    /// Set the collection/namespace name.
    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Override the profile's default top-k.
    pub fn top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    /// Set the chunk size in characters.
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the chunk overlap in characters.
    pub fn chunk_overlap(mut self, chunk_overlap: usize) -> Self {
        self.chunk_overlap = chunk_overlap;
        self
    }

    /// Set the embedding model identifier.
    pub fn embed_model(mut self, model: impl Into<String>) -> Self {
        self.embed_model = Some(model.into());
        self
    }

    /// Set the generation model identifier.
    pub fn gen_model(mut self, model: impl Into<String>) -> Self {
        self.gen_model = Some(model.into());
        self
    }

    /// Set the NVIDIA NIM API key.
    pub fn nvidia_api_key(mut self, key: impl Into<String>) -> Self {
        self.nvidia_api_key = Some(key.into());
        self
    }

    /// Set the Qdrant gRPC URL.
    pub fn qdrant_url(mut self, url: impl Into<String>) -> Self {
        self.qdrant_url = url.into();
        self
    }

    /// Set the Pinecone API key.
    pub fn pinecone_api_key(mut self, key: impl Into<String>) -> Self {
        self.pinecone_api_key = Some(key.into());
        self
    }

    /// Set the Pinecone index data-plane host.
    pub fn pinecone_index_host(mut self, host: impl Into<String>) -> Self {
        self.pinecone_index_host = Some(host.into());
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if:
    /// - `top_k == 0`
    /// - `chunk_overlap >= chunk_size`
    /// - the managed profile is selected without Pinecone credentials
    pub fn build(self) -> Result<ServiceConfig> {
        let top_k = self.top_k.unwrap_or_else(|| self.profile.default_top_k());
        if top_k == 0 {
            return Err(RagError::Config("top_k must be greater than zero".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.profile == Profile::Managed
            && (self.pinecone_api_key.is_none() || self.pinecone_index_host.is_none())
        {
            return Err(RagError::Config(
                "managed profile requires PINECONE_API_KEY and PINECONE_INDEX_HOST".to_string(),
            ));
        }

        Ok(ServiceConfig {
            profile: self.profile,
            bind: self.bind,
            collection: self.collection,
            top_k,
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
            embed_model: self.embed_model,
            gen_model: self.gen_model,
            nvidia_api_key: self.nvidia_api_key,
            qdrant_url: self.qdrant_url,
            pinecone_api_key: self.pinecone_api_key,
            pinecone_index_host: self.pinecone_index_host,
        })
    }
}
