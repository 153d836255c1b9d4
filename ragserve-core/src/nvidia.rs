//! NVIDIA NIM clients for embeddings and chat completions.
//!
//! Both clients speak the OpenAI-compatible NIM REST API via `reqwest`.
//! Defaults match the models this service was originally deployed with:
//! `nvidia/nv-embedqa-e5-v5` (1024-dimensional retrieval embeddings) and
//! `meta/llama-3.1-70b-instruct` for generation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::document::SearchResult;
use crate::embedding::{EmbedPurpose, EmbeddingProvider};
use crate::error::{RagError, Result};
use crate::generation::{GenerationModel, build_prompt};

/// Default base URL for NVIDIA's hosted NIM endpoints.
pub const DEFAULT_BASE_URL: &str = "https://integrate.api.nvidia.com/v1";

/// Default embedding model and its dimensionality.
const DEFAULT_EMBED_MODEL: &str = "nvidia/nv-embedqa-e5-v5";
const DEFAULT_EMBED_DIMENSIONS: usize = 1024;

/// Default generation model.
const DEFAULT_GEN_MODEL: &str = "meta/llama-3.1-70b-instruct";

/// Environment variable holding the NIM API key.
pub const API_KEY_VAR: &str = "NVIDIA_API_KEY";

/// Pull a human-readable message out of an API error body.
///
/// NIM endpoints return either OpenAI-style `{"error": {"message": ...}}`
/// or `{"detail": ...}`; fall back to the raw body.
fn error_detail(body: &str) -> String {
    #[derive(Deserialize)]
    struct OpenAiError {
        error: OpenAiErrorDetail,
    }
    #[derive(Deserialize)]
    struct OpenAiErrorDetail {
        message: String,
    }
    #[derive(Deserialize)]
    struct NimError {
        detail: String,
    }

    if let Ok(e) = serde_json::from_str::<OpenAiError>(body) {
        return e.error.message;
    }
    if let Ok(e) = serde_json::from_str::<NimError>(body) {
        return e.detail;
    }
    body.to_string()
}

// ── Embeddings ─────────────────────────────────────────────────────

/// An [`EmbeddingProvider`] backed by the NVIDIA NIM embeddings API.
///
/// # Example
///
/// ```rust,ignore
/// use ragserve_core::{EmbedPurpose, EmbeddingProvider, NvidiaEmbedding};
///
/// let provider = NvidiaEmbedding::from_env()?;
/// let vector = provider.embed("hello world", EmbedPurpose::Query).await?;
/// assert_eq!(vector.len(), provider.dimensions());
/// ```
pub struct NvidiaEmbedding {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    dimensions: usize,
}

impl NvidiaEmbedding {
    /// Create a provider with the given API key and default model.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::Embedding {
                provider: "nvidia".into(),
                message: "API key must not be empty".into(),
            });
        }
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.into(),
            model: DEFAULT_EMBED_MODEL.into(),
            dimensions: DEFAULT_EMBED_DIMENSIONS,
        })
    }

    /// Create a provider from the `NVIDIA_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(API_KEY_VAR).map_err(|_| RagError::Embedding {
            provider: "nvidia".into(),
            message: format!("{API_KEY_VAR} environment variable not set"),
        })?;
        Self::new(api_key)
    }

    /// Set the embedding model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the base URL (for self-hosted NIM containers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the reported embedding dimensionality.
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
    input_type: &'a str,
    truncate: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for NvidiaEmbedding {
    async fn embed(&self, text: &str, purpose: EmbedPurpose) -> Result<Vec<f32>> {
        let mut embeddings = self.embed_batch(&[text], purpose).await?;
        if embeddings.is_empty() {
            return Err(RagError::Embedding {
                provider: "nvidia".into(),
                message: "API returned an empty response".into(),
            });
        }
        Ok(embeddings.swap_remove(0))
    }

    async fn embed_batch(&self, texts: &[&str], purpose: EmbedPurpose) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let input_type = match purpose {
            EmbedPurpose::Passage => "passage",
            EmbedPurpose::Query => "query",
        };
        debug!(model = %self.model, batch_size = texts.len(), input_type, "embedding batch");

        let request = EmbeddingRequest {
            model: &self.model,
            input: texts.to_vec(),
            input_type,
            // Truncate over-long inputs at the end rather than erroring.
            truncate: "END",
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "nvidia", error = %e, "embedding request failed");
                RagError::Embedding {
                    provider: "nvidia".into(),
                    message: format!("request failed: {e}"),
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(provider = "nvidia", %status, "embeddings API error");
            return Err(RagError::Embedding {
                provider: "nvidia".into(),
                message: format!("API returned {status}: {}", error_detail(&body)),
            });
        }

        let parsed: EmbeddingResponse = response.json().await.map_err(|e| RagError::Embedding {
            provider: "nvidia".into(),
            message: format!("failed to parse response: {e}"),
        })?;

        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// ── Chat completions ───────────────────────────────────────────────

/// A [`GenerationModel`] backed by the NIM chat-completions API.
///
/// Makes a single non-streaming request per answer.
pub struct NvidiaGeneration {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl NvidiaGeneration {
    /// Create a model client with the given API key and default model.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::Generation {
                model: DEFAULT_GEN_MODEL.into(),
                message: "API key must not be empty".into(),
            });
        }
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.into(),
            model: DEFAULT_GEN_MODEL.into(),
            max_tokens: 1024,
        })
    }

    /// Set the generation model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the base URL (for self-hosted NIM containers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Cap the number of tokens generated per answer.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[async_trait]
impl GenerationModel for NvidiaGeneration {
    async fn generate(&self, query: &str, context: &[SearchResult]) -> Result<String> {
        let prompt = build_prompt(query, context);
        debug!(model = %self.model, context_chunks = context.len(), "generating answer");

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: &prompt }],
            max_tokens: self.max_tokens,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(model = %self.model, error = %e, "generation request failed");
                RagError::Generation {
                    model: self.model.clone(),
                    message: format!("request failed: {e}"),
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(model = %self.model, %status, "chat completions API error");
            return Err(RagError::Generation {
                model: self.model.clone(),
                message: format!("API returned {status}: {}", error_detail(&body)),
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| RagError::Generation {
            model: self.model.clone(),
            message: format!("failed to parse response: {e}"),
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| RagError::Generation {
                model: self.model.clone(),
                message: "API returned no choices".into(),
            })
    }
}
