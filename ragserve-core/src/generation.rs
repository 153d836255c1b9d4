//! Generation model trait for synthesizing answers from retrieved context.

use async_trait::async_trait;

use crate::document::SearchResult;
use crate::error::Result;

/// A language model that answers a query conditioned on retrieved context.
#[async_trait]
pub trait GenerationModel: Send + Sync {
    /// Produce a natural-language answer to `query` using `context`.
    async fn generate(&self, query: &str, context: &[SearchResult]) -> Result<String>;
}

/// Assemble the grounding prompt sent to a generation model.
///
/// Context chunks are rendered as labelled blocks ahead of the question so
/// the model can cite sources by filename.
pub fn build_prompt(query: &str, context: &[SearchResult]) -> String {
    let mut prompt = String::from(
        "Answer the question using only the context below. \
         If the context does not contain the answer, say so.\n\n",
    );
    for result in context {
        let source = result.chunk.source().unwrap_or("unknown");
        prompt.push_str(&format!("[source: {source}]\n{}\n\n", result.chunk.text));
    }
    prompt.push_str(&format!("Question: {query}\nAnswer:"));
    prompt
}
