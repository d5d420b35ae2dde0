//! Embedding provider contract and implementations.
//!
//! - `LocalEmbedder` - fastembed model running in-process
//! - `OpenAiEmbedder` - OpenAI-compatible `/v1/embeddings` endpoint

mod local;
mod openai;

use async_trait::async_trait;
use thiserror::Error;

pub use local::LocalEmbedder;
pub use openai::OpenAiEmbedder;

/// Errors from embedding providers.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Failed to initialize embedding model: {0}")]
    ModelInit(String),

    #[error("Failed to generate embedding: {0}")]
    Generation(String),

    #[error("Embedding request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Provider returned {actual} embeddings for {expected} inputs")]
    CountMismatch { expected: usize, actual: usize },
}

/// Converts text into embedding vectors.
///
/// All vectors from one provider have the same dimension; `dimensions()` is
/// what collection creation uses.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut batch = self.embed_batch(&[text.to_string()]).await?;
        batch.pop().ok_or(EmbeddingError::CountMismatch {
            expected: 1,
            actual: 0,
        })
    }

    /// Embed a batch of texts, preserving order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Output vector dimension.
    fn dimensions(&self) -> usize;

    /// Model identifier for logging and metadata.
    fn model_name(&self) -> &str;
}
