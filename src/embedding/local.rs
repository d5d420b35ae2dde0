//! In-process embeddings via fastembed.

use std::sync::Mutex;

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use super::{EmbeddingError, EmbeddingProvider};

/// Embedding provider backed by a local fastembed model.
///
/// The model is wrapped in a `Mutex` for interior mutability; embedding is
/// CPU-bound and synchronous underneath, which is acceptable at indexing
/// batch sizes.
pub struct LocalEmbedder {
    model: Mutex<TextEmbedding>,
    dimensions: usize,
    model_name: String,
}

impl LocalEmbedder {
    /// Create with the default model (AllMiniLML6V2, 384 dimensions).
    pub fn new() -> Result<Self, EmbeddingError> {
        Self::with_model(EmbeddingModel::AllMiniLML6V2)
    }

    /// Create with a specific fastembed model.
    pub fn with_model(model: EmbeddingModel) -> Result<Self, EmbeddingError> {
        let model_name = format!("{model:?}");

        let mut text_model =
            TextEmbedding::try_new(InitOptions::new(model).with_show_download_progress(false))
                .map_err(|e| EmbeddingError::ModelInit(e.to_string()))?;

        // Probe the output dimension with a throwaway embedding.
        let probe = text_model
            .embed(vec!["probe"], None)
            .map_err(|e| EmbeddingError::Generation(e.to_string()))?;
        let dimensions = probe
            .into_iter()
            .next()
            .map(|v| v.len())
            .ok_or_else(|| EmbeddingError::ModelInit("model produced no output".to_string()))?;

        tracing::info!(target: "embedding", "initialized {model_name} ({dimensions} dims)");

        Ok(Self {
            model: Mutex::new(text_model),
            dimensions,
            model_name,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for LocalEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let inputs: Vec<&str> = texts.iter().map(String::as_str).collect();

        let embeddings = {
            let mut model = self
                .model
                .lock()
                .map_err(|_| EmbeddingError::Generation("model lock poisoned".to_string()))?;
            model
                .embed(inputs, None)
                .map_err(|e| EmbeddingError::Generation(e.to_string()))?
        };

        if embeddings.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                actual: embeddings.len(),
            });
        }

        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
