//! Shared test helpers.

use async_trait::async_trait;
use forage::embedding::{EmbeddingError, EmbeddingProvider};

/// Keywords the stub embedder counts. One dimension per keyword.
pub const KEYWORDS: [&str; 8] = [
    "rust", "ownership", "memory", "borrow", "network", "async", "parser", "cache",
];

/// Deterministic embedder for tests: one dimension per keyword, value is the
/// number of occurrences in the lowercased text. Texts sharing keywords get
/// high cosine similarity; texts with no keywords embed to the zero vector.
pub struct StubEmbedder;

#[async_trait]
impl EmbeddingProvider for StubEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|t| keyword_vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        KEYWORDS.len()
    }

    fn model_name(&self) -> &str {
        "stub-keyword-counts"
    }
}

pub fn keyword_vector(text: &str) -> Vec<f32> {
    let lower = text.to_lowercase();
    KEYWORDS
        .iter()
        .map(|k| lower.matches(k).count() as f32)
        .collect()
}
