//! Vector store contract and backends.
//!
//! This module defines the record/query/result types shared by all vector
//! stores, the async `VectorStore` and `VectorBackend` traits, and two
//! implementations:
//! - `InMemoryStore` - cosine similarity over an in-process map
//! - `QdrantStore` - Qdrant REST API client

mod memory;
mod qdrant;
mod types;

pub use memory::{InMemoryBackend, InMemoryStore};
pub use qdrant::{QdrantBackend, QdrantConfig, QdrantStore};
pub use types::{
    ScoredRecord, StoreResult, VectorBackend, VectorQuery, VectorRecord, VectorStore,
    VectorStoreError,
};

/// Calculate cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        // Identical vectors
        let v1 = vec![1.0, 0.0, 0.0];
        let v2 = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&v1, &v2) - 1.0).abs() < 0.001);

        // Orthogonal vectors
        let v3 = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&v1, &v3) - 0.0).abs() < 0.001);

        // Opposite vectors
        let v4 = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&v1, &v4) - (-1.0)).abs() < 0.001);
    }

    #[test]
    fn test_cosine_similarity_zero_magnitude() {
        let zero = vec![0.0, 0.0, 0.0];
        let v = vec![1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(&zero, &v), 0.0);
        assert_eq!(cosine_similarity(&v, &zero), 0.0);
    }
}
