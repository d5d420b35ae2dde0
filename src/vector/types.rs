//! Core types shared by all vector store backends.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors from vector store operations.
#[derive(Error, Debug)]
pub enum VectorStoreError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Collection already exists: {0}")]
    CollectionExists(String),

    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Unexpected response from vector store: {0}")]
    BadResponse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Lock poisoned")]
    LockPoisoned,
}

/// Result type for vector store operations.
pub type StoreResult<T> = Result<T, VectorStoreError>;

/// A vector together with its identifier and payload, used as the transfer
/// object when writing to a store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Unique identifier. A random UUID is assigned when not provided.
    pub id: Uuid,

    /// The embedding itself.
    pub vector: Vec<f32>,

    /// Arbitrary metadata carried alongside the vector.
    pub payload: Option<serde_json::Value>,
}

impl VectorRecord {
    /// Create a record with a freshly generated UUID.
    pub fn new(vector: Vec<f32>, payload: Option<serde_json::Value>) -> Self {
        Self {
            id: Uuid::new_v4(),
            vector,
            payload,
        }
    }

    /// Create a record with an explicit identifier.
    pub fn with_id(id: Uuid, vector: Vec<f32>, payload: Option<serde_json::Value>) -> Self {
        Self {
            id,
            vector,
            payload,
        }
    }
}

/// A similarity query against a vector store.
#[derive(Debug, Clone)]
pub struct VectorQuery {
    /// The query embedding.
    pub vector: Vec<f32>,

    /// Number of most-similar records to return.
    pub top_k: usize,
}

impl VectorQuery {
    pub fn new(vector: Vec<f32>, top_k: usize) -> Self {
        Self { vector, top_k }
    }
}

/// A record returned from a query, with its similarity to the query vector.
#[derive(Debug, Clone)]
pub struct ScoredRecord {
    pub record: VectorRecord,
    pub similarity: f32,
}

/// Storage for embedding vectors with similarity search.
///
/// Implementations wrap whatever index actually does the nearest-neighbor
/// work; this crate only orchestrates calls against it.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Save a batch of records.
    async fn add(&self, records: &[VectorRecord]) -> StoreResult<()>;

    /// Delete records by identifier.
    async fn delete(&self, ids: &[Uuid]) -> StoreResult<()>;

    /// Return up to `top_k` records ranked by similarity, most similar first.
    async fn query(&self, query: &VectorQuery) -> StoreResult<Vec<ScoredRecord>>;

    /// Remove all records.
    async fn clear(&self) -> StoreResult<()>;

    /// Number of records currently stored.
    async fn count(&self) -> StoreResult<usize>;
}

/// Collection lifecycle operations for a vector database.
///
/// The retriever uses this to map content sources to named collections and
/// to create them on first index.
#[async_trait]
pub trait VectorBackend: Send + Sync {
    /// Check whether a collection exists and is reachable.
    async fn collection_exists(&self, name: &str) -> StoreResult<bool>;

    /// Create a collection for vectors of the given dimension.
    async fn create_collection(&self, name: &str, dimension: usize) -> StoreResult<()>;

    /// Open a handle to an existing collection.
    async fn open(&self, name: &str) -> StoreResult<Box<dyn VectorStore>>;

    /// Drop a collection and all of its records.
    async fn drop_collection(&self, name: &str) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_gets_unique_ids() {
        let a = VectorRecord::new(vec![1.0], None);
        let b = VectorRecord::new(vec![1.0], None);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_record_serde_roundtrip() {
        let record = VectorRecord::new(
            vec![0.1, 0.2, 0.3],
            Some(serde_json::json!({"text": "hello"})),
        );

        let json = serde_json::to_string(&record).unwrap();
        let back: VectorRecord = serde_json::from_str(&json).unwrap();

        assert_eq!(back.id, record.id);
        assert_eq!(back.vector, record.vector);
        assert_eq!(back.payload, record.payload);
    }
}
