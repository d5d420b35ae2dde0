//! In-process vector store with exhaustive cosine search.
//!
//! Suitable for tests and small agent memories. Search is brute-force over a
//! map, which is fine at the scale of a chat transcript.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use super::cosine_similarity;
use super::types::{
    ScoredRecord, StoreResult, VectorBackend, VectorQuery, VectorRecord, VectorStore,
    VectorStoreError,
};

/// Brute-force in-memory vector store.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    records: Arc<Mutex<HashMap<Uuid, VectorRecord>>>,
    dimension: Option<usize>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that rejects vectors of the wrong dimension.
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            records: Arc::new(Mutex::new(HashMap::new())),
            dimension: Some(dimension),
        }
    }

    fn check_dimension(&self, vector: &[f32]) -> StoreResult<()> {
        if let Some(expected) = self.dimension {
            if vector.len() != expected {
                return Err(VectorStoreError::DimensionMismatch {
                    expected,
                    actual: vector.len(),
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn add(&self, records: &[VectorRecord]) -> StoreResult<()> {
        for record in records {
            self.check_dimension(&record.vector)?;
        }

        let mut guard = self
            .records
            .lock()
            .map_err(|_| VectorStoreError::LockPoisoned)?;
        for record in records {
            guard.insert(record.id, record.clone());
        }
        Ok(())
    }

    async fn delete(&self, ids: &[Uuid]) -> StoreResult<()> {
        let mut guard = self
            .records
            .lock()
            .map_err(|_| VectorStoreError::LockPoisoned)?;
        for id in ids {
            guard.remove(id);
        }
        Ok(())
    }

    async fn query(&self, query: &VectorQuery) -> StoreResult<Vec<ScoredRecord>> {
        self.check_dimension(&query.vector)?;

        let guard = self
            .records
            .lock()
            .map_err(|_| VectorStoreError::LockPoisoned)?;

        let mut scored: Vec<ScoredRecord> = guard
            .values()
            .map(|record| ScoredRecord {
                similarity: cosine_similarity(&query.vector, &record.vector),
                record: record.clone(),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(query.top_k);

        Ok(scored)
    }

    async fn clear(&self) -> StoreResult<()> {
        let mut guard = self
            .records
            .lock()
            .map_err(|_| VectorStoreError::LockPoisoned)?;
        guard.clear();
        Ok(())
    }

    async fn count(&self) -> StoreResult<usize> {
        let guard = self
            .records
            .lock()
            .map_err(|_| VectorStoreError::LockPoisoned)?;
        Ok(guard.len())
    }
}

/// In-memory collection registry, mirroring the lifecycle of a real backend.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    collections: Mutex<HashMap<String, InMemoryStore>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorBackend for InMemoryBackend {
    async fn collection_exists(&self, name: &str) -> StoreResult<bool> {
        let guard = self
            .collections
            .lock()
            .map_err(|_| VectorStoreError::LockPoisoned)?;
        Ok(guard.contains_key(name))
    }

    async fn create_collection(&self, name: &str, dimension: usize) -> StoreResult<()> {
        let mut guard = self
            .collections
            .lock()
            .map_err(|_| VectorStoreError::LockPoisoned)?;
        if guard.contains_key(name) {
            return Err(VectorStoreError::CollectionExists(name.to_string()));
        }
        guard.insert(name.to_string(), InMemoryStore::with_dimension(dimension));
        Ok(())
    }

    async fn open(&self, name: &str) -> StoreResult<Box<dyn VectorStore>> {
        let guard = self
            .collections
            .lock()
            .map_err(|_| VectorStoreError::LockPoisoned)?;
        guard
            .get(name)
            .cloned()
            .map(|store| Box::new(store) as Box<dyn VectorStore>)
            .ok_or_else(|| VectorStoreError::CollectionNotFound(name.to_string()))
    }

    async fn drop_collection(&self, name: &str) -> StoreResult<()> {
        let mut guard = self
            .collections
            .lock()
            .map_err(|_| VectorStoreError::LockPoisoned)?;
        guard
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| VectorStoreError::CollectionNotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_add_and_query_ranks_by_similarity() {
        let store = InMemoryStore::new();

        let close = VectorRecord::new(vec![1.0, 0.1, 0.0], None);
        let far = VectorRecord::new(vec![0.0, 1.0, 0.0], None);
        store.add(&[close.clone(), far.clone()]).await.unwrap();

        let results = store
            .query(&VectorQuery::new(vec![1.0, 0.0, 0.0], 2))
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].record.id, close.id);
        assert!(results[0].similarity > results[1].similarity);
    }

    #[tokio::test]
    async fn test_top_k_truncates() {
        let store = InMemoryStore::new();
        let records: Vec<VectorRecord> = (0..5)
            .map(|i| VectorRecord::new(vec![i as f32, 1.0], None))
            .collect();
        store.add(&records).await.unwrap();

        let results = store
            .query(&VectorQuery::new(vec![1.0, 1.0], 3))
            .await
            .unwrap();
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let store = InMemoryStore::new();
        let a = VectorRecord::new(vec![1.0], None);
        let b = VectorRecord::new(vec![2.0], None);
        store.add(&[a.clone(), b]).await.unwrap();

        store.delete(&[a.id]).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);

        store.clear().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected() {
        let store = InMemoryStore::with_dimension(3);
        let bad = VectorRecord::new(vec![1.0, 2.0], None);

        let err = store.add(&[bad]).await.unwrap_err();
        assert!(matches!(
            err,
            VectorStoreError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[tokio::test]
    async fn test_backend_collection_lifecycle() {
        let backend = InMemoryBackend::new();

        assert!(!backend.collection_exists("docs").await.unwrap());
        backend.create_collection("docs", 4).await.unwrap();
        assert!(backend.collection_exists("docs").await.unwrap());

        // Duplicate create is an error
        assert!(backend.create_collection("docs", 4).await.is_err());

        // Records written through one handle are visible through another
        let store = backend.open("docs").await.unwrap();
        store
            .add(&[VectorRecord::new(vec![1.0, 0.0, 0.0, 0.0], None)])
            .await
            .unwrap();
        let again = backend.open("docs").await.unwrap();
        assert_eq!(again.count().await.unwrap(), 1);

        backend.drop_collection("docs").await.unwrap();
        assert!(!backend.collection_exists("docs").await.unwrap());
        assert!(backend.open("docs").await.is_err());
    }
}
