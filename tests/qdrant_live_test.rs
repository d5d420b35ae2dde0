//! Tests against a running Qdrant instance.
//!
//! Requires a Qdrant server on localhost:6333 (`docker run -p 6333:6333
//! qdrant/qdrant`), so every test here is ignored by default:
//!
//! ```bash
//! cargo test --test qdrant_live_test -- --ignored
//! ```

use forage::vector::{
    QdrantBackend, QdrantConfig, VectorBackend, VectorQuery, VectorRecord, VectorStore,
};

fn backend() -> QdrantBackend {
    QdrantBackend::new(&QdrantConfig::default())
}

#[tokio::test]
#[ignore = "requires a Qdrant server on localhost:6333"]
async fn test_collection_lifecycle() {
    let backend = backend();
    let name = "forage_test_lifecycle";

    // Clean slate in case a previous run left the collection behind.
    let _ = backend.drop_collection(name).await;

    assert!(!backend.collection_exists(name).await.unwrap());
    backend.create_collection(name, 4).await.unwrap();
    assert!(backend.collection_exists(name).await.unwrap());

    backend.drop_collection(name).await.unwrap();
    assert!(!backend.collection_exists(name).await.unwrap());
}

#[tokio::test]
#[ignore = "requires a Qdrant server on localhost:6333"]
async fn test_add_query_and_clear() {
    let backend = backend();
    let name = "forage_test_points";

    let _ = backend.drop_collection(name).await;
    backend.create_collection(name, 4).await.unwrap();
    let store = backend.open(name).await.unwrap();

    let records = vec![
        VectorRecord::new(
            vec![1.0, 0.0, 0.0, 0.0],
            Some(serde_json::json!({"text": "alpha"})),
        ),
        VectorRecord::new(
            vec![0.0, 1.0, 0.0, 0.0],
            Some(serde_json::json!({"text": "beta"})),
        ),
    ];
    store.add(&records).await.unwrap();
    assert_eq!(store.count().await.unwrap(), 2);

    let results = store
        .query(&VectorQuery::new(vec![0.9, 0.1, 0.0, 0.0], 1))
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].record.id, records[0].id);
    assert_eq!(
        results[0].record.payload.as_ref().unwrap()["text"],
        "alpha"
    );

    store.clear().await.unwrap();
    assert_eq!(store.count().await.unwrap(), 0);

    backend.drop_collection(name).await.unwrap();
}
