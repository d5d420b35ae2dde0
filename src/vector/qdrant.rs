//! Qdrant vector store over its REST API.
//!
//! Talks plain JSON to a Qdrant instance with `reqwest`; no generated client.
//! Collections are created with cosine distance, so search scores come back
//! directly comparable to the similarity thresholds used by the retriever.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::types::{
    ScoredRecord, StoreResult, VectorBackend, VectorQuery, VectorRecord, VectorStore,
    VectorStoreError,
};

/// Connection settings for a Qdrant instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QdrantConfig {
    /// Base URL, e.g. `http://localhost:6333`.
    pub url: String,

    /// API key sent in the `api-key` header when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6333".to_string(),
            api_key: None,
        }
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Qdrant backend handling collection lifecycle.
#[derive(Debug, Clone)]
pub struct QdrantBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl QdrantBackend {
    pub fn new(config: &QdrantConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: normalize_base_url(&config.url),
            api_key: config.api_key.clone(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        if let Some(ref key) = self.api_key {
            builder = builder.header("api-key", key);
        }
        builder
    }
}

#[async_trait]
impl VectorBackend for QdrantBackend {
    async fn collection_exists(&self, name: &str) -> StoreResult<bool> {
        let response = self
            .request(reqwest::Method::GET, &format!("/collections/{name}"))
            .send()
            .await?;

        match response.status() {
            reqwest::StatusCode::OK => Ok(true),
            reqwest::StatusCode::NOT_FOUND => Ok(false),
            status => Err(VectorStoreError::BadResponse(format!(
                "collection check returned {status}"
            ))),
        }
    }

    async fn create_collection(&self, name: &str, dimension: usize) -> StoreResult<()> {
        let body = json!({
            "vectors": { "size": dimension, "distance": "Cosine" }
        });

        let response = self
            .request(reqwest::Method::PUT, &format!("/collections/{name}"))
            .json(&body)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::CONFLICT {
            return Err(VectorStoreError::CollectionExists(name.to_string()));
        }
        response.error_for_status()?;

        tracing::debug!(target: "vector", "created qdrant collection {name} (dim {dimension})");
        Ok(())
    }

    async fn open(&self, name: &str) -> StoreResult<Box<dyn VectorStore>> {
        if !self.collection_exists(name).await? {
            return Err(VectorStoreError::CollectionNotFound(name.to_string()));
        }
        Ok(Box::new(QdrantStore {
            backend: self.clone(),
            collection: name.to_string(),
        }))
    }

    async fn drop_collection(&self, name: &str) -> StoreResult<()> {
        let response = self
            .request(reqwest::Method::DELETE, &format!("/collections/{name}"))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(VectorStoreError::CollectionNotFound(name.to_string()));
        }
        response.error_for_status()?;
        Ok(())
    }
}

/// Handle to a single Qdrant collection.
#[derive(Debug, Clone)]
pub struct QdrantStore {
    backend: QdrantBackend,
    collection: String,
}

impl QdrantStore {
    /// Open a collection handle without an existence round-trip.
    pub fn new(config: &QdrantConfig, collection: impl Into<String>) -> Self {
        Self {
            backend: QdrantBackend::new(config),
            collection: collection.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }
}

#[derive(Serialize)]
struct PointStruct<'a> {
    id: Uuid,
    vector: &'a [f32],
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<&'a serde_json::Value>,
}

#[derive(Deserialize)]
struct SearchResponse {
    result: Vec<ScoredPoint>,
}

#[derive(Deserialize)]
struct ScoredPoint {
    id: Uuid,
    score: f32,
    #[serde(default)]
    payload: Option<serde_json::Value>,
    #[serde(default)]
    vector: Option<Vec<f32>>,
}

#[derive(Deserialize)]
struct CountResponse {
    result: CountResult,
}

#[derive(Deserialize)]
struct CountResult {
    count: usize,
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn add(&self, records: &[VectorRecord]) -> StoreResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        let points: Vec<PointStruct<'_>> = records
            .iter()
            .map(|r| PointStruct {
                id: r.id,
                vector: &r.vector,
                payload: r.payload.as_ref(),
            })
            .collect();

        self.backend
            .request(
                reqwest::Method::PUT,
                &format!("/collections/{}/points?wait=true", self.collection),
            )
            .json(&json!({ "points": points }))
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }

    async fn delete(&self, ids: &[Uuid]) -> StoreResult<()> {
        if ids.is_empty() {
            return Ok(());
        }

        self.backend
            .request(
                reqwest::Method::POST,
                &format!("/collections/{}/points/delete?wait=true", self.collection),
            )
            .json(&json!({ "points": ids }))
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }

    async fn query(&self, query: &VectorQuery) -> StoreResult<Vec<ScoredRecord>> {
        let body = json!({
            "vector": query.vector,
            "limit": query.top_k,
            "with_payload": true,
            "with_vector": true,
        });

        let response: SearchResponse = self
            .backend
            .request(
                reqwest::Method::POST,
                &format!("/collections/{}/points/search", self.collection),
            )
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response
            .result
            .into_iter()
            .map(|point| ScoredRecord {
                similarity: point.score,
                record: VectorRecord::with_id(
                    point.id,
                    point.vector.unwrap_or_default(),
                    point.payload,
                ),
            })
            .collect())
    }

    async fn clear(&self) -> StoreResult<()> {
        // Delete-by-empty-filter removes every point in the collection.
        self.backend
            .request(
                reqwest::Method::POST,
                &format!("/collections/{}/points/delete?wait=true", self.collection),
            )
            .json(&json!({ "filter": {} }))
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }

    async fn count(&self) -> StoreResult<usize> {
        let response: CountResponse = self
            .backend
            .request(
                reqwest::Method::POST,
                &format!("/collections/{}/points/count", self.collection),
            )
            .json(&json!({ "exact": true }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response.result.count)
    }
}
