//! Retrieval orchestration: index content into a vector store and answer
//! queries against it.
//!
//! This is glue, not an index: parsing, chunking, embedding, and similarity
//! search all happen in collaborators. The retriever sequences them, maps
//! sources to stable collection names, and compiles search hits into a text
//! block an agent can consume.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::content::{
    parse_source, Chunk, Chunker, ChunkingConfig, ContentError, ContentSource, TitleChunker,
};
use crate::embedding::{EmbeddingError, EmbeddingProvider};
use crate::vector::{VectorBackend, VectorQuery, VectorRecord, VectorStore, VectorStoreError};

/// Default number of results returned by a query.
pub const DEFAULT_TOP_K: usize = 1;

/// Default similarity cutoff for compiled results.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.75;

/// Batch size for embedding generation during indexing.
const EMBEDDING_BATCH_SIZE: usize = 64;

/// Errors from the retrieval pipeline.
#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("top_k must be a positive integer")]
    InvalidTopK,

    #[error("Content error: {0}")]
    Content(#[from] ContentError),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Vector store error: {0}")]
    Store(#[from] VectorStoreError),

    #[error("Invalid chunking config: {0}")]
    InvalidChunking(String),
}

/// Result type for retrieval operations.
pub type RetrievalResult<T> = Result<T, RetrievalError>;

/// Payload stored with every chunk vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkPayload {
    /// The content source this chunk came from.
    pub source: String,

    /// Chunk metadata for display and filtering.
    pub metadata: ChunkMetadata,

    /// The chunk text itself.
    pub text: String,
}

/// Metadata carried alongside a chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Heading hierarchy above the chunk.
    pub heading_context: Vec<String>,

    /// Byte range in the source text.
    pub byte_range: (usize, usize),

    /// SHA256 of the source text the chunk was cut from.
    pub content_hash: String,

    /// Document title, when one was extracted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Stats from indexing one source.
#[derive(Debug, Clone, Default)]
pub struct IndexStats {
    /// Number of chunks embedded and stored.
    pub chunks_indexed: usize,
}

/// Orchestrates chunking, embedding, and vector search.
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    chunker: Box<dyn Chunker>,
    chunking: ChunkingConfig,
}

impl Retriever {
    /// Create a retriever with the default title chunker and chunking config.
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            embedder,
            chunker: Box::new(TitleChunker::new()),
            chunking: ChunkingConfig::default(),
        }
    }

    /// Override the chunking configuration.
    pub fn with_chunking(mut self, chunking: ChunkingConfig) -> RetrievalResult<Self> {
        chunking
            .validate()
            .map_err(RetrievalError::InvalidChunking)?;
        self.chunking = chunking;
        Ok(self)
    }

    /// Replace the chunking strategy.
    pub fn with_chunker(mut self, chunker: Box<dyn Chunker>) -> Self {
        self.chunker = chunker;
        self
    }

    /// Dimension of the vectors this retriever produces.
    pub fn dimensions(&self) -> usize {
        self.embedder.dimensions()
    }

    /// Parse a source, chunk it, embed the chunks, and store the records.
    pub async fn index_source(
        &self,
        source: &ContentSource,
        store: &dyn VectorStore,
    ) -> RetrievalResult<IndexStats> {
        let document = parse_source(source).await?;
        let chunks = self.chunker.chunk(&document.text, &self.chunking);

        tracing::info!(
            target: "retrieval",
            "indexing {source}: {} chunks from {} bytes",
            chunks.len(),
            document.text.len()
        );

        let mut stats = IndexStats::default();

        for batch in chunks.chunks(EMBEDDING_BATCH_SIZE) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let embeddings = self.embedder.embed_batch(&texts).await?;

            let records: Vec<VectorRecord> = batch
                .iter()
                .zip(embeddings)
                .map(|(chunk, vector)| {
                    let payload = chunk_payload(source, &document.content_hash, &document.title, chunk);
                    VectorRecord::new(vector, Some(payload))
                })
                .collect();

            store.add(&records).await?;
            stats.chunks_indexed += records.len();
        }

        Ok(stats)
    }

    /// Embed a query, search the store, and compile hits above the
    /// similarity threshold into a readable block.
    ///
    /// Returns a fallback message when every hit falls below the threshold
    /// (or the store is empty). `top_k` of zero is rejected.
    pub async fn retrieve(
        &self,
        query: &str,
        store: &dyn VectorStore,
        top_k: usize,
        similarity_threshold: f32,
    ) -> RetrievalResult<String> {
        if top_k == 0 {
            return Err(RetrievalError::InvalidTopK);
        }

        let query_vector = self.embedder.embed(query).await?;
        let results = store.query(&VectorQuery::new(query_vector, top_k)).await?;

        let mut formatted = Vec::new();
        for result in &results {
            if result.similarity < similarity_threshold {
                continue;
            }
            let Some(ref payload) = result.record.payload else {
                continue;
            };

            formatted.push(
                serde_json::json!({
                    "similarity score": format!("{:.4}", result.similarity),
                    "source": payload.get("source").cloned().unwrap_or_default(),
                    "metadata": payload.get("metadata").cloned().unwrap_or_default(),
                    "text": payload.get("text").cloned().unwrap_or_default(),
                })
                .to_string(),
            );
        }

        if formatted.is_empty() {
            let source = results
                .first()
                .and_then(|r| r.record.payload.as_ref())
                .and_then(|p| p.get("source"))
                .and_then(|s| s.as_str())
                .unwrap_or("the collection")
                .to_string();

            return Ok(format!(
                "No suitable information retrieved from {source} \
                 with similarity_threshold = {similarity_threshold}."
            ));
        }

        Ok(formatted.join("\n"))
    }

    /// Full pipeline for a query over one or more sources.
    ///
    /// For each source: derive its collection name, index the content when
    /// the collection does not exist yet, then query it. Results from all
    /// sources are concatenated under the original query.
    pub async fn run(
        &self,
        query: &str,
        sources: &[ContentSource],
        backend: &dyn VectorBackend,
    ) -> RetrievalResult<String> {
        self.run_with(
            query,
            sources,
            backend,
            DEFAULT_TOP_K,
            DEFAULT_SIMILARITY_THRESHOLD,
        )
        .await
    }

    /// `run` with explicit top-k and similarity threshold.
    pub async fn run_with(
        &self,
        query: &str,
        sources: &[ContentSource],
        backend: &dyn VectorBackend,
        top_k: usize,
        similarity_threshold: f32,
    ) -> RetrievalResult<String> {
        let mut retrieved = String::new();

        for source in sources {
            let collection = source.collection_name();

            let store = if backend.collection_exists(&collection).await? {
                tracing::debug!(target: "retrieval", "collection {collection} exists, skipping index");
                backend.open(&collection).await?
            } else {
                backend
                    .create_collection(&collection, self.embedder.dimensions())
                    .await?;
                let store = backend.open(&collection).await?;
                if let Err(e) = self.index_source(source, store.as_ref()).await {
                    // A partially indexed collection must not survive, or the
                    // existence check above would skip indexing on every
                    // later run for this source.
                    if let Err(drop_err) = backend.drop_collection(&collection).await {
                        tracing::warn!(
                            target: "retrieval",
                            "could not drop collection {collection} after indexing failure: {drop_err}"
                        );
                    }
                    return Err(e);
                }
                store
            };

            let info = self
                .retrieve(query, store.as_ref(), top_k, similarity_threshold)
                .await?;

            retrieved.push('\n');
            retrieved.push_str(&info);
        }

        Ok(format!(
            "Original Query:\n{{{query}}}\nRetrieved Context:{retrieved}"
        ))
    }
}

fn chunk_payload(
    source: &ContentSource,
    content_hash: &str,
    title: &Option<String>,
    chunk: &Chunk,
) -> serde_json::Value {
    let payload = ChunkPayload {
        source: source.to_string(),
        metadata: ChunkMetadata {
            heading_context: chunk.heading_context.clone(),
            byte_range: chunk.byte_range,
            content_hash: content_hash.to_string(),
            title: title.clone(),
        },
        text: chunk.text.clone(),
    };

    // ChunkPayload contains no map keys that can fail to serialize.
    serde_json::to_value(payload).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_wire_shape() {
        let source = ContentSource::resolve("https://example.org/doc");
        let chunk = Chunk {
            byte_range: (0, 12),
            text: "chunk text".to_string(),
            heading_context: vec!["Intro".to_string()],
        };

        let value = chunk_payload(&source, "deadbeef", &None, &chunk);

        assert_eq!(value["source"], "https://example.org/doc");
        assert_eq!(value["text"], "chunk text");
        assert_eq!(value["metadata"]["heading_context"][0], "Intro");
        assert_eq!(value["metadata"]["content_hash"], "deadbeef");
    }

    #[test]
    fn test_payload_roundtrip() {
        let source = ContentSource::resolve("notes.md");
        let chunk = Chunk {
            byte_range: (3, 9),
            text: "body".to_string(),
            heading_context: vec![],
        };

        let value = chunk_payload(&source, "cafe", &Some("Notes".to_string()), &chunk);
        let back: ChunkPayload = serde_json::from_value(value).unwrap();

        assert_eq!(back.source, "notes.md");
        assert_eq!(back.metadata.byte_range, (3, 9));
        assert_eq!(back.metadata.title.as_deref(), Some("Notes"));
    }
}
