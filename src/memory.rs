//! Vector-backed agent memory.
//!
//! Stores chat records as embeddings and retrieves contextually similar past
//! messages instead of a fixed-size transcript window. The retrieval key
//! convention: the content of the last user message written becomes the next
//! retrieval topic.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::embedding::{EmbeddingError, EmbeddingProvider};
use crate::vector::{VectorQuery, VectorRecord, VectorStore, VectorStoreError};

/// Default number of similar messages retrieved.
pub const DEFAULT_RETRIEVE_LIMIT: usize = 3;

/// Errors from memory operations.
#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Vector store error: {0}")]
    Store(#[from] VectorStoreError),

    #[error("Malformed memory payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Role of a chat message, matching OpenAI backend roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Function,
}

/// A single chat message persisted to memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Stable identifier, reused as the vector record id.
    pub uuid: Uuid,

    /// Who produced the message.
    pub role: MessageRole,

    /// Message text; this is what gets embedded.
    pub content: String,

    /// When the message was written.
    pub timestamp: DateTime<Utc>,
}

impl MemoryRecord {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// A memory record returned from retrieval, with its similarity score.
#[derive(Debug, Clone)]
pub struct ContextRecord {
    pub record: MemoryRecord,
    pub score: f32,
}

/// Chat memory backed by a vector store.
pub struct VectorMemory {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
}

impl VectorMemory {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    /// Embed each record's content and write it to the store.
    ///
    /// The vector record id is the memory record's uuid, so rewriting the
    /// same record overwrites instead of duplicating.
    pub async fn write_records(&self, records: &[MemoryRecord]) -> Result<(), MemoryError> {
        if records.is_empty() {
            return Ok(());
        }

        let texts: Vec<String> = records.iter().map(|r| r.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let vector_records = records
            .iter()
            .zip(embeddings)
            .map(|(record, vector)| {
                let payload = serde_json::to_value(record)?;
                Ok(VectorRecord::with_id(record.uuid, vector, Some(payload)))
            })
            .collect::<Result<Vec<_>, serde_json::Error>>()?;

        self.store.add(&vector_records).await?;
        Ok(())
    }

    /// Retrieve up to `limit` records most similar to `keyword`.
    ///
    /// Records whose payloads do not parse back into a `MemoryRecord` are
    /// skipped rather than failing the whole retrieval.
    pub async fn retrieve(
        &self,
        keyword: &str,
        limit: usize,
    ) -> Result<Vec<ContextRecord>, MemoryError> {
        let query_vector = self.embedder.embed(keyword).await?;
        let results = self
            .store
            .query(&VectorQuery::new(query_vector, limit))
            .await?;

        Ok(results
            .into_iter()
            .filter_map(|scored| {
                let payload = scored.record.payload?;
                match serde_json::from_value::<MemoryRecord>(payload) {
                    Ok(record) => Some(ContextRecord {
                        record,
                        score: scored.similarity,
                    }),
                    Err(e) => {
                        tracing::warn!(target: "memory", "skipping malformed memory payload: {e}");
                        None
                    }
                }
            })
            .collect())
    }

    /// Remove all records from memory.
    pub async fn clear(&self) -> Result<(), MemoryError> {
        self.store.clear().await?;
        Ok(())
    }
}

/// Agent-facing memory that tracks the conversation topic.
///
/// Writing records updates the topic to the last user message; context
/// retrieval then keys off that topic. Before any user message has been
/// written there is no topic, and retrieval returns nothing.
pub struct AgentVectorMemory {
    memory: VectorMemory,
    current_topic: Mutex<Option<String>>,
    retrieve_limit: usize,
}

impl AgentVectorMemory {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, store: Arc<dyn VectorStore>) -> Self {
        Self {
            memory: VectorMemory::new(embedder, store),
            current_topic: Mutex::new(None),
            retrieve_limit: DEFAULT_RETRIEVE_LIMIT,
        }
    }

    /// Override how many context records a retrieval returns.
    pub fn with_retrieve_limit(mut self, limit: usize) -> Self {
        self.retrieve_limit = limit;
        self
    }

    /// Write records, updating the current topic from user messages.
    pub async fn write_records(&self, records: &[MemoryRecord]) -> Result<(), MemoryError> {
        {
            let mut topic = self.current_topic.lock().await;
            for record in records {
                if record.role == MessageRole::User {
                    *topic = Some(record.content.clone());
                }
            }
        }
        self.memory.write_records(records).await
    }

    /// Retrieve context records similar to the current topic.
    pub async fn retrieve_context(&self) -> Result<Vec<ContextRecord>, MemoryError> {
        let topic = self.current_topic.lock().await.clone();
        match topic {
            Some(keyword) => self.memory.retrieve(&keyword, self.retrieve_limit).await,
            None => Ok(Vec::new()),
        }
    }

    /// Remove all records and forget the current topic.
    pub async fn clear(&self) -> Result<(), MemoryError> {
        *self.current_topic.lock().await = None;
        self.memory.clear().await
    }
}
