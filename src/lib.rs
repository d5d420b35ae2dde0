pub mod config;
pub mod content;
pub mod embedding;
pub mod logging;
pub mod memory;
pub mod retrieval;
pub mod vector;

pub use config::Settings;
pub use content::{Chunk, ChunkingConfig, ContentSource, Document, TitleChunker};
pub use embedding::{EmbeddingError, EmbeddingProvider, LocalEmbedder, OpenAiEmbedder};
pub use memory::{AgentVectorMemory, ContextRecord, MemoryError, MemoryRecord, MessageRole, VectorMemory};
pub use retrieval::{RetrievalError, Retriever};
pub use vector::{
    InMemoryBackend, InMemoryStore, QdrantBackend, QdrantStore, ScoredRecord, VectorBackend,
    VectorQuery, VectorRecord, VectorStore, VectorStoreError,
};
