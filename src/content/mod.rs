//! Content loading and chunking for retrieval.
//!
//! This module provides:
//! - Source resolution (URL vs. filesystem path) and stable collection naming
//! - Fetching a source into plain text (HTML reduced for URLs)
//! - Title-based chunking with size constraints and heading context

pub mod chunker;
pub mod config;
pub mod fetch;
pub mod source;

pub use chunker::{Chunk, Chunker, TitleChunker};
pub use config::ChunkingConfig;
pub use fetch::{parse_source, ContentError, Document};
pub use source::ContentSource;
