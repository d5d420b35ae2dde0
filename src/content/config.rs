//! Chunking configuration.

use serde::{Deserialize, Serialize};

/// Configuration for splitting documents into chunks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Minimum chunk size in characters. Smaller chunks are merged.
    #[serde(default = "default_min_chunk_chars")]
    pub min_chunk_chars: usize,

    /// Maximum chunk size in characters. Larger chunks are split.
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,

    /// Overlap between adjacent chunks in characters.
    #[serde(default = "default_overlap_chars")]
    pub overlap_chars: usize,
}

fn default_min_chunk_chars() -> usize {
    200
}

fn default_max_chunk_chars() -> usize {
    1500
}

fn default_overlap_chars() -> usize {
    100
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            min_chunk_chars: default_min_chunk_chars(),
            max_chunk_chars: default_max_chunk_chars(),
            overlap_chars: default_overlap_chars(),
        }
    }
}

impl ChunkingConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.min_chunk_chars >= self.max_chunk_chars {
            return Err(format!(
                "min_chunk_chars ({}) must be less than max_chunk_chars ({})",
                self.min_chunk_chars, self.max_chunk_chars
            ));
        }

        if self.overlap_chars >= self.min_chunk_chars {
            return Err(format!(
                "overlap_chars ({}) should be less than min_chunk_chars ({})",
                self.overlap_chars, self.min_chunk_chars
            ));
        }

        Ok(())
    }
}
