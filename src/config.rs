//! Layered configuration for the retrieval pipeline.
//!
//! Sources, lowest precedence first:
//! - Built-in defaults
//! - `.forage/settings.toml` (found by walking up from the current directory)
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `FORAGE_` and use double
//! underscores to separate nested levels:
//! - `FORAGE_RETRIEVAL__TOP_K=5` sets `retrieval.top_k`
//! - `FORAGE_STORAGE__QDRANT__URL=http://qdrant:6333` sets `storage.qdrant.url`
//! - `FORAGE_EMBEDDING__PROVIDER=openai` sets `embedding.provider`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::content::ChunkingConfig;
use crate::retrieval::{DEFAULT_SIMILARITY_THRESHOLD, DEFAULT_TOP_K};
use crate::vector::QdrantConfig;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Workspace root directory (where .forage is located)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    /// Embedding provider settings
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Vector storage settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Retrieval tuning
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Document chunking settings
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which embedding backend to use.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    /// fastembed model running in-process
    Local,
    /// OpenAI-compatible embeddings endpoint
    OpenAi,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EmbeddingConfig {
    /// Embedding backend
    #[serde(default = "default_embedding_provider")]
    pub provider: EmbeddingProviderKind,

    /// Model name, interpreted by the selected provider
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Base URL for the openai provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// API key for the openai provider; prefer setting this via
    /// `FORAGE_EMBEDDING__API_KEY` rather than the settings file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Which vector store backend to use.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    /// In-process store, lost on exit
    Memory,
    /// Qdrant server over HTTP
    Qdrant,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    /// Vector store backend
    #[serde(default = "default_storage_backend")]
    pub backend: StorageBackendKind,

    /// Qdrant connection settings
    #[serde(default)]
    pub qdrant: QdrantConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RetrievalConfig {
    /// Number of results returned per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Minimum cosine similarity for a result to be kept
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default log level when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module level overrides, e.g. `forage::vector = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_embedding_provider() -> EmbeddingProviderKind {
    EmbeddingProviderKind::Local
}
fn default_embedding_model() -> String {
    "AllMiniLML6V2".to_string()
}
fn default_storage_backend() -> StorageBackendKind {
    StorageBackendKind::Memory
}
fn default_top_k() -> usize {
    DEFAULT_TOP_K
}
fn default_similarity_threshold() -> f32 {
    DEFAULT_SIMILARITY_THRESHOLD
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            workspace_root: None,
            embedding: EmbeddingConfig::default(),
            storage: StorageConfig::default(),
            retrieval: RetrievalConfig::default(),
            chunking: ChunkingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            base_url: None,
            api_key: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            qdrant: QdrantConfig::default(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            similarity_threshold: default_similarity_threshold(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(".forage/settings.toml"));

        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(config_path))
            // Layer in environment variables with FORAGE_ prefix.
            // Double underscore (__) separates nested levels; single
            // underscore (_) stays part of the field name.
            .merge(Env::prefixed("FORAGE_").map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                if settings.workspace_root.is_none() {
                    settings.workspace_root = Self::workspace_root();
                }
                settings
            })
    }

    /// Find the workspace config by looking for a .forage directory,
    /// searching from the current directory up to the filesystem root
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(".forage");
            if config_dir.is_dir() {
                return Some(config_dir.join("settings.toml"));
            }
        }

        None
    }

    /// Get the workspace root directory (where .forage is located)
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            if ancestor.join(".forage").is_dir() {
                return Some(ancestor.to_path_buf());
            }
        }

        None
    }

    /// Check if configuration is properly initialized
    pub fn check_init() -> Result<(), String> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(".forage/settings.toml"));

        if !config_path.exists() {
            return Err("No configuration file found".to_string());
        }

        match std::fs::read_to_string(&config_path) {
            Ok(content) => {
                if let Err(e) = toml::from_str::<Settings>(&content) {
                    return Err(format!(
                        "Configuration file is corrupted: {e}\nRun 'forage init --force' to regenerate."
                    ));
                }
            }
            Err(e) => {
                return Err(format!("Cannot read configuration file: {e}"));
            }
        }

        Ok(())
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("FORAGE_").map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file at `.forage/settings.toml`
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = PathBuf::from(".forage/settings.toml");

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        let mut settings = Settings::default();
        if let Ok(current_dir) = std::env::current_dir() {
            settings.workspace_root = Some(current_dir);
        }

        settings.save(&config_path)?;
        if force {
            println!("Overwrote configuration at: {}", config_path.display());
        } else {
            println!("Created default configuration at: {}", config_path.display());
        }

        Ok(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.version, 1);
        assert_eq!(settings.embedding.provider, EmbeddingProviderKind::Local);
        assert_eq!(settings.storage.backend, StorageBackendKind::Memory);
        assert_eq!(settings.retrieval.top_k, 1);
        assert!((settings.retrieval.similarity_threshold - 0.75).abs() < f32::EPSILON);
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");

        let toml_content = r#"
version = 2

[embedding]
provider = "openai"
model = "text-embedding-3-small"

[storage]
backend = "qdrant"

[storage.qdrant]
url = "http://qdrant.internal:6333"

[retrieval]
top_k = 5
similarity_threshold = 0.5
"#;

        fs::write(&config_path, toml_content).unwrap();

        let settings = Settings::load_from(&config_path).unwrap();
        assert_eq!(settings.version, 2);
        assert_eq!(settings.embedding.provider, EmbeddingProviderKind::OpenAi);
        assert_eq!(settings.embedding.model, "text-embedding-3-small");
        assert_eq!(settings.storage.backend, StorageBackendKind::Qdrant);
        assert_eq!(settings.storage.qdrant.url, "http://qdrant.internal:6333");
        assert_eq!(settings.retrieval.top_k, 5);
        assert!((settings.retrieval.similarity_threshold - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_save_settings() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");

        let mut settings = Settings::default();
        settings.retrieval.top_k = 4;
        settings.chunking.max_chunk_chars = 2000;

        settings.save(&config_path).unwrap();

        let loaded = Settings::load_from(&config_path).unwrap();
        assert_eq!(loaded.retrieval.top_k, 4);
        assert_eq!(loaded.chunking.max_chunk_chars, 2000);
    }

    #[test]
    fn test_partial_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");

        // Only specify a few settings
        let toml_content = r#"
[chunking]
max_chunk_chars = 900
"#;

        fs::write(&config_path, toml_content).unwrap();

        let settings = Settings::load_from(&config_path).unwrap();

        // Modified values
        assert_eq!(settings.chunking.max_chunk_chars, 900);

        // Default values should still be present
        assert_eq!(settings.version, 1);
        assert_eq!(settings.retrieval.top_k, 1);
        assert_eq!(settings.storage.qdrant.url, "http://localhost:6333");
    }
}
