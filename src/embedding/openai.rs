//! Embeddings via an OpenAI-compatible `/v1/embeddings` endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{EmbeddingError, EmbeddingProvider};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "text-embedding-3-small";
const DEFAULT_DIMS: usize = 1536;

/// Embedding provider talking to a hosted OpenAI-compatible API.
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    dims: usize,
}

fn normalize_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

fn has_version_suffix(base_url: &str) -> bool {
    let Some(last_segment) = base_url.rsplit('/').next() else {
        return false;
    };
    let Some(rest) = last_segment.strip_prefix('v') else {
        return false;
    };
    !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit())
}

/// Work out the embeddings endpoint from a base URL, tolerating bases with
/// or without a version segment or an explicit `/embeddings` suffix.
fn embeddings_endpoint(base_url: &str) -> String {
    let normalized = normalize_base_url(base_url);
    if normalized.ends_with("/embeddings") {
        return normalized;
    }
    if has_version_suffix(&normalized) {
        return format!("{normalized}/embeddings");
    }
    format!("{normalized}/v1/embeddings")
}

impl OpenAiEmbedder {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            dims: DEFAULT_DIMS,
        }
    }

    /// Override the model and its output dimension.
    pub fn with_model(mut self, model: impl Into<String>, dims: usize) -> Self {
        self.model = model.into();
        self.dims = dims;
        self
    }

    /// Point at a different OpenAI-compatible endpoint.
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = normalize_base_url(url);
        self
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        let response: EmbeddingResponse = self
            .client
            .post(embeddings_endpoint(&self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.data.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                actual: response.data.len(),
            });
        }

        Ok(response.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::embeddings_endpoint;

    #[test]
    fn endpoint_from_host_base_uses_v1_embeddings() {
        assert_eq!(
            embeddings_endpoint("https://api.openai.com"),
            "https://api.openai.com/v1/embeddings"
        );
    }

    #[test]
    fn endpoint_from_versioned_base_appends_embeddings_once() {
        assert_eq!(
            embeddings_endpoint("https://proxy.example.com/v1"),
            "https://proxy.example.com/v1/embeddings"
        );
        assert_eq!(
            embeddings_endpoint("https://gateway.example.cn/api/paas/v4"),
            "https://gateway.example.cn/api/paas/v4/embeddings"
        );
    }

    #[test]
    fn endpoint_preserves_explicit_embeddings_url() {
        assert_eq!(
            embeddings_endpoint("https://api.example.com/v1/embeddings"),
            "https://api.example.com/v1/embeddings"
        );
    }

    #[test]
    fn endpoint_strips_trailing_slash() {
        assert_eq!(
            embeddings_endpoint("https://api.openai.com/"),
            "https://api.openai.com/v1/embeddings"
        );
    }
}
