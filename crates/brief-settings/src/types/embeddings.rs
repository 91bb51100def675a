//! Embedding provider and semantic search settings.

use serde::{Deserialize, Serialize};

/// Embedding provider, cache and search configuration.
///
/// The API key is never read from the settings file; it comes from the
/// `BRIEF_EMBEDDING_API_KEY` environment variable.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmbeddingSettings {
    /// Whether to construct the HTTP embedding provider at all.
    pub enabled: bool,
    /// Base URL of an OpenAI-compatible embeddings API.
    pub base_url: String,
    /// Embedding model name.
    pub model: String,
    /// Expected vector dimensions.
    pub dimensions: usize,
    /// Maximum entries in the text→vector cache.
    pub cache_capacity: usize,
    /// Per-request timeout.
    pub request_timeout_ms: u64,
    /// Delay between provider calls during backfill.
    pub backfill_delay_ms: u64,
    /// Default result limit for semantic search.
    pub search_limit: usize,
    /// Default minimum cosine similarity for semantic search.
    pub search_threshold: f32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
            cache_capacity: 200,
            request_timeout_ms: 30_000,
            backfill_delay_ms: 100,
            search_limit: 10,
            search_threshold: 0.7,
        }
    }
}
