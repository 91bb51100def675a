//! Embedding configuration.

use std::time::Duration;

use brief_settings::EmbeddingSettings;

/// Runtime configuration for providers, cache and search.
#[derive(Clone, Debug)]
pub struct EmbeddingConfig {
    /// Whether a real provider should be constructed.
    pub enabled: bool,
    /// Base URL of an OpenAI-compatible API (no trailing `/embeddings`).
    pub base_url: String,
    /// Model name sent with each request.
    pub model: String,
    /// Expected vector dimensions.
    pub dimensions: usize,
    /// Maximum cached vectors.
    pub cache_capacity: usize,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Pause between provider calls during backfill.
    pub backfill_delay: Duration,
    /// Default result limit for semantic search.
    pub search_limit: usize,
    /// Default minimum similarity for semantic search.
    pub search_threshold: f32,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self::from_settings(&EmbeddingSettings::default())
    }
}

impl EmbeddingConfig {
    /// Create config from settings.
    pub fn from_settings(s: &EmbeddingSettings) -> Self {
        Self {
            enabled: s.enabled,
            base_url: s.base_url.trim_end_matches('/').to_string(),
            model: s.model.clone(),
            dimensions: s.dimensions,
            cache_capacity: s.cache_capacity,
            request_timeout: Duration::from_millis(s.request_timeout_ms),
            backfill_delay: Duration::from_millis(s.backfill_delay_ms),
            search_limit: s.search_limit,
            search_threshold: s.search_threshold,
        }
    }

    /// Full URL of the embeddings endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}/embeddings", self.base_url)
    }

    /// Config with the provider switched off (keyword search only).
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}
