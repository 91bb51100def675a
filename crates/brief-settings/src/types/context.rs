//! Context ranking and compression settings.

use serde::{Deserialize, Serialize};

/// Defaults for preview requests and the compression provider.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContextSettings {
    /// Token budget used when a request doesn't specify one.
    pub default_token_budget: usize,
    /// Include blocks by default.
    pub include_blocks: bool,
    /// Include context items by default.
    pub include_context: bool,
    /// Include GitHub entities by default.
    pub include_github: bool,
    /// Add the embedding-based boost when a query is given.
    pub semantic_boost: bool,
    /// AI compression of overflow items.
    pub summarizer: SummarizerSettings,
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self {
            default_token_budget: 4000,
            include_blocks: true,
            include_context: true,
            include_github: true,
            semantic_boost: true,
            summarizer: SummarizerSettings::default(),
        }
    }
}

/// Text-generation provider used to compress overflow.
///
/// The API key comes from `ANTHROPIC_API_KEY`; without it no summarizer is
/// constructed and overflow is dropped.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SummarizerSettings {
    /// Whether to construct the summarizer.
    pub enabled: bool,
    /// Messages API base URL.
    pub base_url: String,
    /// Model used for compression.
    pub model: String,
    /// Upper bound on generated tokens.
    pub max_output_tokens: u32,
    /// Per-request timeout.
    pub timeout_ms: u64,
}

impl Default for SummarizerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.anthropic.com".to_string(),
            model: "claude-haiku-4-5".to_string(),
            max_output_tokens: 1024,
            timeout_ms: 30_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_include_everything() {
        let s = ContextSettings::default();
        assert!(s.include_blocks && s.include_context && s.include_github);
        assert!(s.summarizer.enabled);
        assert_eq!(s.summarizer.max_output_tokens, 1024);
    }
}
