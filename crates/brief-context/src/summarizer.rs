//! Text-generation capability used to compress overflow items.
//!
//! [`HttpSummarizer`] talks to the Anthropic Messages API. Callers treat any
//! error as a signal to use the truncation fallback.

use std::fmt::Write as _;
use std::time::Duration;

use async_trait::async_trait;
use brief_settings::SummarizerSettings;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::{ContextError, Result};
use crate::types::ContextPreviewItem;

const ANTHROPIC_VERSION: &str = "2023-06-01";

const SYSTEM_PROMPT: &str = "You compress project context for another assistant. \
Keep decisions, blockers and unfinished work. Reply with plain text only.";

/// Input to one summarization call.
#[derive(Clone, Debug, PartialEq)]
pub struct SummaryRequest {
    /// Items to compress, most relevant first.
    pub items: Vec<ContextPreviewItem>,
    /// Upper bound on the summary's tokens.
    pub target_tokens: usize,
    /// Query the caller is focused on.
    pub focus_query: Option<String>,
}

/// Compresses a set of preview items into one text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize `request.items` in at most `request.target_tokens` tokens.
    async fn summarize(&self, request: &SummaryRequest) -> Result<String>;
}

// =============================================================================
// HTTP Summarizer
// =============================================================================

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Summarizer backed by `POST {base_url}/v1/messages`.
pub struct HttpSummarizer {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    max_output_tokens: u32,
    api_key: String,
}

impl HttpSummarizer {
    /// Create a summarizer with an explicit API key.
    pub fn new(settings: &SummarizerSettings, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/v1/messages", settings.base_url.trim_end_matches('/')),
            model: settings.model.clone(),
            max_output_tokens: settings.max_output_tokens.max(1),
            api_key: api_key.into(),
        })
    }

    /// Create a summarizer when enabled and a key is present.
    pub fn from_settings(settings: &SummarizerSettings, api_key: Option<String>) -> Result<Option<Self>> {
        match api_key.filter(|k| !k.trim().is_empty()) {
            Some(key) if settings.enabled => Self::new(settings, key).map(Some),
            Some(_) => {
                debug!("summarizer disabled in settings");
                Ok(None)
            }
            None => {
                debug!("no summarizer API key, overflow will be dropped");
                Ok(None)
            }
        }
    }

    /// Endpoint requests are sent to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn max_tokens(&self, target_tokens: usize) -> u32 {
        u32::try_from(target_tokens)
            .unwrap_or(u32::MAX)
            .clamp(1, self.max_output_tokens)
    }
}

#[async_trait]
impl Summarizer for HttpSummarizer {
    async fn summarize(&self, request: &SummaryRequest) -> Result<String> {
        let prompt = build_prompt(request);
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens(request.target_tokens),
            system: SYSTEM_PROMPT,
            messages: [Message {
                role: "user",
                content: &prompt,
            }],
        };

        debug!(
            items = request.items.len(),
            target_tokens = request.target_tokens,
            model = %self.model,
            "requesting summary"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .map(|b| b.error.message)
                .unwrap_or(text);
            warn!(status = status.as_u16(), %message, "summarizer request failed");
            return Err(ContextError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ContextError::InvalidResponse(e.to_string()))?;
        let text = parsed
            .content
            .into_iter()
            .filter(|b| b.kind == "text")
            .filter_map(|b| b.text)
            .collect::<Vec<_>>()
            .join("\n");
        let text = text.trim();
        if text.is_empty() {
            return Err(ContextError::InvalidResponse("no text content".into()));
        }
        Ok(text.to_string())
    }
}

/// Prompt listing the items to compress.
pub fn build_prompt(request: &SummaryRequest) -> String {
    let mut prompt = format!(
        "Compress the following {} project items into at most {} tokens.\n",
        request.items.len(),
        request.target_tokens
    );
    if let Some(query) = request.focus_query.as_deref().filter(|q| !q.trim().is_empty()) {
        let _ = writeln!(prompt, "Focus on what matters for: {}", query.trim());
    }
    for item in &request.items {
        prompt.push_str("\n---\n");
        let kind = item.category.as_deref().unwrap_or(item.item_type.as_str());
        let _ = writeln!(prompt, "[{kind}] {}", item.text());
    }
    prompt
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use crate::types::PreviewItemType;
    use assert_matches::assert_matches;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(base_url: &str) -> SummarizerSettings {
        SummarizerSettings {
            base_url: base_url.to_string(),
            ..SummarizerSettings::default()
        }
    }

    fn request() -> SummaryRequest {
        let mut item = ContextPreviewItem::new(
            "ctx_1",
            PreviewItemType::Context,
            "manual",
            Some("Token format".into()),
            "Use JWT with short expiry.",
        );
        item.category = Some("decision".into());
        SummaryRequest {
            items: vec![item],
            target_tokens: 200,
            focus_query: Some("auth".into()),
        }
    }

    #[test]
    fn prompt_lists_items_and_focus() {
        let prompt = build_prompt(&request());
        assert!(prompt.starts_with("Compress the following 1 project items into at most 200 tokens."));
        assert!(prompt.contains("Focus on what matters for: auth"));
        assert!(prompt.contains("[decision] Token format\nUse JWT with short expiry."));
    }

    #[test]
    fn from_settings_needs_key_and_enabled() {
        let s = SummarizerSettings::default();
        assert!(HttpSummarizer::from_settings(&s, None).unwrap().is_none());
        assert!(HttpSummarizer::from_settings(&s, Some("  ".into())).unwrap().is_none());
        assert!(HttpSummarizer::from_settings(&s, Some("key".into())).unwrap().is_some());
        let disabled = SummarizerSettings {
            enabled: false,
            ..SummarizerSettings::default()
        };
        assert!(HttpSummarizer::from_settings(&disabled, Some("key".into())).unwrap().is_none());
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        let s = HttpSummarizer::new(&settings("http://localhost:9/"), "k").unwrap();
        assert_eq!(s.endpoint(), "http://localhost:9/v1/messages");
    }

    #[test]
    fn max_tokens_bounded_by_settings() {
        let s = HttpSummarizer::new(&settings("http://localhost:9"), "k").unwrap();
        assert_eq!(s.max_tokens(200), 200);
        assert_eq!(s.max_tokens(0), 1);
        assert_eq!(s.max_tokens(50_000), 1024);
    }

    #[tokio::test]
    async fn summarize_returns_text_blocks() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "secret"))
            .and(header("anthropic-version", ANTHROPIC_VERSION))
            .and(body_partial_json(json!({"max_tokens": 200})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{"type": "text", "text": "  JWT chosen for auth.  "}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let summarizer = HttpSummarizer::new(&settings(&server.uri()), "secret").unwrap();
        let text = summarizer.summarize(&request()).await.unwrap();
        assert_eq!(text, "JWT chosen for auth.");
    }

    #[tokio::test]
    async fn summarize_surfaces_api_error_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(529).set_body_json(json!({
                "type": "error",
                "error": {"type": "overloaded_error", "message": "Overloaded"}
            })))
            .mount(&server)
            .await;

        let summarizer = HttpSummarizer::new(&settings(&server.uri()), "secret").unwrap();
        let err = summarizer.summarize(&request()).await.unwrap_err();
        assert_matches!(err, ContextError::Api { status: 529, ref message } if message == "Overloaded");
    }

    #[tokio::test]
    async fn summarize_rejects_empty_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": []})))
            .mount(&server)
            .await;

        let summarizer = HttpSummarizer::new(&settings(&server.uri()), "secret").unwrap();
        let err = summarizer.summarize(&request()).await.unwrap_err();
        assert_matches!(err, ContextError::InvalidResponse(_));
    }
}
