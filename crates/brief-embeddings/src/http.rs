//! OpenAI-compatible HTTP embedding provider.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::EmbeddingConfig;
use crate::errors::{EmbeddingError, Result};
use crate::service::EmbeddingService;

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Provider for `POST {base_url}/embeddings`.
pub struct HttpEmbeddingService {
    client: reqwest::Client,
    config: EmbeddingConfig,
    api_key: Option<String>,
}

impl HttpEmbeddingService {
    /// Create a provider. `api_key` is sent as a bearer token when present.
    pub fn new(config: EmbeddingConfig, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            config,
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }

    fn parse_error(status: u16, body: &str) -> EmbeddingError {
        let message = serde_json::from_str::<ApiErrorBody>(body)
            .map(|b| b.error.message)
            .unwrap_or_else(|_| body.to_string());
        EmbeddingError::Api { status, message }
    }
}

#[async_trait]
impl EmbeddingService for HttpEmbeddingService {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut request = self
            .client
            .post(self.config.endpoint())
            .header(CONTENT_TYPE, "application/json")
            .json(&EmbeddingRequest {
                model: &self.config.model,
                input: texts,
            });
        if let Some(key) = &self.api_key {
            request = request.header(AUTHORIZATION, format!("Bearer {key}"));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), model = %self.config.model, "embedding request failed");
            return Err(Self::parse_error(status.as_u16(), &body));
        }

        let mut parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;
        if parsed.data.len() != texts.len() {
            return Err(EmbeddingError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                parsed.data.len()
            )));
        }
        parsed.data.sort_by_key(|d| d.index);

        let mut vectors = Vec::with_capacity(parsed.data.len());
        for datum in parsed.data {
            if datum.embedding.len() != self.config.dimensions {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: self.config.dimensions,
                    got: datum.embedding.len(),
                });
            }
            vectors.push(datum.embedding);
        }
        debug!(count = vectors.len(), model = %self.config.model, "embedded texts");
        Ok(vectors)
    }

    fn is_ready(&self) -> bool {
        self.config.enabled
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }
}
