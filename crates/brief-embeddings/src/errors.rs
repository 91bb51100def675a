//! Embedding error types.
//!
//! Provider errors are recoverable: callers degrade to keyword search.
//! Store errors are not, and surface unchanged.

use brief_events::EventStoreError;
use thiserror::Error;

/// Errors from embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// HTTP transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider returned a non-success status.
    #[error("embedding API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body or parsed error message.
        message: String,
    },

    /// Provider response could not be interpreted.
    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    /// Vector length differs from the configured dimensions.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Configured dimensions.
        expected: usize,
        /// Returned dimensions.
        got: usize,
    },

    /// Projection store failure.
    #[error("store error: {0}")]
    Store(#[from] EventStoreError),

    /// No provider configured, or the provider is not ready.
    #[error("embedding service not ready")]
    NotReady,

    /// Generic internal error.
    #[error("{0}")]
    Internal(String),
}

impl EmbeddingError {
    /// Whether the error came from the provider rather than storage.
    pub fn is_provider_error(&self) -> bool {
        !matches!(self, Self::Store(_) | Self::Internal(_))
    }
}

/// Result alias for embedding operations.
pub type Result<T> = std::result::Result<T, EmbeddingError>;
