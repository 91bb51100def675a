//! Context engine error types.
//!
//! Only caller input reaches the caller of a preview build. Provider failures
//! are reported here but always degrade inside the engine.

use thiserror::Error;

/// Errors from building a context preview.
#[derive(Debug, Error)]
pub enum ContextError {
    /// Request rejected before any work was done.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No project row and no projected entities for the ID.
    #[error("project not found: {0}")]
    ProjectNotFound(String),

    /// HTTP transport failure talking to the summarizer.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Summarizer returned a non-success status.
    #[error("summarizer API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body or parsed error message.
        message: String,
    },

    /// Summarizer response could not be interpreted.
    #[error("invalid summarizer response: {0}")]
    InvalidResponse(String),
}

impl ContextError {
    /// Whether the caller sent a bad request.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::ProjectNotFound(_))
    }
}

/// Result alias for context operations.
pub type Result<T> = std::result::Result<T, ContextError>;
