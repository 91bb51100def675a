//! Projector error types.

use brief_events::{Event, EventStoreError};
use thiserror::Error;

/// Errors raised while projecting events.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// Storage failure (transient from the loop's point of view).
    #[error("store error: {0}")]
    Store(#[from] EventStoreError),

    /// The event can't be applied: missing entity ID, bad enum value,
    /// out-of-range field, or undecodable payload.
    #[error("malformed {event_type} event {event_id}: {reason}")]
    Malformed {
        /// Offending event.
        event_id: String,
        /// Its type string.
        event_type: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A blocking task panicked or was cancelled.
    #[error("projection task failed: {0}")]
    Task(String),
}

impl ProjectionError {
    /// Build a [`ProjectionError::Malformed`] for `event`.
    pub fn malformed(event: &Event, reason: impl Into<String>) -> Self {
        Self::Malformed {
            event_id: event.id.to_string(),
            event_type: event.event_type.as_str().to_string(),
            reason: reason.into(),
        }
    }

    /// Whether retrying the same event could succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Malformed { .. })
    }
}

/// Result type for projector operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_display() {
        let err = ProjectionError::Malformed {
            event_id: "evt_1".into(),
            event_type: "block.moved".into(),
            reason: "missing block_id".into(),
        };
        assert_eq!(
            err.to_string(),
            "malformed block.moved event evt_1: missing block_id"
        );
        assert!(!err.is_retryable());
    }

    #[test]
    fn store_errors_are_retryable() {
        let err: ProjectionError =
            EventStoreError::Sqlite(rusqlite::Error::QueryReturnedNoRows).into();
        assert!(err.is_retryable());
    }
}
