//! The [`Event`] struct and the log cursor.
//!
//! Events are stored with an opaque JSON `payload`; typed access is opt-in
//! through [`Event::typed_payload()`], which dispatches on [`EventType`].

use brief_core::{EventId, ProjectId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::generated::EventType;

/// An immutable fact in a project's event log.
///
/// Totally ordered by `(created_at, id)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique event ID.
    pub id: EventId,
    /// Project this event belongs to.
    pub project_id: ProjectId,
    /// Event type discriminator.
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// Who caused the event, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<String>,
    /// Event-specific data (opaque JSON).
    pub payload: Value,
    /// Log position timestamp.
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Cursor pointing at this event.
    #[must_use]
    pub fn cursor(&self) -> EventCursor {
        EventCursor {
            event_id: self.id.clone(),
            created_at: brief_core::time::format_ts(&self.created_at),
        }
    }
}

/// A position in the event log: the last consumed `(created_at, id)` pair.
///
/// `created_at` is kept in its stored encoding so comparisons happen in SQL
/// exactly as the log is ordered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCursor {
    /// Last consumed event.
    pub event_id: EventId,
    /// Stored `created_at` of that event.
    pub created_at: String,
}

impl EventCursor {
    /// Whether `other` lies strictly after this cursor in log order.
    #[must_use]
    pub fn precedes(&self, other: &EventCursor) -> bool {
        (self.created_at.as_str(), self.event_id.as_str())
            < (other.created_at.as_str(), other.event_id.as_str())
    }
}
