//! Event handlers.
//!
//! Each handler is an idempotent mutation of the projected tables. Applying
//! the same event twice leaves the same state as applying it once, so the
//! projector can deliver at-least-once.

mod block;
mod context;
mod github;
mod project;
mod session;

use brief_events::{Event, EventPayload};
use rusqlite::Connection;

use crate::errors::{ProjectionError, Result};

/// Apply one event inside the caller's transaction.
pub(crate) fn apply(conn: &Connection, event: &Event) -> Result<()> {
    let payload = event
        .typed_payload()
        .map_err(|e| ProjectionError::malformed(event, e.to_string()))?;

    match payload {
        EventPayload::BlockCreated(p) => block::created(conn, event, p),
        EventPayload::BlockMoved(p) => block::moved(conn, event, &p),
        EventPayload::BlockProgressUpdated(p) => block::progress_updated(conn, event, &p),
        EventPayload::BlockUpdated(p) => block::updated(conn, event, &p),
        EventPayload::BlockDeleted(p) => block::deleted(conn, event, &p),
        EventPayload::ContextCaptured(p) => context::captured(conn, event, p),
        EventPayload::ContextLinked(p) => context::linked(conn, event, &p),
        EventPayload::SessionStarted(p) => session::started(conn, event, &p),
        EventPayload::SessionEnded(p) => session::ended(conn, event, &p),
        EventPayload::GitHubPr(p)
        | EventPayload::GitHubIssue(p)
        | EventPayload::GitHubCommit(p)
        | EventPayload::GitHubRelease(p)
        | EventPayload::GitHubPrComment(p) => github::upsert(conn, event, &p),
        EventPayload::ProjectCreated(p) | EventPayload::ProjectUpdated(p) => {
            project::upsert(conn, event, &p)
        }
    }
}

/// Unwrap a required payload field or reject the event as malformed.
fn require<T>(event: &Event, value: Option<T>, field: &str) -> Result<T> {
    value.ok_or_else(|| ProjectionError::malformed(event, format!("missing {field}")))
}

/// Validate a progress percentage.
fn progress(event: &Event, raw: i64) -> Result<u8> {
    u8::try_from(raw)
        .ok()
        .filter(|p| *p <= 100)
        .ok_or_else(|| ProjectionError::malformed(event, format!("progress {raw} out of range 0..=100")))
}

/// Trim and drop empty strings.
fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}
