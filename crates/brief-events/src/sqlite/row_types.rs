//! Database row types and column helpers.
//!
//! [`EventRow`] keeps the raw stored shape so the projector can advance past
//! rows whose type string or payload it can't interpret. Entity rows map
//! straight into the public entity types through the helpers below.

use brief_core::time::{format_ts, parse_ts};
use brief_core::{EventId, ProjectId};
use chrono::{DateTime, Utc};
use rusqlite::Row;
use rusqlite::types::{FromSqlError, Type};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{EventStoreError, Result};
use crate::types::{Event, EventCursor, EventType};

/// Raw event row from the `events` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventRow {
    /// Event ID.
    pub id: String,
    /// Project ID.
    pub project_id: String,
    /// Event type string (may be unknown to this build).
    pub event_type: String,
    /// Actor ID.
    pub actor_id: Option<String>,
    /// Payload as stored JSON text.
    pub payload: String,
    /// Stored timestamp.
    pub created_at: String,
}

impl EventRow {
    /// Cursor pointing at this row.
    #[must_use]
    pub fn cursor(&self) -> EventCursor {
        EventCursor {
            event_id: EventId::from(self.id.as_str()),
            created_at: self.created_at.clone(),
        }
    }

    /// Convert into a typed [`Event`].
    ///
    /// Fails with [`EventStoreError::UnknownEventType`] for type strings this
    /// build doesn't know.
    pub fn into_event(self) -> Result<Event> {
        let event_type: EventType = self
            .event_type
            .parse()
            .map_err(|_| EventStoreError::UnknownEventType(self.event_type.clone()))?;
        let payload: Value = serde_json::from_str(&self.payload)?;
        Ok(Event {
            id: EventId::from_string(self.id),
            project_id: ProjectId::from_string(self.project_id),
            event_type,
            actor_id: self.actor_id,
            payload,
            created_at: parse_ts(&self.created_at)?,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Column helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Read a required timestamp column.
pub fn ts_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_ts(&raw).map_err(|e| conversion_error(idx, e))
}

/// Read an optional timestamp column.
pub fn opt_ts_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| parse_ts(&s).map_err(|e| conversion_error(idx, e)))
        .transpose()
}

/// Read a JSON text column, defaulting to `{}` when NULL.
pub fn json_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Value> {
    let raw: Option<String> = row.get(idx)?;
    match raw {
        Some(s) => serde_json::from_str(&s).map_err(|e| conversion_error(idx, e)),
        None => Ok(Value::Object(serde_json::Map::new())),
    }
}

/// Read a progress column, clamped into `0..=100`.
pub fn progress_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<u8> {
    let raw: i64 = row.get(idx)?;
    Ok(clamp_progress(raw))
}

/// Read an optional embedding blob column.
pub fn embedding_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Vec<f32>>> {
    let raw: Option<Vec<u8>> = row.get(idx)?;
    match raw {
        Some(bytes) if bytes.len() % 4 != 0 => Err(rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Blob,
            Box::new(FromSqlError::InvalidBlobSize {
                expected_size: bytes.len() - bytes.len() % 4,
                blob_size: bytes.len(),
            }),
        )),
        Some(bytes) => Ok(Some(blob_to_f32_vec(&bytes))),
        None => Ok(None),
    }
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

/// Clamp a raw progress value into `0..=100`.
#[must_use]
pub fn clamp_progress(raw: i64) -> u8 {
    u8::try_from(raw.clamp(0, 100)).unwrap_or(0)
}

/// Encode a timestamp for storage.
#[must_use]
pub fn ts_param(ts: &DateTime<Utc>) -> String {
    format_ts(ts)
}

/// Serialize an `f32` vector as a little-endian byte blob.
#[must_use]
pub fn f32_slice_to_blob(v: &[f32]) -> Vec<u8> {
    v.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Deserialize a little-endian byte blob into an `f32` vector.
#[must_use]
pub fn blob_to_f32_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn row(event_type: &str, payload: &str) -> EventRow {
        EventRow {
            id: "evt_1".into(),
            project_id: "prj_1".into(),
            event_type: event_type.into(),
            actor_id: Some("user_1".into()),
            payload: payload.into(),
            created_at: "2024-01-15T12:00:00.000000Z".into(),
        }
    }

    #[test]
    fn into_event_known_type() {
        let event = row("block.deleted", r#"{"block_id":"blk_1"}"#)
            .into_event()
            .unwrap();
        assert_eq!(event.event_type, EventType::BlockDeleted);
        assert_eq!(event.actor_id.as_deref(), Some("user_1"));
        assert_eq!(event.payload["block_id"], "blk_1");
    }

    #[test]
    fn into_event_unknown_type() {
        let err = row("block.exploded", "{}").into_event().unwrap_err();
        assert_matches!(err, EventStoreError::UnknownEventType(t) if t == "block.exploded");
    }

    #[test]
    fn into_event_bad_payload() {
        let err = row("block.deleted", "{oops").into_event().unwrap_err();
        assert_matches!(err, EventStoreError::Serde(_));
    }

    #[test]
    fn cursor_from_row() {
        let c = row("block.deleted", "{}").cursor();
        assert_eq!(c.event_id.as_str(), "evt_1");
        assert_eq!(c.created_at, "2024-01-15T12:00:00.000000Z");
    }

    #[test]
    fn clamp_progress_bounds() {
        assert_eq!(clamp_progress(-5), 0);
        assert_eq!(clamp_progress(55), 55);
        assert_eq!(clamp_progress(250), 100);
    }

    #[test]
    fn blob_roundtrip_f32() {
        let v = vec![0.25_f32, -1.5, 3.0];
        assert_eq!(blob_to_f32_vec(&f32_slice_to_blob(&v)), v);
    }
}
