//! High-level `EventStore` API: append, ordered scans, offsets, dead letters.
//!
//! Methods are synchronous and take a pooled connection per call; async
//! callers wrap them in `spawn_blocking`.

use brief_core::{EventId, ProjectId};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use crate::errors::{EventStoreError, Result};
use crate::sqlite::connection::{ConnectionPool, PooledConnection};
use crate::sqlite::repositories::dead_letter::DeadLetterRepo;
use crate::sqlite::repositories::event::EventRepo;
use crate::sqlite::repositories::offset::OffsetRepo;
use crate::sqlite::row_types::EventRow;
use crate::types::{DeadLetter, Event, EventCursor, EventType, ProjectionOffset};

/// Options for appending an event.
#[derive(Clone, Debug)]
pub struct AppendOptions<'a> {
    /// Project the event belongs to.
    pub project_id: &'a ProjectId,
    /// Event type.
    pub event_type: EventType,
    /// Who caused it.
    pub actor_id: Option<&'a str>,
    /// Event payload (JSON object).
    pub payload: Value,
    /// Explicit log timestamp; defaults to now.
    pub created_at: Option<DateTime<Utc>>,
}

/// High-level event log store wrapping a connection pool.
#[derive(Clone)]
pub struct EventStore {
    pool: ConnectionPool,
}

impl EventStore {
    /// Create a new `EventStore` with the given connection pool.
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<PooledConnection> {
        Ok(self.pool.get()?)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Log
    // ─────────────────────────────────────────────────────────────────────

    /// Append an event to the log.
    ///
    /// The payload must be a JSON object.
    pub fn append(&self, opts: &AppendOptions<'_>) -> Result<Event> {
        if !opts.payload.is_object() {
            return Err(EventStoreError::InvalidOperation(format!(
                "{} payload must be a JSON object",
                opts.event_type
            )));
        }
        let event = Event {
            id: EventId::new(),
            project_id: opts.project_id.clone(),
            event_type: opts.event_type,
            actor_id: opts.actor_id.map(str::to_owned),
            payload: opts.payload.clone(),
            created_at: opts
                .created_at
                .map_or_else(brief_core::time::now, brief_core::time::truncate_micros),
        };
        let conn = self.conn()?;
        EventRepo::insert(&conn, &event)?;
        debug!(
            event_id = %event.id,
            event_type = %event.event_type,
            project_id = %event.project_id,
            "event appended"
        );
        Ok(event)
    }

    /// Append a raw row without type validation (imports, replays from
    /// other producers).
    pub fn append_row(&self, row: &EventRow) -> Result<()> {
        let conn = self.conn()?;
        EventRepo::insert_raw(&conn, row)
    }

    /// Get a single event row by ID.
    pub fn get_event(&self, event_id: &str) -> Result<Option<EventRow>> {
        let conn = self.conn()?;
        EventRepo::get_by_id(&conn, event_id)
    }

    /// Up to `limit` events strictly after `cursor`, in log order.
    pub fn events_after(&self, cursor: Option<&EventCursor>, limit: usize) -> Result<Vec<EventRow>> {
        let conn = self.conn()?;
        EventRepo::list_after(&conn, cursor, limit)
    }

    /// Number of events strictly after `cursor`.
    pub fn count_after(&self, cursor: Option<&EventCursor>) -> Result<u64> {
        let conn = self.conn()?;
        EventRepo::count_after(&conn, cursor)
    }

    /// All events of one project, in log order.
    pub fn events_for_project(&self, project_id: &str) -> Result<Vec<EventRow>> {
        let conn = self.conn()?;
        EventRepo::list_for_project(&conn, project_id)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Offsets
    // ─────────────────────────────────────────────────────────────────────

    /// Current offset of a consumer.
    pub fn get_offset(&self, consumer_id: &str) -> Result<Option<ProjectionOffset>> {
        let conn = self.conn()?;
        OffsetRepo::get(&conn, consumer_id)
    }

    /// Advance a consumer's offset; never moves backwards.
    pub fn advance_offset(&self, consumer_id: &str, cursor: &EventCursor) -> Result<bool> {
        let conn = self.conn()?;
        OffsetRepo::advance(&conn, consumer_id, cursor)
    }

    /// Reset a consumer so it replays from the start of the log.
    pub fn reset_offset(&self, consumer_id: &str) -> Result<bool> {
        let conn = self.conn()?;
        OffsetRepo::reset(&conn, consumer_id)
    }

    /// All consumer offsets.
    pub fn list_offsets(&self) -> Result<Vec<ProjectionOffset>> {
        let conn = self.conn()?;
        OffsetRepo::list(&conn)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Dead letters
    // ─────────────────────────────────────────────────────────────────────

    /// Record a permanently failed event.
    pub fn record_dead_letter(&self, letter: &DeadLetter) -> Result<()> {
        let conn = self.conn()?;
        DeadLetterRepo::record(&conn, letter)
    }

    /// Dead letters of a consumer.
    pub fn dead_letters(&self, consumer_id: &str) -> Result<Vec<DeadLetter>> {
        let conn = self.conn()?;
        DeadLetterRepo::list(&conn, consumer_id)
    }

    /// Number of dead letters of a consumer.
    pub fn count_dead_letters(&self, consumer_id: &str) -> Result<u64> {
        let conn = self.conn()?;
        DeadLetterRepo::count(&conn, consumer_id)
    }

    /// Drop a consumer's dead letters.
    pub fn clear_dead_letters(&self, consumer_id: &str) -> Result<usize> {
        let conn = self.conn()?;
        DeadLetterRepo::clear(&conn, consumer_id)
    }

    /// Get the raw connection pool.
    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use crate::sqlite::connection::ConnectionConfig;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn setup() -> EventStore {
        EventStore::new(crate::open_in_memory(&ConnectionConfig::default()).unwrap())
    }

    fn append(store: &EventStore, event_type: EventType, payload: Value) -> Event {
        store
            .append(&AppendOptions {
                project_id: &ProjectId::from("prj_1"),
                event_type,
                actor_id: Some("user_1"),
                payload,
                created_at: None,
            })
            .unwrap()
    }

    #[test]
    fn explicit_timestamp_matches_stored_row() {
        let store = setup();
        let at = brief_core::time::parse_ts("2024-03-01T09:00:00.123456789Z").unwrap();
        let event = store
            .append(&AppendOptions {
                project_id: &ProjectId::from("prj_1"),
                event_type: EventType::BlockCreated,
                actor_id: None,
                payload: json!({"block_id": "blk_1"}),
                created_at: Some(at),
            })
            .unwrap();
        let row = store.get_event(event.id.as_str()).unwrap().unwrap();
        assert_eq!(row.created_at, "2024-03-01T09:00:00.123456Z");
        assert_eq!(event.cursor(), row.cursor());
        assert_eq!(row.into_event().unwrap(), event);
    }

    #[test]
    fn append_assigns_id_and_timestamp() {
        let store = setup();
        let event = append(&store, EventType::BlockCreated, json!({"block_id": "blk_1"}));
        assert!(event.id.as_str().starts_with("evt_"));
        let row = store.get_event(event.id.as_str()).unwrap().unwrap();
        assert_eq!(row.clone().into_event().unwrap(), event);
    }

    #[test]
    fn append_rejects_non_object_payload() {
        let store = setup();
        let err = store
            .append(&AppendOptions {
                project_id: &ProjectId::from("prj_1"),
                event_type: EventType::BlockCreated,
                actor_id: None,
                payload: json!([1, 2]),
                created_at: None,
            })
            .unwrap_err();
        assert_matches!(err, EventStoreError::InvalidOperation(_));
    }

    #[test]
    fn events_after_pages_through_log() {
        let store = setup();
        let ids: Vec<_> = (0..5)
            .map(|i| append(&store, EventType::BlockDeleted, json!({"block_id": format!("blk_{i}")})).id)
            .collect();

        let first = store.events_after(None, 2).unwrap();
        assert_eq!(first.len(), 2);
        let rest = store.events_after(Some(&first[1].cursor()), 10).unwrap();
        let all: Vec<_> = first.iter().chain(rest.iter()).map(|r| r.id.clone()).collect();
        let expected: Vec<_> = ids.iter().map(|id| id.to_string()).collect();
        assert_eq!(all, expected);
        assert_eq!(store.count_after(Some(&first[1].cursor())).unwrap(), 3);
    }

    #[test]
    fn offsets_round_trip() {
        let store = setup();
        let event = append(&store, EventType::BlockDeleted, json!({}));
        assert!(store.get_offset("c").unwrap().is_none());
        assert!(store.advance_offset("c", &event.cursor()).unwrap());
        let offset = store.get_offset("c").unwrap().unwrap();
        assert_eq!(offset.last_event_id, event.id);
        assert_eq!(store.list_offsets().unwrap().len(), 1);
        assert!(store.reset_offset("c").unwrap());
        assert!(store.get_offset("c").unwrap().is_none());
    }

    #[test]
    fn dead_letters_round_trip() {
        let store = setup();
        store
            .record_dead_letter(&DeadLetter {
                consumer_id: "c".into(),
                event_id: EventId::from("evt_1"),
                event_type: "block.moved".into(),
                error: "boom".into(),
                attempts: 1,
                failed_at: "2024-01-01T00:00:00.000000Z".into(),
            })
            .unwrap();
        assert_eq!(store.count_dead_letters("c").unwrap(), 1);
        assert_eq!(store.dead_letters("c").unwrap()[0].error, "boom");
        assert_eq!(store.clear_dead_letters("c").unwrap(), 1);
    }
}
