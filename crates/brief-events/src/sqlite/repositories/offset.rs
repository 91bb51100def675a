//! Projection offset repository: one cursor row per consumer.

use brief_core::EventId;
use rusqlite::{Connection, OptionalExtension, params};

use crate::errors::Result;
use crate::types::{EventCursor, ProjectionOffset};

/// Offset repository. Stateless; every method takes `&Connection`.
pub struct OffsetRepo;

impl OffsetRepo {
    /// Current offset of `consumer_id`, if it has ever advanced.
    pub fn get(conn: &Connection, consumer_id: &str) -> Result<Option<ProjectionOffset>> {
        let row = conn
            .query_row(
                "SELECT consumer_id, last_event_id, last_seen_at, updated_at
                 FROM projection_offsets WHERE consumer_id = ?1",
                params![consumer_id],
                Self::map_row,
            )
            .optional()?;
        Ok(row)
    }

    /// Move `consumer_id` to `cursor`.
    ///
    /// Only moves forward: a cursor at or before the stored one is ignored.
    /// Returns whether the offset changed.
    pub fn advance(conn: &Connection, consumer_id: &str, cursor: &EventCursor) -> Result<bool> {
        let changed = conn.execute(
            "INSERT INTO projection_offsets (consumer_id, last_event_id, last_seen_at, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (consumer_id) DO UPDATE SET
                 last_event_id = excluded.last_event_id,
                 last_seen_at = excluded.last_seen_at,
                 updated_at = excluded.updated_at
             WHERE (excluded.last_seen_at, excluded.last_event_id)
                 > (projection_offsets.last_seen_at, projection_offsets.last_event_id)",
            params![
                consumer_id,
                cursor.event_id.as_str(),
                cursor.created_at,
                brief_core::time::format_ts(&brief_core::time::now()),
            ],
        )?;
        Ok(changed > 0)
    }

    /// Forget `consumer_id`'s position so it replays from the start.
    pub fn reset(conn: &Connection, consumer_id: &str) -> Result<bool> {
        let changed = conn.execute(
            "DELETE FROM projection_offsets WHERE consumer_id = ?1",
            params![consumer_id],
        )?;
        Ok(changed > 0)
    }

    /// All consumer offsets.
    pub fn list(conn: &Connection) -> Result<Vec<ProjectionOffset>> {
        let mut stmt = conn.prepare(
            "SELECT consumer_id, last_event_id, last_seen_at, updated_at
             FROM projection_offsets ORDER BY consumer_id",
        )?;
        let rows = stmt
            .query_map([], Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProjectionOffset> {
        Ok(ProjectionOffset {
            consumer_id: row.get(0)?,
            last_event_id: EventId::from_string(row.get(1)?),
            last_seen_at: row.get(2)?,
            updated_at: row.get(3)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::repositories::test_support::open;

    fn cursor(id: &str, at: &str) -> EventCursor {
        EventCursor {
            event_id: EventId::from(id),
            created_at: at.into(),
        }
    }

    #[test]
    fn get_missing_is_none() {
        let conn = open();
        assert!(OffsetRepo::get(&conn, "c").unwrap().is_none());
    }

    #[test]
    fn advance_creates_then_moves_forward() {
        let conn = open();
        assert!(OffsetRepo::advance(&conn, "c", &cursor("evt_a", "2024-01-01T00:00:00.000000Z")).unwrap());
        assert!(OffsetRepo::advance(&conn, "c", &cursor("evt_b", "2024-01-01T00:00:00.000000Z")).unwrap());
        let offset = OffsetRepo::get(&conn, "c").unwrap().unwrap();
        assert_eq!(offset.last_event_id.as_str(), "evt_b");
    }

    #[test]
    fn advance_never_moves_backwards() {
        let conn = open();
        let _ = OffsetRepo::advance(&conn, "c", &cursor("evt_b", "2024-01-02T00:00:00.000000Z")).unwrap();
        let moved = OffsetRepo::advance(&conn, "c", &cursor("evt_a", "2024-01-01T00:00:00.000000Z")).unwrap();
        assert!(!moved);
        let same = OffsetRepo::advance(&conn, "c", &cursor("evt_b", "2024-01-02T00:00:00.000000Z")).unwrap();
        assert!(!same);
        let offset = OffsetRepo::get(&conn, "c").unwrap().unwrap();
        assert_eq!(offset.last_event_id.as_str(), "evt_b");
    }

    #[test]
    fn consumers_are_independent() {
        let conn = open();
        let _ = OffsetRepo::advance(&conn, "a", &cursor("evt_1", "2024-01-01T00:00:00.000000Z")).unwrap();
        let _ = OffsetRepo::advance(&conn, "b", &cursor("evt_2", "2024-01-02T00:00:00.000000Z")).unwrap();
        assert_eq!(OffsetRepo::list(&conn).unwrap().len(), 2);
        assert!(OffsetRepo::reset(&conn, "a").unwrap());
        assert!(OffsetRepo::get(&conn, "a").unwrap().is_none());
        assert!(OffsetRepo::get(&conn, "b").unwrap().is_some());
    }
}
