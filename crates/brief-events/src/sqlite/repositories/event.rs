//! Event repository: the append-only log.
//!
//! Events are ordered by `(created_at, id)`. Reads after a cursor use a
//! row-value comparison so events sharing a timestamp are never skipped.

use rusqlite::{Connection, OptionalExtension, params};

use crate::errors::Result;
use crate::sqlite::row_types::EventRow;
use crate::types::{Event, EventCursor};

const COLUMNS: &str = "id, project_id, type, actor_id, payload, created_at";

/// Event repository. Stateless; every method takes `&Connection`.
pub struct EventRepo;

impl EventRepo {
    /// Insert a single event.
    pub fn insert(conn: &Connection, event: &Event) -> Result<()> {
        let payload = serde_json::to_string(&event.payload)?;
        let _ = conn.execute(
            "INSERT INTO events (id, project_id, type, actor_id, payload, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                event.id.as_str(),
                event.project_id.as_str(),
                event.event_type.as_str(),
                event.actor_id,
                payload,
                brief_core::time::format_ts(&event.created_at),
            ],
        )?;
        Ok(())
    }

    /// Insert a raw row as-is (type string is not validated).
    pub fn insert_raw(conn: &Connection, row: &EventRow) -> Result<()> {
        let _ = conn.execute(
            "INSERT INTO events (id, project_id, type, actor_id, payload, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                row.id,
                row.project_id,
                row.event_type,
                row.actor_id,
                row.payload,
                row.created_at
            ],
        )?;
        Ok(())
    }

    /// Get a single event row by ID.
    pub fn get_by_id(conn: &Connection, event_id: &str) -> Result<Option<EventRow>> {
        let row = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM events WHERE id = ?1"),
                params![event_id],
                Self::map_row,
            )
            .optional()?;
        Ok(row)
    }

    /// Up to `limit` events strictly after `cursor`, in log order.
    ///
    /// `None` reads from the beginning of the log.
    pub fn list_after(
        conn: &Connection,
        cursor: Option<&EventCursor>,
        limit: usize,
    ) -> Result<Vec<EventRow>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = match cursor {
            Some(c) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {COLUMNS} FROM events
                     WHERE (created_at, id) > (?1, ?2)
                     ORDER BY created_at ASC, id ASC
                     LIMIT ?3"
                ))?;
                stmt.query_map(
                    params![c.created_at, c.event_id.as_str(), limit],
                    Self::map_row,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {COLUMNS} FROM events
                     ORDER BY created_at ASC, id ASC
                     LIMIT ?1"
                ))?;
                stmt.query_map(params![limit], Self::map_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?
            }
        };
        Ok(rows)
    }

    /// Number of events strictly after `cursor`.
    pub fn count_after(conn: &Connection, cursor: Option<&EventCursor>) -> Result<u64> {
        let count: i64 = match cursor {
            Some(c) => conn.query_row(
                "SELECT COUNT(*) FROM events WHERE (created_at, id) > (?1, ?2)",
                params![c.created_at, c.event_id.as_str()],
                |row| row.get(0),
            )?,
            None => conn.query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?,
        };
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// All events of one project, in log order.
    pub fn list_for_project(conn: &Connection, project_id: &str) -> Result<Vec<EventRow>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM events WHERE project_id = ?1 ORDER BY created_at ASC, id ASC"
        ))?;
        let rows = stmt
            .query_map(params![project_id], Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EventRow> {
        Ok(EventRow {
            id: row.get(0)?,
            project_id: row.get(1)?,
            event_type: row.get(2)?,
            actor_id: row.get(3)?,
            payload: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
