//! Dead-letter repository: events whose handler failed permanently.

use brief_core::EventId;
use rusqlite::{Connection, params};

use crate::errors::Result;
use crate::types::DeadLetter;

/// Dead-letter repository. Stateless; every method takes `&Connection`.
pub struct DeadLetterRepo;

impl DeadLetterRepo {
    /// Record a failure. Re-recording the same event replaces the entry.
    pub fn record(conn: &Connection, letter: &DeadLetter) -> Result<()> {
        let _ = conn.execute(
            "INSERT INTO projection_dead_letters
                 (consumer_id, event_id, event_type, error, attempts, failed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (consumer_id, event_id) DO UPDATE SET
                 error = excluded.error,
                 attempts = excluded.attempts,
                 failed_at = excluded.failed_at",
            params![
                letter.consumer_id,
                letter.event_id.as_str(),
                letter.event_type,
                letter.error,
                letter.attempts,
                letter.failed_at,
            ],
        )?;
        Ok(())
    }

    /// Dead letters of one consumer, oldest first.
    pub fn list(conn: &Connection, consumer_id: &str) -> Result<Vec<DeadLetter>> {
        let mut stmt = conn.prepare(
            "SELECT consumer_id, event_id, event_type, error, attempts, failed_at
             FROM projection_dead_letters WHERE consumer_id = ?1
             ORDER BY failed_at ASC, event_id ASC",
        )?;
        let rows = stmt
            .query_map(params![consumer_id], |row| {
                Ok(DeadLetter {
                    consumer_id: row.get(0)?,
                    event_id: EventId::from_string(row.get(1)?),
                    event_type: row.get(2)?,
                    error: row.get(3)?,
                    attempts: row.get(4)?,
                    failed_at: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Number of dead letters of one consumer.
    pub fn count(conn: &Connection, consumer_id: &str) -> Result<u64> {
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM projection_dead_letters WHERE consumer_id = ?1",
            params![consumer_id],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(n).unwrap_or(0))
    }

    /// Drop all dead letters of one consumer.
    pub fn clear(conn: &Connection, consumer_id: &str) -> Result<usize> {
        Ok(conn.execute(
            "DELETE FROM projection_dead_letters WHERE consumer_id = ?1",
            params![consumer_id],
        )?)
    }
}
