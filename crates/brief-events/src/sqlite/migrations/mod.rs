//! Versioned schema for the event log and projections.
//!
//! Each step is a SQL file compiled in with [`include_str!`]. Steps apply in
//! ascending version inside their own transaction and are recorded in
//! `schema_version`, so opening an up-to-date database changes nothing.

use rusqlite::{Connection, params};
use tracing::{debug, info};

use crate::errors::{EventStoreError, Result};

/// `(version, description, sql)` in ascending version order.
const STEPS: &[(u32, &str, &str)] = &[
    (1, "event log and projection offsets", include_str!("v001_event_log.sql")),
    (2, "projected entity tables", include_str!("v002_projections.sql")),
    (3, "projection dead letters", include_str!("v003_dead_letters.sql")),
];

fn migration_error(context: impl std::fmt::Display) -> impl FnOnce(rusqlite::Error) -> EventStoreError {
    move |e| EventStoreError::Migration {
        message: format!("{context}: {e}"),
    }
}

/// Bring `conn` up to [`latest_version`]. Returns how many steps ran.
pub fn run_migrations(conn: &Connection) -> Result<u32> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
           version     INTEGER PRIMARY KEY,
           applied_at  TEXT    NOT NULL,
           description TEXT
         );",
    )
    .map_err(migration_error("create schema_version"))?;

    let current = current_version(conn)?;
    let pending: Vec<_> = STEPS.iter().filter(|(v, _, _)| *v > current).collect();
    if pending.is_empty() {
        debug!(version = current, "schema up to date");
        return Ok(0);
    }

    for &&(version, description, sql) in &pending {
        info!(version, description, "applying migration");
        let tx = conn
            .unchecked_transaction()
            .map_err(migration_error(format!("begin v{version}")))?;
        tx.execute_batch(sql)
            .map_err(migration_error(format!("v{version} ({description})")))?;
        let _ = tx
            .execute(
                "INSERT INTO schema_version (version, applied_at, description) VALUES (?1, ?2, ?3)",
                params![version, brief_core::time::format_ts(&brief_core::time::now()), description],
            )
            .map_err(migration_error(format!("record v{version}")))?;
        tx.commit()
            .map_err(migration_error(format!("commit v{version}")))?;
    }

    let applied = u32::try_from(pending.len()).unwrap_or(u32::MAX);
    info!(applied, version = latest_version(), "schema migrated");
    Ok(applied)
}

/// Highest recorded version, 0 on a fresh database.
pub fn current_version(conn: &Connection) -> Result<u32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .map_err(migration_error("read schema_version"))
}

/// Newest version compiled into this build.
pub fn latest_version() -> u32 {
    STEPS.last().map_or(0, |(v, _, _)| *v)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
