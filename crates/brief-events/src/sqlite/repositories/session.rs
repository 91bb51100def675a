//! Assistant work session repository.

use brief_core::{BlockId, ProjectId};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;

use crate::errors::Result;
use crate::sqlite::row_types::{json_col, opt_ts_col, ts_col, ts_param};
use crate::types::{ClaudeSession, SessionStatus};

const COLUMNS: &str = "id, project_id, block_id, status, title, summary, metadata, started_at, \
                       ended_at, updated_at";

/// Session repository. Stateless; every method takes `&Connection`.
pub struct SessionRepo;

impl SessionRepo {
    /// Upsert a session as started. A session that already ended stays ended.
    pub fn upsert_started(
        conn: &Connection,
        id: &str,
        project_id: &ProjectId,
        block_id: Option<&BlockId>,
        title: Option<&str>,
        metadata: Option<&Value>,
        at: &DateTime<Utc>,
    ) -> Result<()> {
        let metadata = metadata.map(serde_json::to_string).transpose()?;
        let _ = conn.execute(
            "INSERT INTO claude_sessions
                 (id, project_id, block_id, status, title, metadata, started_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, COALESCE(?6, '{}'), ?7, ?7)
             ON CONFLICT (id) DO UPDATE SET
                 block_id = COALESCE(?3, claude_sessions.block_id),
                 title = COALESCE(?5, claude_sessions.title),
                 metadata = COALESCE(?6, claude_sessions.metadata),
                 started_at = COALESCE(claude_sessions.started_at, ?7),
                 updated_at = ?7",
            params![
                id,
                project_id.as_str(),
                block_id.map(BlockId::as_str),
                SessionStatus::Active,
                title,
                metadata,
                ts_param(at),
            ],
        )?;
        Ok(())
    }

    /// Upsert a session as ended.
    pub fn upsert_ended(
        conn: &Connection,
        id: &str,
        project_id: &ProjectId,
        summary: Option<&str>,
        metadata: Option<&Value>,
        at: &DateTime<Utc>,
    ) -> Result<()> {
        let metadata = metadata.map(serde_json::to_string).transpose()?;
        let _ = conn.execute(
            "INSERT INTO claude_sessions
                 (id, project_id, status, summary, metadata, ended_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, COALESCE(?5, '{}'), ?6, ?6)
             ON CONFLICT (id) DO UPDATE SET
                 status = ?3,
                 summary = COALESCE(?4, claude_sessions.summary),
                 metadata = COALESCE(?5, claude_sessions.metadata),
                 ended_at = ?6,
                 updated_at = ?6",
            params![
                id,
                project_id.as_str(),
                SessionStatus::Ended,
                summary,
                metadata,
                ts_param(at),
            ],
        )?;
        Ok(())
    }

    /// Get a session by ID.
    pub fn get(conn: &Connection, id: &str) -> Result<Option<ClaudeSession>> {
        let row = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM claude_sessions WHERE id = ?1"),
                params![id],
                Self::map_row,
            )
            .optional()?;
        Ok(row)
    }

    /// All sessions of a project, most recently updated first.
    pub fn list_for_project(conn: &Connection, project_id: &str) -> Result<Vec<ClaudeSession>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM claude_sessions WHERE project_id = ?1
             ORDER BY updated_at DESC, id ASC"
        ))?;
        let rows = stmt
            .query_map(params![project_id], Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ClaudeSession> {
        Ok(ClaudeSession {
            id: row.get(0)?,
            project_id: ProjectId::from_string(row.get(1)?),
            block_id: row.get::<_, Option<String>>(2)?.map(BlockId::from_string),
            status: row.get(3)?,
            title: row.get(4)?,
            summary: row.get(5)?,
            metadata: json_col(row, 6)?,
            started_at: opt_ts_col(row, 7)?,
            ended_at: opt_ts_col(row, 8)?,
            updated_at: ts_col(row, 9)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::repositories::test_support::{open, ts};

    #[test]
    fn start_then_end() {
        let conn = open();
        let project = ProjectId::from("prj_1");
        SessionRepo::upsert_started(
            &conn,
            "sess_1",
            &project,
            Some(&BlockId::from("blk_1")),
            Some("Fix login"),
            None,
            &ts("2024-01-01T00:00:00Z"),
        )
        .unwrap();
        SessionRepo::upsert_ended(&conn, "sess_1", &project, Some("done"), None, &ts("2024-01-01T01:00:00Z"))
            .unwrap();

        let s = SessionRepo::get(&conn, "sess_1").unwrap().unwrap();
        assert_eq!(s.status, SessionStatus::Ended);
        assert_eq!(s.title.as_deref(), Some("Fix login"));
        assert_eq!(s.summary.as_deref(), Some("done"));
        assert_eq!(s.started_at, Some(ts("2024-01-01T00:00:00Z")));
        assert_eq!(s.ended_at, Some(ts("2024-01-01T01:00:00Z")));
    }

    #[test]
    fn end_without_start_creates_row() {
        let conn = open();
        SessionRepo::upsert_ended(&conn, "sess_2", &ProjectId::from("prj_1"), None, None, &ts("2024-01-01T00:00:00Z"))
            .unwrap();
        let s = SessionRepo::get(&conn, "sess_2").unwrap().unwrap();
        assert_eq!(s.status, SessionStatus::Ended);
        assert!(s.started_at.is_none());
        assert_eq!(SessionRepo::list_for_project(&conn, "prj_1").unwrap().len(), 1);
    }

    #[test]
    fn late_start_does_not_reopen() {
        let conn = open();
        let project = ProjectId::from("prj_1");
        SessionRepo::upsert_ended(&conn, "sess_3", &project, None, None, &ts("2024-01-01T01:00:00Z")).unwrap();
        SessionRepo::upsert_started(&conn, "sess_3", &project, None, None, None, &ts("2024-01-01T00:00:00Z"))
            .unwrap();
        let s = SessionRepo::get(&conn, "sess_3").unwrap().unwrap();
        assert_eq!(s.status, SessionStatus::Ended);
        assert_eq!(s.started_at, Some(ts("2024-01-01T00:00:00Z")));
    }
}
