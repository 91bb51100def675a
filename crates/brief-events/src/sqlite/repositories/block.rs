//! Block repository.

use brief_core::{BlockId, ProjectId};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use crate::errors::Result;
use crate::sqlite::row_types::{
    embedding_col, f32_slice_to_blob, opt_ts_col, progress_col, ts_col, ts_param,
};
use crate::types::{Block, BlockStatus, Lane, Priority};

const COLUMNS: &str = "id, project_id, title, content, lane, status, priority, progress, effort, \
                       last_worked_at, created_at, updated_at, embedding";

/// Partial block update. `None` leaves the stored value untouched.
#[derive(Debug, Default)]
pub struct BlockPatch<'a> {
    /// New title.
    pub title: Option<&'a str>,
    /// New body text.
    pub content: Option<&'a str>,
    /// New lane.
    pub lane: Option<Lane>,
    /// New status.
    pub status: Option<BlockStatus>,
    /// New priority.
    pub priority: Option<Priority>,
    /// New progress.
    pub progress: Option<u8>,
    /// New effort estimate.
    pub effort: Option<&'a str>,
}

impl BlockPatch<'_> {
    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.lane.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.progress.is_none()
            && self.effort.is_none()
    }
}

/// Block repository. Stateless; every method takes `&Connection`.
pub struct BlockRepo;

impl BlockRepo {
    /// Insert a block unless one with the same ID exists.
    ///
    /// Returns whether a row was inserted.
    pub fn insert_if_absent(conn: &Connection, block: &Block) -> Result<bool> {
        let changed = conn.execute(
            "INSERT OR IGNORE INTO blocks
                 (id, project_id, title, content, lane, status, priority, progress, effort,
                  last_worked_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                block.id.as_str(),
                block.project_id.as_str(),
                block.title,
                block.content,
                block.lane,
                block.status,
                block.priority,
                block.progress,
                block.effort,
                block.last_worked_at.as_ref().map(ts_param),
                ts_param(&block.created_at),
                ts_param(&block.updated_at),
            ],
        )?;
        Ok(changed > 0)
    }

    /// Move a block to `lane`, marking it worked on at `at`.
    pub fn set_lane(conn: &Connection, id: &BlockId, lane: Lane, at: &DateTime<Utc>) -> Result<bool> {
        let at = ts_param(at);
        let changed = conn.execute(
            "UPDATE blocks SET lane = ?2, updated_at = ?3, last_worked_at = ?3 WHERE id = ?1",
            params![id.as_str(), lane, at],
        )?;
        Ok(changed > 0)
    }

    /// Set progress and status together, marking the block worked on at `at`.
    pub fn set_progress(
        conn: &Connection,
        id: &BlockId,
        progress: u8,
        status: BlockStatus,
        at: &DateTime<Utc>,
    ) -> Result<bool> {
        let at = ts_param(at);
        let changed = conn.execute(
            "UPDATE blocks SET progress = ?2, status = ?3, updated_at = ?4, last_worked_at = ?4
             WHERE id = ?1",
            params![id.as_str(), progress, status, at],
        )?;
        Ok(changed > 0)
    }

    /// Apply a partial update.
    pub fn patch(
        conn: &Connection,
        id: &BlockId,
        patch: &BlockPatch<'_>,
        at: &DateTime<Utc>,
    ) -> Result<bool> {
        let changed = conn.execute(
            "UPDATE blocks SET
                 title = COALESCE(?2, title),
                 content = COALESCE(?3, content),
                 lane = COALESCE(?4, lane),
                 status = COALESCE(?5, status),
                 priority = COALESCE(?6, priority),
                 progress = COALESCE(?7, progress),
                 effort = COALESCE(?8, effort),
                 updated_at = ?9
             WHERE id = ?1",
            params![
                id.as_str(),
                patch.title,
                patch.content,
                patch.lane,
                patch.status,
                patch.priority,
                patch.progress,
                patch.effort,
                ts_param(at),
            ],
        )?;
        Ok(changed > 0)
    }

    /// Hard delete.
    pub fn delete(conn: &Connection, id: &BlockId) -> Result<bool> {
        let changed = conn.execute("DELETE FROM blocks WHERE id = ?1", params![id.as_str()])?;
        Ok(changed > 0)
    }

    /// Get a block by ID.
    pub fn get(conn: &Connection, id: &str) -> Result<Option<Block>> {
        let row = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM blocks WHERE id = ?1"),
                params![id],
                Self::map_row,
            )
            .optional()?;
        Ok(row)
    }

    /// All blocks of a project, oldest first.
    pub fn list_for_project(conn: &Connection, project_id: &str) -> Result<Vec<Block>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM blocks WHERE project_id = ?1 ORDER BY created_at ASC, id ASC"
        ))?;
        let rows = stmt
            .query_map(params![project_id], Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Blocks of a project whose title or content contains `needle`
    /// (case-insensitive), most recently updated first.
    pub fn search_text(
        conn: &Connection,
        project_id: &str,
        needle: &str,
        limit: usize,
    ) -> Result<Vec<Block>> {
        let pattern = like_pattern(needle);
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM blocks
             WHERE project_id = ?1
               AND (LOWER(title) LIKE ?2 ESCAPE '\\' OR LOWER(COALESCE(content, '')) LIKE ?2 ESCAPE '\\')
             ORDER BY updated_at DESC, id ASC
             LIMIT ?3"
        ))?;
        let rows = stmt
            .query_map(
                params![project_id, pattern, i64::try_from(limit).unwrap_or(i64::MAX)],
                Self::map_row,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Store an embedding for a block.
    pub fn set_embedding(conn: &Connection, id: &str, embedding: &[f32]) -> Result<bool> {
        let changed = conn.execute(
            "UPDATE blocks SET embedding = ?2 WHERE id = ?1",
            params![id, f32_slice_to_blob(embedding)],
        )?;
        Ok(changed > 0)
    }

    /// Blocks without an embedding, across all projects.
    pub fn list_missing_embedding(conn: &Connection, limit: usize) -> Result<Vec<Block>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM blocks WHERE embedding IS NULL
             ORDER BY created_at ASC, id ASC LIMIT ?1"
        ))?;
        let rows = stmt
            .query_map(params![i64::try_from(limit).unwrap_or(i64::MAX)], Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Block> {
        Ok(Block {
            id: BlockId::from_string(row.get(0)?),
            project_id: ProjectId::from_string(row.get(1)?),
            title: row.get(2)?,
            content: row.get(3)?,
            lane: row.get(4)?,
            status: row.get(5)?,
            priority: row.get(6)?,
            progress: progress_col(row, 7)?,
            effort: row.get(8)?,
            last_worked_at: opt_ts_col(row, 9)?,
            created_at: ts_col(row, 10)?,
            updated_at: ts_col(row, 11)?,
            embedding: embedding_col(row, 12)?,
        })
    }
}

/// Lower-cased `LIKE` pattern matching `needle` anywhere, with `%`, `_` and
/// `\` escaped.
pub(crate) fn like_pattern(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len() + 2);
    out.push('%');
    for ch in needle.to_lowercase().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('%');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::repositories::test_support::{open, ts};

    fn block(id: &str, title: &str) -> Block {
        Block {
            id: BlockId::from(id),
            project_id: ProjectId::from("prj_1"),
            title: title.into(),
            content: Some("Some body".into()),
            lane: Lane::Next,
            status: BlockStatus::NotStarted,
            priority: Priority::Medium,
            progress: 0,
            effort: None,
            last_worked_at: None,
            created_at: ts("2024-01-01T00:00:00Z"),
            updated_at: ts("2024-01-01T00:00:00Z"),
            embedding: None,
        }
    }

    #[test]
    fn insert_if_absent_is_idempotent() {
        let conn = open();
        assert!(BlockRepo::insert_if_absent(&conn, &block("blk_1", "A")).unwrap());
        assert!(!BlockRepo::insert_if_absent(&conn, &block("blk_1", "B")).unwrap());
        let stored = BlockRepo::get(&conn, "blk_1").unwrap().unwrap();
        assert_eq!(stored.title, "A");
        assert_eq!(BlockRepo::list_for_project(&conn, "prj_1").unwrap().len(), 1);
    }

    #[test]
    fn set_lane_bumps_timestamps() {
        let conn = open();
        let _ = BlockRepo::insert_if_absent(&conn, &block("blk_1", "A")).unwrap();
        let at = ts("2024-02-01T00:00:00Z");
        assert!(BlockRepo::set_lane(&conn, &BlockId::from("blk_1"), Lane::Current, &at).unwrap());
        let b = BlockRepo::get(&conn, "blk_1").unwrap().unwrap();
        assert_eq!(b.lane, Lane::Current);
        assert_eq!(b.updated_at, at);
        assert_eq!(b.last_worked_at, Some(at));
    }

    #[test]
    fn update_missing_block_is_noop() {
        let conn = open();
        let at = ts("2024-02-01T00:00:00Z");
        assert!(!BlockRepo::set_lane(&conn, &BlockId::from("blk_x"), Lane::Current, &at).unwrap());
        assert!(
            !BlockRepo::set_progress(&conn, &BlockId::from("blk_x"), 50, BlockStatus::InProgress, &at)
                .unwrap()
        );
    }

    #[test]
    fn patch_only_touches_supplied_fields() {
        let conn = open();
        let _ = BlockRepo::insert_if_absent(&conn, &block("blk_1", "A")).unwrap();
        let patch = BlockPatch {
            priority: Some(Priority::Urgent),
            ..BlockPatch::default()
        };
        assert!(!patch.is_empty());
        assert!(BlockRepo::patch(&conn, &BlockId::from("blk_1"), &patch, &ts("2024-02-01T00:00:00Z")).unwrap());
        let b = BlockRepo::get(&conn, "blk_1").unwrap().unwrap();
        assert_eq!(b.priority, Priority::Urgent);
        assert_eq!(b.title, "A");
        assert_eq!(b.content.as_deref(), Some("Some body"));
        assert_eq!(b.lane, Lane::Next);
    }

    #[test]
    fn delete_removes_row() {
        let conn = open();
        let _ = BlockRepo::insert_if_absent(&conn, &block("blk_1", "A")).unwrap();
        assert!(BlockRepo::delete(&conn, &BlockId::from("blk_1")).unwrap());
        assert!(!BlockRepo::delete(&conn, &BlockId::from("blk_1")).unwrap());
        assert!(BlockRepo::get(&conn, "blk_1").unwrap().is_none());
    }

    #[test]
    fn embedding_round_trip_and_missing_list() {
        let conn = open();
        let _ = BlockRepo::insert_if_absent(&conn, &block("blk_1", "A")).unwrap();
        let _ = BlockRepo::insert_if_absent(&conn, &block("blk_2", "B")).unwrap();
        assert!(BlockRepo::set_embedding(&conn, "blk_1", &[0.5, 0.25]).unwrap());
        let b = BlockRepo::get(&conn, "blk_1").unwrap().unwrap();
        assert_eq!(b.embedding, Some(vec![0.5, 0.25]));
        let missing = BlockRepo::list_missing_embedding(&conn, 10).unwrap();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].id.as_str(), "blk_2");
    }

    #[test]
    fn search_text_is_case_insensitive() {
        let conn = open();
        let _ = BlockRepo::insert_if_absent(&conn, &block("blk_1", "OAuth Login")).unwrap();
        let _ = BlockRepo::insert_if_absent(&conn, &block("blk_2", "Billing")).unwrap();
        let hits = BlockRepo::search_text(&conn, "prj_1", "oauth", 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id.as_str(), "blk_1");
        assert!(BlockRepo::search_text(&conn, "prj_2", "oauth", 10).unwrap().is_empty());
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("ABC"), "%abc%");
    }
}
