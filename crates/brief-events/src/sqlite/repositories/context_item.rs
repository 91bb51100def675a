//! Context item repository.

use brief_core::{ContextId, ProjectId};
use rusqlite::{Connection, OptionalExtension, params};

use crate::errors::Result;
use crate::sqlite::repositories::block::like_pattern;
use crate::sqlite::row_types::{embedding_col, f32_slice_to_blob, ts_col, ts_param};
use crate::types::ContextItem;

const COLUMNS: &str =
    "id, project_id, type, title, content, source, author_id, created_at, embedding";

/// Context item repository. Stateless; every method takes `&Connection`.
pub struct ContextItemRepo;

impl ContextItemRepo {
    /// Insert a context item unless one with the same ID exists.
    pub fn insert_if_absent(conn: &Connection, item: &ContextItem) -> Result<bool> {
        let changed = conn.execute(
            "INSERT OR IGNORE INTO context_items
                 (id, project_id, type, title, content, source, author_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                item.id.as_str(),
                item.project_id.as_str(),
                item.context_type,
                item.title,
                item.content,
                item.source,
                item.author_id,
                ts_param(&item.created_at),
            ],
        )?;
        Ok(changed > 0)
    }

    /// Get an item by ID.
    pub fn get(conn: &Connection, id: &str) -> Result<Option<ContextItem>> {
        let row = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM context_items WHERE id = ?1"),
                params![id],
                Self::map_row,
            )
            .optional()?;
        Ok(row)
    }

    /// All items of a project, newest first.
    pub fn list_for_project(conn: &Connection, project_id: &str) -> Result<Vec<ContextItem>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM context_items WHERE project_id = ?1
             ORDER BY created_at DESC, id ASC"
        ))?;
        let rows = stmt
            .query_map(params![project_id], Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Items linked to a block, newest first.
    pub fn list_for_block(conn: &Connection, block_id: &str) -> Result<Vec<ContextItem>> {
        let mut stmt = conn.prepare(
            "SELECT c.id, c.project_id, c.type, c.title, c.content, c.source, c.author_id,
                    c.created_at, c.embedding
             FROM context_items c
             JOIN context_links l ON l.context_id = c.id
             WHERE l.block_id = ?1
             ORDER BY c.created_at DESC, c.id ASC",
        )?;
        let rows = stmt
            .query_map(params![block_id], Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Items whose title or content contains `needle` (case-insensitive).
    pub fn search_text(
        conn: &Connection,
        project_id: &str,
        needle: &str,
        limit: usize,
    ) -> Result<Vec<ContextItem>> {
        let pattern = like_pattern(needle);
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM context_items
             WHERE project_id = ?1
               AND (LOWER(COALESCE(title, '')) LIKE ?2 ESCAPE '\\' OR LOWER(content) LIKE ?2 ESCAPE '\\')
             ORDER BY created_at DESC, id ASC
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

    /// Store an embedding for an item.
    pub fn set_embedding(conn: &Connection, id: &str, embedding: &[f32]) -> Result<bool> {
        let changed = conn.execute(
            "UPDATE context_items SET embedding = ?2 WHERE id = ?1",
            params![id, f32_slice_to_blob(embedding)],
        )?;
        Ok(changed > 0)
    }

    /// Items without an embedding, across all projects.
    pub fn list_missing_embedding(conn: &Connection, limit: usize) -> Result<Vec<ContextItem>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM context_items WHERE embedding IS NULL
             ORDER BY created_at ASC, id ASC LIMIT ?1"
        ))?;
        let rows = stmt
            .query_map(params![i64::try_from(limit).unwrap_or(i64::MAX)], Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ContextItem> {
        Ok(ContextItem {
            id: ContextId::from_string(row.get(0)?),
            project_id: ProjectId::from_string(row.get(1)?),
            context_type: row.get(2)?,
            title: row.get(3)?,
            content: row.get(4)?,
            source: row.get(5)?,
            author_id: row.get(6)?,
            created_at: ts_col(row, 7)?,
            embedding: embedding_col(row, 8)?,
        })
    }
}
