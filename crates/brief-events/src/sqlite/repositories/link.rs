//! Context link repository: many-to-many between context items and blocks.

use brief_core::{BlockId, ContextId};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};

use crate::errors::Result;
use crate::sqlite::row_types::{ts_col, ts_param};
use crate::types::ContextLink;

/// Link repository. Stateless; every method takes `&Connection`.
pub struct LinkRepo;

impl LinkRepo {
    /// Insert a link unless it exists.
    pub fn insert_if_absent(
        conn: &Connection,
        context_id: &ContextId,
        block_id: &BlockId,
        at: &DateTime<Utc>,
    ) -> Result<bool> {
        let changed = conn.execute(
            "INSERT OR IGNORE INTO context_links (context_id, block_id, created_at)
             VALUES (?1, ?2, ?3)",
            params![context_id.as_str(), block_id.as_str(), ts_param(at)],
        )?;
        Ok(changed > 0)
    }

    /// Drop every link of a block. Returns the number removed.
    pub fn delete_for_block(conn: &Connection, block_id: &BlockId) -> Result<usize> {
        Ok(conn.execute(
            "DELETE FROM context_links WHERE block_id = ?1",
            params![block_id.as_str()],
        )?)
    }

    /// Links of a context item.
    pub fn list_for_context(conn: &Connection, context_id: &str) -> Result<Vec<ContextLink>> {
        let mut stmt = conn.prepare(
            "SELECT context_id, block_id, created_at FROM context_links
             WHERE context_id = ?1 ORDER BY block_id",
        )?;
        let rows = stmt
            .query_map(params![context_id], |row| {
                Ok(ContextLink {
                    context_id: ContextId::from_string(row.get(0)?),
                    block_id: BlockId::from_string(row.get(1)?),
                    created_at: ts_col(row, 2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
