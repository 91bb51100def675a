//! `ProjectionStore`: projected entity access.
//!
//! Writes go through [`ProjectionStore::write`], which runs a closure inside a
//! single transaction; the projector uses it so each handler's changes commit
//! atomically before the offset moves. Everything else is read access.

use rusqlite::Transaction;

use crate::errors::{EventStoreError, Result};
use crate::sqlite::connection::{ConnectionPool, PooledConnection};
use crate::sqlite::repositories::block::BlockRepo;
use crate::sqlite::repositories::context_item::ContextItemRepo;
use crate::sqlite::repositories::github::GitHubRepo;
use crate::sqlite::repositories::link::LinkRepo;
use crate::sqlite::repositories::project::ProjectRepo;
use crate::sqlite::repositories::session::SessionRepo;
use crate::types::{Block, ClaudeSession, ContextItem, ContextLink, GitHubEntity, Project};

/// Tables owned by the projector, cleared on rebuild.
const PROJECTION_TABLES: &[&str] = &[
    "projects",
    "blocks",
    "context_items",
    "context_links",
    "github_entities",
    "claude_sessions",
];

/// Projected entity store wrapping a connection pool.
#[derive(Clone)]
pub struct ProjectionStore {
    pool: ConnectionPool,
}

impl ProjectionStore {
    /// Create a new `ProjectionStore` with the given connection pool.
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<PooledConnection> {
        Ok(self.pool.get()?)
    }

    /// Run `f` inside one transaction. Commits on `Ok`, rolls back on `Err`.
    pub fn write<T, E>(&self, f: impl FnOnce(&Transaction<'_>) -> std::result::Result<T, E>) -> std::result::Result<T, E>
    where
        E: From<EventStoreError>,
    {
        let conn = self.conn().map_err(E::from)?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| E::from(EventStoreError::from(e)))?;
        let value = f(&tx)?;
        tx.commit().map_err(|e| E::from(EventStoreError::from(e)))?;
        Ok(value)
    }

    /// Delete every projected row. Offsets and the log are untouched.
    pub fn clear_all(&self) -> Result<()> {
        self.write(|tx| {
            for table in PROJECTION_TABLES {
                let _ = tx.execute(&format!("DELETE FROM {table}"), [])?;
            }
            Ok::<_, EventStoreError>(())
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Projects
    // ─────────────────────────────────────────────────────────────────────

    /// Get a project.
    pub fn get_project(&self, id: &str) -> Result<Option<Project>> {
        let conn = self.conn()?;
        ProjectRepo::get(&conn, id)
    }

    /// All projects.
    pub fn list_projects(&self) -> Result<Vec<Project>> {
        let conn = self.conn()?;
        ProjectRepo::list(&conn)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Blocks
    // ─────────────────────────────────────────────────────────────────────

    /// Get a block.
    pub fn get_block(&self, id: &str) -> Result<Option<Block>> {
        let conn = self.conn()?;
        BlockRepo::get(&conn, id)
    }

    /// All blocks of a project.
    pub fn blocks_for_project(&self, project_id: &str) -> Result<Vec<Block>> {
        let conn = self.conn()?;
        BlockRepo::list_for_project(&conn, project_id)
    }

    /// Blocks containing `needle` in title or content.
    pub fn search_blocks(&self, project_id: &str, needle: &str, limit: usize) -> Result<Vec<Block>> {
        let conn = self.conn()?;
        BlockRepo::search_text(&conn, project_id, needle, limit)
    }

    /// Blocks without an embedding.
    pub fn blocks_missing_embedding(&self, limit: usize) -> Result<Vec<Block>> {
        let conn = self.conn()?;
        BlockRepo::list_missing_embedding(&conn, limit)
    }

    /// Store a block embedding.
    pub fn set_block_embedding(&self, id: &str, embedding: &[f32]) -> Result<bool> {
        let conn = self.conn()?;
        BlockRepo::set_embedding(&conn, id, embedding)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Context items and links
    // ─────────────────────────────────────────────────────────────────────

    /// Get a context item.
    pub fn get_context_item(&self, id: &str) -> Result<Option<ContextItem>> {
        let conn = self.conn()?;
        ContextItemRepo::get(&conn, id)
    }

    /// All context items of a project, newest first.
    pub fn context_items_for_project(&self, project_id: &str) -> Result<Vec<ContextItem>> {
        let conn = self.conn()?;
        ContextItemRepo::list_for_project(&conn, project_id)
    }

    /// Context items linked to a block.
    pub fn context_items_for_block(&self, block_id: &str) -> Result<Vec<ContextItem>> {
        let conn = self.conn()?;
        ContextItemRepo::list_for_block(&conn, block_id)
    }

    /// Links of a context item.
    pub fn links_for_context(&self, context_id: &str) -> Result<Vec<ContextLink>> {
        let conn = self.conn()?;
        LinkRepo::list_for_context(&conn, context_id)
    }

    /// Context items containing `needle` in title or content.
    pub fn search_context_items(
        &self,
        project_id: &str,
        needle: &str,
        limit: usize,
    ) -> Result<Vec<ContextItem>> {
        let conn = self.conn()?;
        ContextItemRepo::search_text(&conn, project_id, needle, limit)
    }

    /// Context items without an embedding.
    pub fn context_items_missing_embedding(&self, limit: usize) -> Result<Vec<ContextItem>> {
        let conn = self.conn()?;
        ContextItemRepo::list_missing_embedding(&conn, limit)
    }

    /// Store a context item embedding.
    pub fn set_context_embedding(&self, id: &str, embedding: &[f32]) -> Result<bool> {
        let conn = self.conn()?;
        ContextItemRepo::set_embedding(&conn, id, embedding)
    }

    // ─────────────────────────────────────────────────────────────────────
    // GitHub and sessions
    // ─────────────────────────────────────────────────────────────────────

    /// All GitHub entities of a project.
    pub fn github_for_project(&self, project_id: &str) -> Result<Vec<GitHubEntity>> {
        let conn = self.conn()?;
        GitHubRepo::list_for_project(&conn, project_id)
    }

    /// Get a session.
    pub fn get_session(&self, id: &str) -> Result<Option<ClaudeSession>> {
        let conn = self.conn()?;
        SessionRepo::get(&conn, id)
    }

    /// All sessions of a project.
    pub fn sessions_for_project(&self, project_id: &str) -> Result<Vec<ClaudeSession>> {
        let conn = self.conn()?;
        SessionRepo::list_for_project(&conn, project_id)
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
    use crate::sqlite::repositories::project::ProjectFields;
    use brief_core::ProjectId;

    fn setup() -> ProjectionStore {
        ProjectionStore::new(crate::open_in_memory(&ConnectionConfig::default()).unwrap())
    }

    fn at() -> chrono::DateTime<chrono::Utc> {
        brief_core::time::parse_ts("2024-01-01T00:00:00Z").unwrap()
    }

    #[test]
    fn write_commits_on_ok() {
        let store = setup();
        store
            .write(|tx| {
                ProjectRepo::upsert(tx, &ProjectId::from("prj_1"), &ProjectFields::default(), &at())
            })
            .unwrap();
        assert!(store.get_project("prj_1").unwrap().is_some());
    }

    #[test]
    fn write_rolls_back_on_err() {
        let store = setup();
        let result: Result<()> = store.write(|tx| {
            ProjectRepo::upsert(tx, &ProjectId::from("prj_1"), &ProjectFields::default(), &at())?;
            Err(EventStoreError::InvalidOperation("abort".into()))
        });
        assert!(result.is_err());
        assert!(store.get_project("prj_1").unwrap().is_none());
    }

    #[test]
    fn clear_all_empties_projection_tables() {
        let store = setup();
        store
            .write(|tx| {
                ProjectRepo::upsert(tx, &ProjectId::from("prj_1"), &ProjectFields::default(), &at())
            })
            .unwrap();
        store.clear_all().unwrap();
        assert!(store.list_projects().unwrap().is_empty());
    }
}
