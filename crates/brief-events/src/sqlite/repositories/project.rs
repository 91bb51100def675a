//! Project repository.

use brief_core::ProjectId;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use crate::errors::Result;
use crate::sqlite::row_types::{ts_col, ts_param};
use crate::types::Project;

/// Fields carried by `project.created` / `project.updated`.
#[derive(Debug, Default)]
pub struct ProjectFields<'a> {
    /// Display name.
    pub name: Option<&'a str>,
    /// Description.
    pub description: Option<&'a str>,
    /// Lifecycle status.
    pub status: Option<&'a str>,
    /// Repository.
    pub repository: Option<&'a str>,
}

/// Project repository. Stateless; every method takes `&Connection`.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert or patch a project. Supplied fields overwrite, absent ones keep
    /// their stored value. A first insert falls back to the project ID as name.
    pub fn upsert(
        conn: &Connection,
        id: &ProjectId,
        fields: &ProjectFields<'_>,
        at: &DateTime<Utc>,
    ) -> Result<()> {
        let at = ts_param(at);
        let _ = conn.execute(
            "INSERT INTO projects (id, name, description, status, repository, created_at, updated_at)
             VALUES (?1, COALESCE(?2, ?1), ?3, COALESCE(?4, 'active'), ?5, ?6, ?6)
             ON CONFLICT (id) DO UPDATE SET
                 name = COALESCE(?2, projects.name),
                 description = COALESCE(?3, projects.description),
                 status = COALESCE(?4, projects.status),
                 repository = COALESCE(?5, projects.repository),
                 updated_at = ?6",
            params![
                id.as_str(),
                fields.name,
                fields.description,
                fields.status,
                fields.repository,
                at
            ],
        )?;
        Ok(())
    }

    /// Get a project by ID.
    pub fn get(conn: &Connection, id: &str) -> Result<Option<Project>> {
        let row = conn
            .query_row(
                "SELECT id, name, description, status, repository, created_at, updated_at
                 FROM projects WHERE id = ?1",
                params![id],
                Self::map_row,
            )
            .optional()?;
        Ok(row)
    }

    /// All projects by name.
    pub fn list(conn: &Connection) -> Result<Vec<Project>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, description, status, repository, created_at, updated_at
             FROM projects ORDER BY name",
        )?;
        let rows = stmt
            .query_map([], Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Project> {
        Ok(Project {
            id: ProjectId::from_string(row.get(0)?),
            name: row.get(1)?,
            description: row.get(2)?,
            status: row.get(3)?,
            repository: row.get(4)?,
            created_at: ts_col(row, 5)?,
            updated_at: ts_col(row, 6)?,
        })
    }
}
