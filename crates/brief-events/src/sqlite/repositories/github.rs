//! GitHub entity repository. Natural key: `(project_id, provider_type, provider_id)`.

use brief_core::ProjectId;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;

use crate::errors::Result;
use crate::sqlite::row_types::{json_col, ts_col, ts_param};
use crate::types::{GitHubEntity, ProviderType};

const COLUMNS: &str = "id, project_id, provider_type, provider_id, url, title, status, metadata, \
                       created_at, updated_at";

/// Upsert input for a GitHub entity.
#[derive(Debug)]
pub struct GitHubUpsert<'a> {
    /// Entity ID used on first insert.
    pub id: &'a str,
    /// Owning project.
    pub project_id: &'a ProjectId,
    /// Kind of object.
    pub provider_type: ProviderType,
    /// Provider-side identifier.
    pub provider_id: &'a str,
    /// Web URL.
    pub url: Option<&'a str>,
    /// Title.
    pub title: Option<&'a str>,
    /// Provider state.
    pub status: Option<&'a str>,
    /// Provider extras; replaces stored metadata when supplied.
    pub metadata: Option<&'a Value>,
}

/// GitHub entity repository. Stateless; every method takes `&Connection`.
pub struct GitHubRepo;

impl GitHubRepo {
    /// Insert or patch by natural key. Absent fields keep their stored value.
    pub fn upsert(conn: &Connection, input: &GitHubUpsert<'_>, at: &DateTime<Utc>) -> Result<()> {
        let metadata = input.metadata.map(serde_json::to_string).transpose()?;
        let at = ts_param(at);
        let _ = conn.execute(
            "INSERT INTO github_entities
                 (id, project_id, provider_type, provider_id, url, title, status, metadata,
                  created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, COALESCE(?6, ''), COALESCE(?7, 'open'),
                     COALESCE(?8, '{}'), ?9, ?9)
             ON CONFLICT (project_id, provider_type, provider_id) DO UPDATE SET
                 url = COALESCE(?5, github_entities.url),
                 title = COALESCE(?6, github_entities.title),
                 status = COALESCE(?7, github_entities.status),
                 metadata = COALESCE(?8, github_entities.metadata),
                 updated_at = ?9",
            params![
                input.id,
                input.project_id.as_str(),
                input.provider_type,
                input.provider_id,
                input.url,
                input.title,
                input.status,
                metadata,
                at,
            ],
        )?;
        Ok(())
    }

    /// Look up by natural key.
    pub fn get_by_provider(
        conn: &Connection,
        project_id: &str,
        provider_type: ProviderType,
        provider_id: &str,
    ) -> Result<Option<GitHubEntity>> {
        let row = conn
            .query_row(
                &format!(
                    "SELECT {COLUMNS} FROM github_entities
                     WHERE project_id = ?1 AND provider_type = ?2 AND provider_id = ?3"
                ),
                params![project_id, provider_type, provider_id],
                Self::map_row,
            )
            .optional()?;
        Ok(row)
    }

    /// All entities of a project, most recently updated first.
    pub fn list_for_project(conn: &Connection, project_id: &str) -> Result<Vec<GitHubEntity>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM github_entities WHERE project_id = ?1
             ORDER BY updated_at DESC, id ASC"
        ))?;
        let rows = stmt
            .query_map(params![project_id], Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<GitHubEntity> {
        Ok(GitHubEntity {
            id: row.get(0)?,
            project_id: ProjectId::from_string(row.get(1)?),
            provider_type: row.get(2)?,
            provider_id: row.get(3)?,
            url: row.get(4)?,
            title: row.get(5)?,
            status: row.get(6)?,
            metadata: json_col(row, 7)?,
            created_at: ts_col(row, 8)?,
            updated_at: ts_col(row, 9)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::repositories::test_support::{open, ts};
    use serde_json::json;

    #[test]
    fn upsert_by_natural_key() {
        let conn = open();
        let project = ProjectId::from("prj_1");
        let meta = json!({"number": 42});
        GitHubRepo::upsert(
            &conn,
            &GitHubUpsert {
                id: "gh_pr_42",
                project_id: &project,
                provider_type: ProviderType::Pr,
                provider_id: "42",
                url: Some("https://github.com/o/r/pull/42"),
                title: Some("Add auth"),
                status: Some("open"),
                metadata: Some(&meta),
            },
            &ts("2024-01-01T00:00:00Z"),
        )
        .unwrap();

        GitHubRepo::upsert(
            &conn,
            &GitHubUpsert {
                id: "ignored_on_conflict",
                project_id: &project,
                provider_type: ProviderType::Pr,
                provider_id: "42",
                url: None,
                title: None,
                status: Some("merged"),
                metadata: None,
            },
            &ts("2024-01-02T00:00:00Z"),
        )
        .unwrap();

        let all = GitHubRepo::list_for_project(&conn, "prj_1").unwrap();
        assert_eq!(all.len(), 1);
        let e = &all[0];
        assert_eq!(e.id, "gh_pr_42");
        assert_eq!(e.title, "Add auth");
        assert_eq!(e.status, "merged");
        assert_eq!(e.metadata["number"], 42);
        assert_eq!(e.created_at, ts("2024-01-01T00:00:00Z"));
        assert_eq!(e.updated_at, ts("2024-01-02T00:00:00Z"));
    }

    #[test]
    fn same_provider_id_different_type_is_distinct() {
        let conn = open();
        let project = ProjectId::from("prj_1");
        for (id, t) in [("gh_pr_1", ProviderType::Pr), ("gh_issue_1", ProviderType::Issue)] {
            GitHubRepo::upsert(
                &conn,
                &GitHubUpsert {
                    id,
                    project_id: &project,
                    provider_type: t,
                    provider_id: "1",
                    url: None,
                    title: Some("x"),
                    status: None,
                    metadata: None,
                },
                &ts("2024-01-01T00:00:00Z"),
            )
            .unwrap();
        }
        assert_eq!(GitHubRepo::list_for_project(&conn, "prj_1").unwrap().len(), 2);
        let issue = GitHubRepo::get_by_provider(&conn, "prj_1", ProviderType::Issue, "1")
            .unwrap()
            .unwrap();
        assert_eq!(issue.status, "open");
    }
}
