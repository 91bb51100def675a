//! GitHub activity handler shared by every `github.*` event.

use brief_events::sqlite::repositories::github::{GitHubRepo, GitHubUpsert};
use brief_events::types::payloads::github::GitHubPayload;
use brief_events::{Event, GitHubEntity};
use rusqlite::Connection;

use super::require;
use crate::errors::{ProjectionError, Result};

/// Upsert by `(project, provider type, provider id)`.
pub(super) fn upsert(conn: &Connection, event: &Event, p: &GitHubPayload) -> Result<()> {
    let provider_type = event
        .event_type
        .provider_type()
        .ok_or_else(|| ProjectionError::malformed(event, "not a github event"))?;
    let provider_id = require(event, p.provider_id.as_deref(), "provider_id")?;
    let id = p
        .id
        .clone()
        .unwrap_or_else(|| GitHubEntity::derive_id(provider_type, provider_id));

    GitHubRepo::upsert(
        conn,
        &GitHubUpsert {
            id: &id,
            project_id: &event.project_id,
            provider_type,
            provider_id,
            url: p.url.as_deref(),
            title: p.title.as_deref(),
            status: p.status.as_deref(),
            metadata: p.metadata.as_ref(),
        },
        &event.created_at,
    )?;
    Ok(())
}
