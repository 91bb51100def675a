//! Context capture and linking handlers.

use brief_events::sqlite::repositories::context_item::ContextItemRepo;
use brief_events::sqlite::repositories::link::LinkRepo;
use brief_events::types::payloads::context::{ContextCapturedPayload, ContextLinkedPayload};
use brief_events::{ContextItem, ContextType, Event};
use rusqlite::Connection;
use tracing::debug;

use super::{non_empty, require};
use crate::errors::Result;

/// Source recorded when the producer names none.
const DEFAULT_SOURCE: &str = "manual";

/// `context.captured`: insert the item once, then link any listed blocks.
pub(super) fn captured(conn: &Connection, event: &Event, p: ContextCapturedPayload) -> Result<()> {
    let id = require(event, p.context_id, "context_id")?;
    let item = ContextItem {
        id,
        project_id: event.project_id.clone(),
        context_type: p.context_type.unwrap_or(ContextType::Note),
        title: p.title,
        content: p.content.unwrap_or_default(),
        source: non_empty(p.source.as_deref()).unwrap_or(DEFAULT_SOURCE).to_string(),
        author_id: p.author_id.or_else(|| event.actor_id.clone()),
        created_at: event.created_at,
        embedding: None,
    };
    if !ContextItemRepo::insert_if_absent(conn, &item)? {
        debug!(context_id = %item.id, "context item already captured");
    }
    for block_id in &p.block_ids {
        let _ = LinkRepo::insert_if_absent(conn, &item.id, block_id, &event.created_at)?;
    }
    Ok(())
}

/// `context.linked`: add one context/block link.
pub(super) fn linked(conn: &Connection, event: &Event, p: &ContextLinkedPayload) -> Result<()> {
    let context_id = require(event, p.context_id.as_ref(), "context_id")?;
    let block_id = require(event, p.block_id.as_ref(), "block_id")?;
    let _ = LinkRepo::insert_if_absent(conn, context_id, block_id, &event.created_at)?;
    Ok(())
}
