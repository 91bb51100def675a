//! Block lifecycle handlers.

use brief_events::types::payloads::block::{
    BlockCreatedPayload, BlockDeletedPayload, BlockMovedPayload, BlockProgressUpdatedPayload,
    BlockUpdatedPayload,
};
use brief_events::sqlite::repositories::block::{BlockPatch, BlockRepo};
use brief_events::sqlite::repositories::link::LinkRepo;
use brief_events::{Block, BlockStatus, Event, Lane, Priority};
use rusqlite::Connection;
use tracing::debug;

use super::{non_empty, progress, require};
use crate::errors::Result;

/// `block.created`: insert with defaults; a block that already exists is
/// left untouched.
pub(super) fn created(conn: &Connection, event: &Event, p: BlockCreatedPayload) -> Result<()> {
    let id = require(event, p.block_id, "block_id")?;
    let progress = p.progress.map(|raw| progress(event, raw)).transpose()?.unwrap_or(0);
    let block = Block {
        id,
        project_id: event.project_id.clone(),
        title: non_empty(p.title.as_deref()).unwrap_or("Untitled").to_string(),
        content: p.content,
        lane: p.lane.unwrap_or(Lane::Next),
        status: p.status.unwrap_or_else(|| BlockStatus::from_progress(progress)),
        priority: p.priority.unwrap_or(Priority::Medium),
        progress,
        effort: p.effort,
        last_worked_at: None,
        created_at: event.created_at,
        updated_at: event.created_at,
        embedding: None,
    };
    if !BlockRepo::insert_if_absent(conn, &block)? {
        debug!(block_id = %block.id, event_id = %event.id, "block already exists, create ignored");
    }
    Ok(())
}

/// `block.moved`: change lane and mark worked on.
pub(super) fn moved(conn: &Connection, event: &Event, p: &BlockMovedPayload) -> Result<()> {
    let id = require(event, p.block_id.as_ref(), "block_id")?;
    let lane = require(event, p.lane, "lane")?;
    if !BlockRepo::set_lane(conn, id, lane, &event.created_at)? {
        debug!(block_id = %id, "move for unknown block ignored");
    }
    Ok(())
}

/// `block.progress_updated`: set progress and recompute status.
pub(super) fn progress_updated(
    conn: &Connection,
    event: &Event,
    p: &BlockProgressUpdatedPayload,
) -> Result<()> {
    let id = require(event, p.block_id.as_ref(), "block_id")?;
    let value = progress(event, require(event, p.progress, "progress")?)?;
    let status = BlockStatus::from_progress(value);
    if !BlockRepo::set_progress(conn, id, value, status, &event.created_at)? {
        debug!(block_id = %id, "progress for unknown block ignored");
    }
    Ok(())
}

/// `block.updated`: patch supplied fields. Progress without an explicit
/// status also moves the status.
pub(super) fn updated(conn: &Connection, event: &Event, p: &BlockUpdatedPayload) -> Result<()> {
    let id = require(event, p.block_id.as_ref(), "block_id")?;
    let progress = p.progress.map(|raw| progress(event, raw)).transpose()?;
    let patch = BlockPatch {
        title: non_empty(p.title.as_deref()),
        content: p.content.as_deref(),
        lane: p.lane,
        status: p.status.or_else(|| progress.map(BlockStatus::from_progress)),
        priority: p.priority,
        progress,
        effort: p.effort.as_deref(),
    };
    if patch.is_empty() {
        debug!(block_id = %id, "empty block update ignored");
        return Ok(());
    }
    if !BlockRepo::patch(conn, id, &patch, &event.created_at)? {
        debug!(block_id = %id, "update for unknown block ignored");
    }
    Ok(())
}

/// `block.deleted`: remove the block and its context links.
pub(super) fn deleted(conn: &Connection, event: &Event, p: &BlockDeletedPayload) -> Result<()> {
    let id = require(event, p.block_id.as_ref(), "block_id")?;
    let links = LinkRepo::delete_for_block(conn, id)?;
    let removed = BlockRepo::delete(conn, id)?;
    debug!(block_id = %id, removed, links, "block deleted");
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
