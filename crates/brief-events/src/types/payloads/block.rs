//! `block.*` payloads.

use brief_core::BlockId;
use serde::{Deserialize, Serialize};

use crate::types::{BlockStatus, Lane, Priority};

/// Payload for `block.created`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockCreatedPayload {
    /// Block to create.
    pub block_id: Option<BlockId>,
    /// Title.
    pub title: Option<String>,
    /// Body text.
    pub content: Option<String>,
    /// Initial lane.
    pub lane: Option<Lane>,
    /// Explicit initial status (otherwise derived from progress).
    pub status: Option<BlockStatus>,
    /// Initial priority.
    pub priority: Option<Priority>,
    /// Initial progress percentage.
    pub progress: Option<i64>,
    /// Effort estimate.
    pub effort: Option<String>,
}

/// Payload for `block.moved`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockMovedPayload {
    /// Block to move.
    pub block_id: Option<BlockId>,
    /// Destination lane.
    pub lane: Option<Lane>,
}

/// Payload for `block.progress_updated`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockProgressUpdatedPayload {
    /// Block to update.
    pub block_id: Option<BlockId>,
    /// New progress percentage.
    pub progress: Option<i64>,
}

/// Payload for `block.updated`. Only supplied fields change.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockUpdatedPayload {
    /// Block to patch.
    pub block_id: Option<BlockId>,
    /// New title.
    pub title: Option<String>,
    /// New body text.
    pub content: Option<String>,
    /// New lane.
    pub lane: Option<Lane>,
    /// New status.
    pub status: Option<BlockStatus>,
    /// New priority.
    pub priority: Option<Priority>,
    /// New progress percentage.
    pub progress: Option<i64>,
    /// New effort estimate.
    pub effort: Option<String>,
}

/// Payload for `block.deleted`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockDeletedPayload {
    /// Block to delete.
    pub block_id: Option<BlockId>,
}
