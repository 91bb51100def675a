//! `session.*` payloads.

use brief_core::BlockId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload for `session.started`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionStartedPayload {
    /// Session identifier assigned by the assistant.
    pub session_id: Option<String>,
    /// Block being worked on.
    pub block_id: Option<BlockId>,
    /// Session title.
    pub title: Option<String>,
    /// Free-form metadata.
    pub metadata: Option<Value>,
}

/// Payload for `session.ended`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionEndedPayload {
    /// Session identifier.
    pub session_id: Option<String>,
    /// Outcome summary.
    pub summary: Option<String>,
    /// Free-form metadata.
    pub metadata: Option<Value>,
}
