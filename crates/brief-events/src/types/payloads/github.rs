//! `github.*` payload, shared by all five GitHub event types.
//!
//! The provider type comes from the event type, not the payload.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload for `github.pr`, `github.issue`, `github.commit`,
/// `github.release` and `github.pr_comment`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubPayload {
    /// Entity ID; derived from the provider key when absent.
    pub id: Option<String>,
    /// Provider-side identifier (PR number, commit SHA, ...).
    pub provider_id: Option<String>,
    /// Web URL.
    pub url: Option<String>,
    /// Title or commit subject.
    pub title: Option<String>,
    /// Provider state (`open`, `closed`, `merged`, ...).
    pub status: Option<String>,
    /// Provider-specific extras.
    pub metadata: Option<Value>,
}
