//! `project.*` payload.

use serde::{Deserialize, Serialize};

/// Payload for `project.created` and `project.updated`.
///
/// The project ID is the event's own `project_id`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectPayload {
    /// Display name.
    pub name: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Lifecycle status (e.g. `"active"`, `"archived"`).
    pub status: Option<String>,
    /// Repository slug or URL.
    pub repository: Option<String>,
}
