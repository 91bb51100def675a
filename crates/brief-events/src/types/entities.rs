//! Projected current-state entities and projector bookkeeping rows.
//!
//! These are owned by the projector: only event handlers write them.

use brief_core::{BlockId, ContextId, EventId, ProjectId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::enums::{BlockStatus, ContextType, Lane, Priority, ProviderType, SessionStatus};

/// A project.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Project ID.
    pub id: ProjectId,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Lifecycle status.
    pub status: String,
    /// Repository slug or URL.
    pub repository: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last change time.
    pub updated_at: DateTime<Utc>,
}

/// A unit of planned or ongoing work.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Block ID.
    pub id: BlockId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Title.
    pub title: String,
    /// Body text.
    pub content: Option<String>,
    /// Lane.
    pub lane: Lane,
    /// Status.
    pub status: BlockStatus,
    /// Priority.
    pub priority: Priority,
    /// Progress percentage in `0..=100`.
    pub progress: u8,
    /// Effort estimate.
    pub effort: Option<String>,
    /// Last time someone worked on it.
    pub last_worked_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last change time.
    pub updated_at: DateTime<Utc>,
    /// Stored embedding of `title + content`.
    #[serde(skip)]
    pub embedding: Option<Vec<f32>>,
}

impl Block {
    /// Text used for search and embedding.
    #[must_use]
    pub fn search_text(&self) -> String {
        match &self.content {
            Some(content) if !content.is_empty() => format!("{}\n{}", self.title, content),
            _ => self.title.clone(),
        }
    }
}

/// A captured piece of project knowledge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContextItem {
    /// Context ID.
    pub id: ContextId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Kind of context.
    #[serde(rename = "type")]
    pub context_type: ContextType,
    /// Optional title.
    pub title: Option<String>,
    /// Body text.
    pub content: String,
    /// Where it came from.
    pub source: String,
    /// Who captured it.
    pub author_id: Option<String>,
    /// Capture time.
    pub created_at: DateTime<Utc>,
    /// Stored embedding of `title + content`.
    #[serde(skip)]
    pub embedding: Option<Vec<f32>>,
}

impl ContextItem {
    /// Text used for search and embedding.
    #[must_use]
    pub fn search_text(&self) -> String {
        match &self.title {
            Some(title) if !title.is_empty() => format!("{title}\n{}", self.content),
            _ => self.content.clone(),
        }
    }
}

/// Many-to-many link between a context item and a block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextLink {
    /// Context item.
    pub context_id: ContextId,
    /// Block.
    pub block_id: BlockId,
    /// Link time.
    pub created_at: DateTime<Utc>,
}

/// A pull request, issue, commit, release or PR comment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GitHubEntity {
    /// Entity ID.
    pub id: String,
    /// Owning project.
    pub project_id: ProjectId,
    /// Kind of object.
    pub provider_type: ProviderType,
    /// Provider-side identifier.
    pub provider_id: String,
    /// Web URL.
    pub url: Option<String>,
    /// Title.
    pub title: String,
    /// Provider state.
    pub status: String,
    /// Provider-specific extras.
    pub metadata: Value,
    /// First seen.
    pub created_at: DateTime<Utc>,
    /// Last change.
    pub updated_at: DateTime<Utc>,
}

impl GitHubEntity {
    /// Default entity ID for a provider key.
    #[must_use]
    pub fn derive_id(provider_type: ProviderType, provider_id: &str) -> String {
        format!("gh_{}_{provider_id}", provider_type.as_str())
    }

    /// Whether the provider state counts as live work.
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self.status.as_str(), "open" | "active")
    }
}

/// An assistant work session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClaudeSession {
    /// Session ID.
    pub id: String,
    /// Owning project.
    pub project_id: ProjectId,
    /// Block being worked on.
    pub block_id: Option<BlockId>,
    /// Running or finished.
    pub status: SessionStatus,
    /// Session title.
    pub title: Option<String>,
    /// Outcome summary.
    pub summary: Option<String>,
    /// Free-form metadata.
    pub metadata: Value,
    /// Start time.
    pub started_at: Option<DateTime<Utc>>,
    /// End time.
    pub ended_at: Option<DateTime<Utc>>,
    /// Last change.
    pub updated_at: DateTime<Utc>,
}

/// Per-consumer position in the event log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionOffset {
    /// Consumer name.
    pub consumer_id: String,
    /// Last applied event.
    pub last_event_id: EventId,
    /// Stored `created_at` of that event.
    pub last_seen_at: String,
    /// When the offset last moved.
    pub updated_at: String,
}

impl ProjectionOffset {
    /// The offset as a log cursor.
    #[must_use]
    pub fn cursor(&self) -> super::EventCursor {
        super::EventCursor {
            event_id: self.last_event_id.clone(),
            created_at: self.last_seen_at.clone(),
        }
    }
}

/// An event whose handler failed permanently.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadLetter {
    /// Consumer that failed.
    pub consumer_id: String,
    /// Failed event.
    pub event_id: EventId,
    /// Its type string as stored.
    pub event_type: String,
    /// Last error message.
    pub error: String,
    /// Attempts made.
    pub attempts: u32,
    /// When it was recorded.
    pub failed_at: String,
}
