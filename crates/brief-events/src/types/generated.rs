//! Event type table.
//!
//! [`EventType`], [`EventPayload`] and `ALL_EVENT_TYPES` are all produced by
//! [`define_events!`] from the table below. Add or remove events here only.

use serde::{Deserialize, Serialize};

use super::base::Event;
use super::payloads;

define_events! {
    /// Block created on a project board.
    BlockCreated => "block.created" => payloads::block::BlockCreatedPayload,
    /// Block moved to another lane.
    BlockMoved => "block.moved" => payloads::block::BlockMovedPayload,
    /// Block progress changed.
    BlockProgressUpdated => "block.progress_updated" => payloads::block::BlockProgressUpdatedPayload,
    /// Partial block field patch.
    BlockUpdated => "block.updated" => payloads::block::BlockUpdatedPayload,
    /// Block removed.
    BlockDeleted => "block.deleted" => payloads::block::BlockDeletedPayload,
    /// Context item captured.
    ContextCaptured => "context.captured" => payloads::context::ContextCapturedPayload,
    /// Context item linked to a block.
    ContextLinked => "context.linked" => payloads::context::ContextLinkedPayload,
    /// Assistant work session started.
    SessionStarted => "session.started" => payloads::session::SessionStartedPayload,
    /// Assistant work session ended.
    SessionEnded => "session.ended" => payloads::session::SessionEndedPayload,
    /// Pull request opened or changed.
    GitHubPr => "github.pr" => payloads::github::GitHubPayload,
    /// Issue opened or changed.
    GitHubIssue => "github.issue" => payloads::github::GitHubPayload,
    /// Commit pushed.
    GitHubCommit => "github.commit" => payloads::github::GitHubPayload,
    /// Release published.
    GitHubRelease => "github.release" => payloads::github::GitHubPayload,
    /// Pull request review comment.
    GitHubPrComment => "github.pr_comment" => payloads::github::GitHubPayload,
    /// Project created.
    ProjectCreated => "project.created" => payloads::project::ProjectPayload,
    /// Project metadata changed.
    ProjectUpdated => "project.updated" => payloads::project::ProjectPayload,
}

impl EventType {
    /// GitHub provider type for `github.*` events.
    #[must_use]
    pub fn provider_type(self) -> Option<super::ProviderType> {
        use super::ProviderType;
        match self {
            Self::GitHubPr => Some(ProviderType::Pr),
            Self::GitHubIssue => Some(ProviderType::Issue),
            Self::GitHubCommit => Some(ProviderType::Commit),
            Self::GitHubRelease => Some(ProviderType::Release),
            Self::GitHubPrComment => Some(ProviderType::PrComment),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
