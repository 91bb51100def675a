//! Event and entity type definitions.
//!
//! - [`EventType`]: 16-variant enum of event type discriminators.
//! - [`Event`]: base fields plus an opaque JSON `payload`.
//! - [`EventPayload`]: typed payload access via [`Event::typed_payload()`].
//! - [`payloads`]: typed payload structs per event domain.
//! - [`entities`]: projected current-state rows.

#[macro_use]
mod macros;

pub mod base;
pub mod entities;
pub mod enums;
mod generated;
pub mod payloads;

pub use base::{Event, EventCursor};
pub use entities::{
    Block, ClaudeSession, ContextItem, ContextLink, DeadLetter, GitHubEntity, Project,
    ProjectionOffset,
};
pub use enums::{BlockStatus, ContextType, Lane, Priority, ProviderType, SessionStatus};
pub use generated::{ALL_EVENT_TYPES, EventPayload, EventType};
