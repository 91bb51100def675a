//! # brief-core
//!
//! Foundation types shared by every brief crate:
//!
//! - **Branded IDs**: `EventId`, `ProjectId`, `BlockId`, `ContextId` as prefixed newtypes
//! - **Timestamps**: fixed-width RFC 3339 encoding whose lexical order is chronological
//! - **Logging**: `tracing` subscriber initialization

#![deny(unsafe_code)]

pub mod ids;
pub mod logging;
pub mod time;

pub use ids::{BlockId, ContextId, EventId, ProjectId};
