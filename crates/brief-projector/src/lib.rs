//! # brief-projector
//!
//! Consumes the event log in `(created_at, id)` order and maintains the
//! projected entity tables.
//!
//! - **[`Projector`]**: poll loop (`run`/`stop`), single-cycle
//!   [`Projector::process_batch`], full [`Projector::rebuild`], and
//!   [`Projector::status`]
//! - **Handlers**: one idempotent mutation per event type, dispatched by an
//!   exhaustive match on the typed payload
//! - **Failure policy**: failed events are skipped or dead-lettered, and the
//!   offset always moves past them

#![deny(unsafe_code)]

pub mod config;
pub mod errors;
mod handlers;
pub mod projector;

pub use config::ProjectorConfig;
pub use errors::{ProjectionError, Result};
pub use projector::{BatchStats, Projector, ProjectorStatus};
