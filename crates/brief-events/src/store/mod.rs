//! High-level stores over the connection pool.
//!
//! - [`EventStore`]: the log, consumer offsets and dead letters.
//! - [`ProjectionStore`]: projected entities; transactional writes for the
//!   projector and reads for ranking and search.

pub mod event_store;
pub mod projection_store;

pub use event_store::{AppendOptions, EventStore};
pub use projection_store::ProjectionStore;
