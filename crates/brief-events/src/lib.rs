//! # brief-events
//!
//! Event log and projected current-state entities with a `SQLite` backend.
//!
//! - **Events**: 16-variant [`EventType`] with typed payloads generated from a
//!   single table, wire strings like `"block.created"`
//! - **Entities**: [`Block`], [`ContextItem`], [`Project`], [`GitHubEntity`],
//!   [`ClaudeSession`], [`ContextLink`], plus [`ProjectionOffset`] and
//!   [`DeadLetter`] bookkeeping
//! - **`SQLite` backend**: `r2d2` pool, versioned migrations, stateless repositories
//! - **Stores**: [`EventStore`] (append, ordered scan, offsets, dead letters) and
//!   [`ProjectionStore`] (transactional writes for the projector, reads for the
//!   ranking engine and semantic search)

#![deny(unsafe_code)]

pub mod errors;
pub mod sqlite;
pub mod store;
pub mod types;

pub use errors::{EventStoreError, Result};
pub use sqlite::connection::{ConnectionConfig, ConnectionPool, PooledConnection};
pub use store::{AppendOptions, EventStore, ProjectionStore};
pub use types::*;

/// Open a file-backed pool and run pending migrations.
pub fn open(path: &str, config: &ConnectionConfig) -> Result<ConnectionPool> {
    let pool = sqlite::connection::new_file(path, config)?;
    {
        let conn = pool.get()?;
        let _ = sqlite::migrations::run_migrations(&conn)?;
    }
    Ok(pool)
}

/// Open a private in-memory pool and run migrations.
///
/// Every connection in the pool sees the same database.
pub fn open_in_memory(config: &ConnectionConfig) -> Result<ConnectionPool> {
    let pool = sqlite::connection::new_in_memory(config)?;
    {
        let conn = pool.get()?;
        let _ = sqlite::migrations::run_migrations(&conn)?;
    }
    Ok(pool)
}
