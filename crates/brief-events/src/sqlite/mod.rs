//! `SQLite` backend.
//!
//! - **[`connection`]**: `r2d2` pool with WAL mode and performance pragmas.
//! - **[`migrations`]**: Version-tracked schema evolution, embedded at compile time.
//! - **[`row_types`]**: Raw row structs and column helpers.
//! - **[`repositories`]**: Stateless repository structs; each method takes
//!   `&Connection` and executes SQL.

pub mod connection;
pub mod migrations;
pub mod repositories;
pub mod row_types;

pub use connection::{
    ConnectionConfig, ConnectionPool, PooledConnection, PragmaState, new_file, new_in_memory,
    verify_pragmas,
};
pub use migrations::{current_version, latest_version, run_migrations};
