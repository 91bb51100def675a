//! Repository implementations for `SQLite` database operations.
//!
//! Each repository is a stateless struct whose methods take a `&Connection`,
//! so every operation is a plain function of (connection, input) and callers
//! decide the transaction boundary.

pub mod block;
pub mod context_item;
pub mod dead_letter;
pub mod event;
pub mod github;
pub mod link;
pub mod offset;
pub mod project;
pub mod session;
