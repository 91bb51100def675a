//! Typed payload structs, one module per event domain.
//!
//! Every field is optional and unknown fields are ignored, so producers can
//! evolve independently. Handlers decide which missing fields make an event
//! malformed.

pub mod block;
pub mod context;
pub mod github;
pub mod project;
pub mod session;
