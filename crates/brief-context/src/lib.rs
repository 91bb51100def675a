//! # brief-context
//!
//! Ranked, token-budgeted context previews of a project for language-model
//! consumers.
//!
//! - [`scoring`]: deterministic base scores plus query boosts
//! - [`budget`]: chars/4 token estimation and greedy fitting
//! - [`compression`]: overflow summarized via a [`Summarizer`], with a
//!   truncation fallback
//! - [`ContextEngine`]: gathers, ranks, fits and compresses into a
//!   [`ContextPreview`]

#![deny(unsafe_code)]

pub mod budget;
pub mod compression;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod scoring;
pub mod summarizer;
pub mod summary;
pub mod types;

pub use engine::{ContextEngine, PreviewOptions};
pub use errors::{ContextError, Result};
pub use summarizer::{HttpSummarizer, Summarizer, SummaryRequest};
pub use types::{ContextPreview, ContextPreviewItem, PreviewItemType};
