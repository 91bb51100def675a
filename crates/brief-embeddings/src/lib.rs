//! # brief-embeddings
//!
//! Text embeddings and semantic search over projected blocks and context items.
//!
//! - [`EmbeddingService`]: provider trait, with [`HttpEmbeddingService`]
//!   (OpenAI-compatible `/embeddings`) and [`MockEmbeddingService`]
//!   (deterministic, offline)
//! - [`EmbeddingCache`]: bounded FIFO text→vector cache keyed by SHA-256
//! - [`EmbeddingAdapter`]: cached `embed`, `semantic_search` with keyword
//!   fallback, and embedding backfill
//!
//! Provider failures are never fatal: search degrades to keyword matching.

#![deny(unsafe_code)]

pub mod adapter;
pub mod cache;
pub mod config;
pub mod errors;
pub mod http;
pub mod normalize;
pub mod service;

pub use adapter::{BackfillReport, EmbeddingAdapter, SearchHit, SearchItem, SearchOptions};
pub use cache::EmbeddingCache;
pub use config::EmbeddingConfig;
pub use errors::{EmbeddingError, Result};
pub use http::HttpEmbeddingService;
pub use normalize::cosine_similarity;
pub use service::{EmbeddingService, MockEmbeddingService};
