//! Embedding service trait and the deterministic mock provider.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::errors::{EmbeddingError, Result};
use crate::normalize::l2_normalize;

/// A text embedding provider.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Embed a batch of texts, one vector per input in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text.
    async fn embed_single(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| EmbeddingError::InvalidResponse("empty batch result".into()))
    }

    /// Whether the provider can serve requests.
    fn is_ready(&self) -> bool;

    /// Output vector dimensions.
    fn dimensions(&self) -> usize;
}

/// Deterministic offline provider.
///
/// Each lowercase word is hashed with SHA-256 into one signed bucket and the
/// result is L2-normalized, so texts sharing words have positive similarity
/// and identical texts have similarity 1. A failing instance rejects every
/// call, and a limited one rejects calls once it has embedded `limit` texts,
/// for exercising degradation paths.
pub struct MockEmbeddingService {
    dims: usize,
    limit: Option<usize>,
    calls: AtomicUsize,
}

impl MockEmbeddingService {
    /// A working mock producing `dims`-dimensional vectors.
    pub fn new(dims: usize) -> Self {
        Self {
            dims: dims.max(1),
            limit: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// A mock whose every call fails with an API error.
    pub fn failing(dims: usize) -> Self {
        Self::failing_after(dims, 0)
    }

    /// A mock that serves `limit` texts, then fails every call.
    pub fn failing_after(dims: usize, limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::new(dims)
        }
    }

    /// Number of texts embedded so far (including failed calls).
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0_f32; self.dims];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let digest = Sha256::digest(word.to_lowercase().as_bytes());
            let bucket = u64::from_le_bytes([
                digest[0], digest[1], digest[2], digest[3], digest[4], digest[5], digest[6],
                digest[7],
            ]);
            #[allow(clippy::cast_possible_truncation)]
            let idx = (bucket % self.dims as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            v[idx] += sign;
        }
        l2_normalize(&mut v);
        v
    }
}

#[async_trait]
impl EmbeddingService for MockEmbeddingService {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let served = self.calls.fetch_add(texts.len(), Ordering::SeqCst);
        if self.limit.is_some_and(|limit| served + texts.len() > limit) {
            return Err(EmbeddingError::Api {
                status: 503,
                message: "mock provider unavailable".into(),
            });
        }
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }

    fn is_ready(&self) -> bool {
        true
    }

    fn dimensions(&self) -> usize {
        self.dims
    }
}
