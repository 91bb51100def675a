//! Bounded FIFO text→vector cache.
//!
//! Keys are SHA-256 digests of the text. When full, the entry inserted
//! earliest is evicted. Re-inserting an existing key replaces its vector but
//! keeps its original position in the eviction queue. Not thread-safe on its
//! own; the adapter wraps it in a mutex.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use sha2::{Digest, Sha256};

type Key = [u8; 32];

/// Bounded FIFO embedding cache.
#[derive(Debug)]
pub struct EmbeddingCache {
    capacity: usize,
    order: VecDeque<Key>,
    entries: HashMap<Key, Arc<Vec<f32>>>,
}

impl EmbeddingCache {
    /// Create a cache holding at most `capacity` vectors. Zero disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity),
            entries: HashMap::with_capacity(capacity),
        }
    }

    fn key(text: &str) -> Key {
        let digest = Sha256::digest(text.as_bytes());
        let mut key = [0_u8; 32];
        key.copy_from_slice(&digest);
        key
    }

    /// Cached vector for `text`.
    pub fn get(&self, text: &str) -> Option<Arc<Vec<f32>>> {
        self.entries.get(&Self::key(text)).cloned()
    }

    /// Insert or refresh `text`'s vector, evicting the oldest entry when full.
    pub fn insert(&mut self, text: &str, vector: Vec<f32>) -> Arc<Vec<f32>> {
        let vector = Arc::new(vector);
        if self.capacity == 0 {
            return vector;
        }
        let key = Self::key(text);
        if let Some(slot) = self.entries.get_mut(&key) {
            *slot = Arc::clone(&vector);
            return vector;
        }
        while self.entries.len() >= self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    let _ = self.entries.remove(&oldest);
                }
                None => break,
            }
        }
        self.order.push_back(key);
        let _ = self.entries.insert(key, Arc::clone(&vector));
        vector
    }

    /// Whether `text` is cached.
    pub fn contains(&self, text: &str) -> bool {
        self.entries.contains_key(&Self::key(text))
    }

    /// Number of cached vectors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of cached vectors.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.order.clear();
        self.entries.clear();
    }
}
