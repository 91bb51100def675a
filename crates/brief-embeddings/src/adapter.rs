//! Embedding adapter: cached embeddings, semantic search, and backfill.
//!
//! The adapter owns the only [`EmbeddingCache`] instance. Provider failures
//! degrade to keyword search with a fixed similarity of
//! [`KEYWORD_SIMILARITY`]; projection store failures surface as
//! [`EmbeddingError::Store`] on either path.

use std::sync::Arc;
use std::time::Duration;

use brief_events::{Block, ContextItem, ProjectionStore};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::EmbeddingCache;
use crate::config::EmbeddingConfig;
use crate::errors::{EmbeddingError, Result};
use crate::normalize::cosine_similarity;
use crate::service::EmbeddingService;

/// Similarity reported for keyword-fallback matches.
pub const KEYWORD_SIMILARITY: f32 = 0.5;

/// Maximum rows of each kind scanned by one backfill run.
const BACKFILL_SCAN_LIMIT: usize = 10_000;

/// Options for [`EmbeddingAdapter::semantic_search`].
#[derive(Clone, Debug)]
pub struct SearchOptions {
    /// Maximum hits.
    pub limit: usize,
    /// Minimum cosine similarity for semantic hits.
    pub threshold: f32,
    /// Search blocks.
    pub include_blocks: bool,
    /// Search context items.
    pub include_context: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::from_config(&EmbeddingConfig::default())
    }
}

impl SearchOptions {
    /// Defaults from configuration.
    pub fn from_config(config: &EmbeddingConfig) -> Self {
        Self {
            limit: config.search_limit,
            threshold: config.search_threshold,
            include_blocks: true,
            include_context: true,
        }
    }
}

/// A searchable projected entity.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", content = "item", rename_all = "snake_case")]
pub enum SearchItem {
    /// A board block.
    Block(Block),
    /// A context item.
    Context(ContextItem),
}

impl SearchItem {
    /// Entity ID.
    pub fn id(&self) -> &str {
        match self {
            Self::Block(b) => b.id.as_str(),
            Self::Context(c) => c.id.as_str(),
        }
    }

    /// Text that is embedded and keyword-matched.
    pub fn text(&self) -> String {
        match self {
            Self::Block(b) => b.search_text(),
            Self::Context(c) => c.search_text(),
        }
    }

    /// Stored embedding, if any.
    pub fn embedding(&self) -> Option<&[f32]> {
        match self {
            Self::Block(b) => b.embedding.as_deref(),
            Self::Context(c) => c.embedding.as_deref(),
        }
    }
}

/// How a hit was found.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMethod {
    /// Cosine similarity over embeddings.
    Semantic,
    /// Substring match (provider unavailable).
    Keyword,
}

/// One ranked search result.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchHit {
    /// Matched entity.
    pub item: SearchItem,
    /// Similarity in `[-1, 1]`; keyword hits report [`KEYWORD_SIMILARITY`].
    pub similarity: f32,
    /// Which path produced the hit.
    pub method: SearchMethod,
}

/// Outcome of [`EmbeddingAdapter::backfill`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BackfillReport {
    /// Embeddings generated and stored.
    pub processed: usize,
    /// Items whose embedding or store failed.
    pub errors: usize,
    /// Items with empty text.
    pub skipped: usize,
}

enum BackfillTarget {
    Block(String),
    Context(String),
}

/// Cached embedding and semantic search over a [`ProjectionStore`].
pub struct EmbeddingAdapter {
    service: Option<Arc<dyn EmbeddingService>>,
    projections: ProjectionStore,
    cache: Mutex<EmbeddingCache>,
    config: EmbeddingConfig,
}

impl EmbeddingAdapter {
    /// Create an adapter. `service = None` means keyword search only.
    pub fn new(
        projections: ProjectionStore,
        service: Option<Arc<dyn EmbeddingService>>,
        config: EmbeddingConfig,
    ) -> Self {
        Self {
            service,
            projections,
            cache: Mutex::new(EmbeddingCache::new(config.cache_capacity)),
            config,
        }
    }

    /// Whether a ready provider is configured.
    pub fn is_ready(&self) -> bool {
        self.service.as_ref().is_some_and(|s| s.is_ready())
    }

    /// Get the config.
    pub fn config(&self) -> &EmbeddingConfig {
        &self.config
    }

    /// Number of cached vectors.
    pub fn cache_len(&self) -> usize {
        self.cache.lock().len()
    }

    fn ready_service(&self) -> Result<&Arc<dyn EmbeddingService>> {
        match &self.service {
            Some(s) if s.is_ready() => Ok(s),
            _ => Err(EmbeddingError::NotReady),
        }
    }

    /// Embed `text`, consulting the cache first.
    pub async fn embed(&self, text: &str) -> Result<Arc<Vec<f32>>> {
        let service = self.ready_service()?;
        if let Some(hit) = self.cache.lock().get(text) {
            return Ok(hit);
        }
        let vector = service.embed_single(text).await?;
        Ok(self.cache.lock().insert(text, vector))
    }

    /// Cosine similarity between `query` and an item, using the item's stored
    /// embedding when it has the right length, otherwise a cached on-the-fly one.
    pub async fn similarity(&self, query: &[f32], text: &str, stored: Option<&[f32]>) -> Result<f32> {
        if let Some(stored) = stored.filter(|s| s.len() == query.len()) {
            return Ok(cosine_similarity(query, stored));
        }
        let vector = self.embed(text).await?;
        Ok(cosine_similarity(query, &vector))
    }

    /// Rank a project's blocks and context items against `query`.
    ///
    /// Semantic hits at or above `threshold` are returned most similar first.
    /// Without a working provider, substring matches are returned instead.
    pub async fn semantic_search(
        &self,
        project_id: &str,
        query: &str,
        opts: &SearchOptions,
    ) -> Result<Vec<SearchHit>> {
        let query = query.trim();
        if query.is_empty() || opts.limit == 0 {
            return Ok(Vec::new());
        }
        if !self.is_ready() {
            return self.keyword_search(project_id, query, opts).await;
        }

        let candidates = self.load_candidates(project_id, opts).await?;

        let query_vec = match self.embed(query).await {
            Ok(v) => v,
            Err(e) => {
                warn!(project_id, error = %e, "query embedding failed, using keyword search");
                return self.keyword_search(project_id, query, opts).await;
            }
        };

        let mut hits = Vec::new();
        for item in candidates {
            let text = item.text();
            if text.trim().is_empty() {
                continue;
            }
            let scored = self.similarity(&query_vec, &text, item.embedding()).await;
            match scored {
                Ok(similarity) if similarity >= opts.threshold => hits.push(SearchHit {
                    item,
                    similarity,
                    method: SearchMethod::Semantic,
                }),
                Ok(_) => {}
                Err(e) => {
                    warn!(project_id, item_id = item.id(), error = %e, "item embedding failed, using keyword search");
                    return self.keyword_search(project_id, query, opts).await;
                }
            }
        }

        hits.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        hits.truncate(opts.limit);
        debug!(project_id, hits = hits.len(), "semantic search complete");
        Ok(hits)
    }

    /// Substring search over titles and content with a fixed similarity.
    pub async fn keyword_search(
        &self,
        project_id: &str,
        query: &str,
        opts: &SearchOptions,
    ) -> Result<Vec<SearchHit>> {
        let (project, needle, limit) = (project_id.to_owned(), query.to_owned(), opts.limit);
        let (include_blocks, include_context) = (opts.include_blocks, opts.include_context);
        let mut items = self
            .blocking(move |store| {
                let mut items = Vec::new();
                if include_blocks {
                    items.extend(
                        store
                            .search_blocks(&project, &needle, limit)?
                            .into_iter()
                            .map(SearchItem::Block),
                    );
                }
                if include_context {
                    items.extend(
                        store
                            .search_context_items(&project, &needle, limit)?
                            .into_iter()
                            .map(SearchItem::Context),
                    );
                }
                Ok(items)
            })
            .await?;
        items.truncate(limit);
        Ok(items
            .into_iter()
            .map(|item| SearchHit {
                item,
                similarity: KEYWORD_SIMILARITY,
                method: SearchMethod::Keyword,
            })
            .collect())
    }

    /// Generate and store embeddings for every block and context item that
    /// lacks one. Per-item failures are counted, not returned.
    pub async fn backfill(&self) -> Result<BackfillReport> {
        let service = self.ready_service()?;
        let (blocks, contexts) = self
            .blocking(|store| {
                Ok((
                    store.blocks_missing_embedding(BACKFILL_SCAN_LIMIT)?,
                    store.context_items_missing_embedding(BACKFILL_SCAN_LIMIT)?,
                ))
            })
            .await?;

        let targets = blocks
            .into_iter()
            .map(|b| (BackfillTarget::Block(b.id.to_string()), b.search_text()))
            .chain(
                contexts
                    .into_iter()
                    .map(|c| (BackfillTarget::Context(c.id.to_string()), c.search_text())),
            );

        let mut report = BackfillReport::default();
        let mut calls = 0_usize;
        for (target, text) in targets {
            if text.trim().is_empty() {
                report.skipped += 1;
                continue;
            }
            if calls > 0 {
                pause(self.config.backfill_delay).await;
            }
            calls += 1;

            let vector = match service.embed_single(&text).await {
                Ok(v) => v,
                Err(e) => {
                    warn!(error = %e, "backfill embed failed");
                    report.errors += 1;
                    continue;
                }
            };
            let stored = self
                .blocking(move |store| match &target {
                    BackfillTarget::Block(id) => store.set_block_embedding(id, &vector),
                    BackfillTarget::Context(id) => store.set_context_embedding(id, &vector),
                })
                .await;
            match stored {
                Ok(_) => report.processed += 1,
                Err(e) => {
                    warn!(error = %e, "backfill store failed");
                    report.errors += 1;
                }
            }
        }

        info!(
            processed = report.processed,
            errors = report.errors,
            skipped = report.skipped,
            "embedding backfill complete"
        );
        Ok(report)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Internal
    // ─────────────────────────────────────────────────────────────────────

    async fn load_candidates(&self, project_id: &str, opts: &SearchOptions) -> Result<Vec<SearchItem>> {
        let project = project_id.to_owned();
        let (include_blocks, include_context) = (opts.include_blocks, opts.include_context);
        self.blocking(move |store| {
            let mut items = Vec::new();
            if include_blocks {
                items.extend(store.blocks_for_project(&project)?.into_iter().map(SearchItem::Block));
            }
            if include_context {
                items.extend(
                    store
                        .context_items_for_project(&project)?
                        .into_iter()
                        .map(SearchItem::Context),
                );
            }
            Ok(items)
        })
        .await
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&ProjectionStore) -> brief_events::Result<T> + Send + 'static,
    {
        let store = self.projections.clone();
        tokio::task::spawn_blocking(move || f(&store))
            .await
            .map_err(|e| EmbeddingError::Internal(format!("join error: {e}")))?
            .map_err(EmbeddingError::from)
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
