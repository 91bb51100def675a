//! `ContextEngine`: builds ranked, budget-fitted project previews.
//!
//! ## Algorithm
//!
//! 1. Gather the project row, blocks, context items and GitHub entities
//!    concurrently on the blocking pool.
//! 2. Score each candidate; a query adds textual and semantic boosts.
//! 3. Stable-sort by score, fit into the token budget, compress the
//!    high-scoring overflow.
//! 4. Count categories over all candidates for the summary line.
//!
//! Only caller input fails a build. A source that cannot be loaded counts as
//! empty, and embedding or summarizer failures degrade to the next cheaper
//! path.

use std::sync::Arc;

use brief_embeddings::EmbeddingAdapter;
use brief_events::{Block, ContextItem, GitHubEntity, Project, ProjectionStore};
use brief_settings::ContextSettings;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::budget::fit_to_budget;
use crate::compression::{compress, remaining_tokens};
use crate::errors::{ContextError, Result};
use crate::scoring::{
    block_score, context_score, final_score, github_score, query_terms, semantic_boost,
    textual_boost,
};
use crate::summarizer::Summarizer;
use crate::summary::SummaryCounts;
use crate::types::{ContextPreview, ContextPreviewItem};

/// Request parameters for [`ContextEngine::build_preview`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreviewOptions {
    /// Token budget for the whole preview.
    pub token_budget: usize,
    /// Include blocks.
    pub include_blocks: bool,
    /// Include context items.
    pub include_context: bool,
    /// Include GitHub entities.
    pub include_github: bool,
    /// Optional focus query.
    pub query: Option<String>,
}

impl PreviewOptions {
    /// Defaults from settings.
    pub fn from_settings(settings: &ContextSettings) -> Self {
        Self {
            token_budget: settings.default_token_budget,
            include_blocks: settings.include_blocks,
            include_context: settings.include_context,
            include_github: settings.include_github,
            query: None,
        }
    }

    /// Set the focus query.
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Set the token budget.
    #[must_use]
    pub fn with_budget(mut self, token_budget: usize) -> Self {
        self.token_budget = token_budget;
        self
    }

    fn focus_query(&self) -> Option<&str> {
        self.query.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self::from_settings(&ContextSettings::default())
    }
}

struct Candidate {
    item: ContextPreviewItem,
    embedding: Option<Vec<f32>>,
}

struct Gathered {
    project: Option<Project>,
    blocks: Vec<Block>,
    contexts: Vec<ContextItem>,
    github: Vec<GitHubEntity>,
}

impl Gathered {
    fn is_unknown(&self) -> bool {
        self.project.is_none()
            && self.blocks.is_empty()
            && self.contexts.is_empty()
            && self.github.is_empty()
    }

    fn into_candidates(self, now: DateTime<Utc>) -> Vec<Candidate> {
        let mut candidates =
            Vec::with_capacity(self.blocks.len() + self.contexts.len() + self.github.len());
        for mut block in self.blocks {
            let mut item = ContextPreviewItem::from_block(&block);
            item.score = block_score(&block, now);
            candidates.push(Candidate {
                item,
                embedding: block.embedding.take(),
            });
        }
        for mut context in self.contexts {
            let mut item = ContextPreviewItem::from_context(&context);
            item.score = context_score(&context, now);
            candidates.push(Candidate {
                item,
                embedding: context.embedding.take(),
            });
        }
        for entity in self.github {
            let mut item = ContextPreviewItem::from_github(&entity);
            item.score = github_score(&entity, now);
            candidates.push(Candidate {
                item,
                embedding: None,
            });
        }
        candidates
    }
}

/// Ranks and compresses projected entities into a [`ContextPreview`].
pub struct ContextEngine {
    projections: ProjectionStore,
    embeddings: Option<Arc<EmbeddingAdapter>>,
    summarizer: Option<Arc<dyn Summarizer>>,
    semantic_boost: bool,
}

impl ContextEngine {
    /// Engine without embeddings or a summarizer.
    pub fn new(projections: ProjectionStore) -> Self {
        Self {
            projections,
            embeddings: None,
            summarizer: None,
            semantic_boost: true,
        }
    }

    /// Use `adapter` for the semantic boost.
    #[must_use]
    pub fn with_embeddings(mut self, adapter: Arc<EmbeddingAdapter>) -> Self {
        self.embeddings = Some(adapter);
        self
    }

    /// Compress overflow with `summarizer`.
    #[must_use]
    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    /// Turn the semantic boost on or off.
    #[must_use]
    pub fn with_semantic_boost(mut self, enabled: bool) -> Self {
        self.semantic_boost = enabled;
        self
    }

    /// Build a preview for `project_id`.
    pub async fn build_preview(
        &self,
        project_id: &str,
        options: &PreviewOptions,
    ) -> Result<ContextPreview> {
        let project_id = project_id.trim();
        if project_id.is_empty() {
            return Err(ContextError::InvalidInput("project id is required".into()));
        }
        if options.token_budget == 0 {
            return Err(ContextError::InvalidInput(
                "token budget must be positive".into(),
            ));
        }

        let gathered = self.gather(project_id, options).await;
        if gathered.is_unknown() {
            return Err(ContextError::ProjectNotFound(project_id.to_string()));
        }

        let mut candidates = gathered.into_candidates(brief_core::time::now());
        let query = options.focus_query();
        if let Some(query) = query {
            self.apply_query(query, &mut candidates).await;
        }

        let mut ranked: Vec<ContextPreviewItem> = candidates.into_iter().map(|c| c.item).collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        let total_items = ranked.len();
        let counts = SummaryCounts::from_items(&ranked);

        let fit = fit_to_budget(ranked, options.token_budget);
        let remaining = remaining_tokens(options.token_budget, fit.used_tokens);
        let compressed = compress(self.summarizer.as_deref(), &fit.queued, remaining, query).await;

        let summary = counts.line(fit.included.len());
        let mut preview = fit.included;
        preview.extend(compressed);

        info!(
            project_id = %project_id,
            total_items,
            included = preview.len(),
            queued = fit.queued.len(),
            dropped = fit.dropped,
            used_tokens = fit.used_tokens,
            "context preview built"
        );

        Ok(ContextPreview {
            project_id: project_id.to_string(),
            preview,
            summary,
            total_items,
            generated_at: brief_core::time::now(),
        })
    }

    async fn gather(&self, project_id: &str, options: &PreviewOptions) -> Gathered {
        let id = project_id.to_string();
        let project = self.load("project", move |s| s.get_project(&id));

        let id = project_id.to_string();
        let blocks = async {
            if options.include_blocks {
                self.load("blocks", move |s| s.blocks_for_project(&id)).await
            } else {
                Vec::new()
            }
        };

        let id = project_id.to_string();
        let contexts = async {
            if options.include_context {
                self.load("context", move |s| s.context_items_for_project(&id)).await
            } else {
                Vec::new()
            }
        };

        let id = project_id.to_string();
        let github = async {
            if options.include_github {
                self.load("github", move |s| s.github_for_project(&id)).await
            } else {
                Vec::new()
            }
        };

        let (project, blocks, contexts, github) = tokio::join!(project, blocks, contexts, github);
        Gathered {
            project,
            blocks,
            contexts,
            github,
        }
    }

    /// Run `f` on the blocking pool. Failures are logged and read as empty.
    async fn load<T, F>(&self, source: &'static str, f: F) -> T
    where
        T: Default + Send + 'static,
        F: FnOnce(&ProjectionStore) -> brief_events::Result<T> + Send + 'static,
    {
        let store = self.projections.clone();
        match tokio::task::spawn_blocking(move || f(&store)).await {
            Ok(Ok(value)) => value,
            Ok(Err(error)) => {
                warn!(source, %error, "context source unavailable, treating as empty");
                T::default()
            }
            Err(error) => {
                warn!(source, %error, "context load task failed, treating as empty");
                T::default()
            }
        }
    }

    async fn apply_query(&self, query: &str, candidates: &mut [Candidate]) {
        let terms = query_terms(query);
        let similarities = self.similarities(query, candidates).await;

        for (i, candidate) in candidates.iter_mut().enumerate() {
            let textual = textual_boost(&terms, &candidate.item.text());
            let semantic = similarities
                .as_ref()
                .map_or(0.0, |all| semantic_boost(all[i]));
            candidate.item.score = final_score(candidate.item.score, textual, semantic);
        }
    }

    /// Query similarity of every candidate, or `None` if any one fails.
    async fn similarities(&self, query: &str, candidates: &[Candidate]) -> Option<Vec<f32>> {
        let vector = self.query_embedding(query).await?;
        let adapter = self.embeddings.as_deref()?;
        let mut similarities = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            match adapter
                .similarity(&vector, &candidate.item.text(), candidate.embedding.as_deref())
                .await
            {
                Ok(similarity) => similarities.push(similarity),
                Err(error) => {
                    debug!(%error, item_id = %candidate.item.id, "semantic boost dropped for this preview");
                    return None;
                }
            }
        }
        Some(similarities)
    }

    async fn query_embedding(&self, query: &str) -> Option<Arc<Vec<f32>>> {
        if !self.semantic_boost {
            return None;
        }
        let adapter = self.embeddings.as_ref().filter(|a| a.is_ready())?;
        match adapter.embed(query).await {
            Ok(vector) => Some(vector),
            Err(error) => {
                debug!(%error, "query embedding failed, skipping semantic boost");
                None
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use crate::budget::fit_limit;
    use crate::constants::{SOURCE_AI_COMPRESSED, SOURCE_TRUNCATED};
    use crate::summarizer::MockSummarizer;
    use crate::types::PreviewItemType;
    use assert_matches::assert_matches;
    use brief_core::{BlockId, ContextId, ProjectId};
    use brief_embeddings::{EmbeddingConfig, MockEmbeddingService};
    use brief_events::sqlite::repositories::block::BlockRepo;
    use brief_events::sqlite::repositories::context_item::ContextItemRepo;
    use brief_events::sqlite::repositories::github::{GitHubRepo, GitHubUpsert};
    use brief_events::sqlite::repositories::project::{ProjectFields, ProjectRepo};
    use brief_events::{
        BlockStatus, ConnectionConfig, ContextType, EventStoreError, Lane, Priority, ProviderType,
    };
    use chrono::Duration;

    const DIMS: usize = 64;

    fn store() -> ProjectionStore {
        ProjectionStore::new(brief_events::open_in_memory(&ConnectionConfig::default()).unwrap())
    }

    fn add_project(store: &ProjectionStore, id: &str) {
        store
            .write(|tx| {
                ProjectRepo::upsert(
                    tx,
                    &ProjectId::from(id),
                    &ProjectFields::default(),
                    &brief_core::time::now(),
                )
            })
            .unwrap();
    }

    fn add_block(
        store: &ProjectionStore,
        id: &str,
        lane: Lane,
        priority: Priority,
        status: BlockStatus,
        age: Duration,
    ) {
        let at = brief_core::time::now() - age;
        let block = Block {
            id: BlockId::from(id),
            project_id: ProjectId::from("prj_1"),
            title: format!("Block {id}"),
            content: Some("Some work.".into()),
            lane,
            status,
            priority,
            progress: 0,
            effort: None,
            last_worked_at: None,
            created_at: at,
            updated_at: at,
            embedding: None,
        };
        store
            .write(|tx| BlockRepo::insert_if_absent(tx, &block))
            .unwrap();
    }

    fn add_context(store: &ProjectionStore, id: &str, context_type: ContextType, content: &str) {
        let item = ContextItem {
            id: ContextId::from(id),
            project_id: ProjectId::from("prj_1"),
            context_type,
            title: None,
            content: content.into(),
            source: "manual".into(),
            author_id: None,
            created_at: brief_core::time::now(),
            embedding: None,
        };
        store
            .write(|tx| ContextItemRepo::insert_if_absent(tx, &item))
            .unwrap();
    }

    fn add_pr(store: &ProjectionStore, provider_id: &str, status: &str) {
        let project_id = ProjectId::from("prj_1");
        let id = GitHubEntity::derive_id(ProviderType::Pr, provider_id);
        store
            .write(|tx| {
                GitHubRepo::upsert(
                    tx,
                    &GitHubUpsert {
                        id: &id,
                        project_id: &project_id,
                        provider_type: ProviderType::Pr,
                        provider_id,
                        url: None,
                        title: Some("Add login"),
                        status: Some(status),
                        metadata: None,
                    },
                    &brief_core::time::now(),
                )
            })
            .unwrap();
    }

    fn options() -> PreviewOptions {
        PreviewOptions::default()
    }

    fn adapter(store: &ProjectionStore, service: MockEmbeddingService) -> Arc<EmbeddingAdapter> {
        let config = EmbeddingConfig {
            dimensions: DIMS,
            ..EmbeddingConfig::default()
        };
        Arc::new(EmbeddingAdapter::new(store.clone(), Some(Arc::new(service)), config))
    }

    fn assert_sorted(preview: &ContextPreview) {
        let scores: Vec<f32> = preview
            .preview
            .iter()
            .filter(|i| i.item_type != PreviewItemType::Summary)
            .map(|i| i.score)
            .collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]), "unsorted: {scores:?}");
    }

    #[tokio::test]
    async fn rejects_bad_input() {
        let engine = ContextEngine::new(store());
        let err = engine.build_preview("  ", &options()).await.unwrap_err();
        assert_matches!(err, ContextError::InvalidInput(_));
        let err = engine
            .build_preview("prj_1", &options().with_budget(0))
            .await
            .unwrap_err();
        assert_matches!(err, ContextError::InvalidInput(_));
    }

    #[tokio::test]
    async fn unknown_project_not_found() {
        let engine = ContextEngine::new(store());
        let err = engine.build_preview("prj_missing", &options()).await.unwrap_err();
        assert_matches!(err, ContextError::ProjectNotFound(id) if id == "prj_missing");
    }

    #[tokio::test]
    async fn empty_project_yields_empty_preview() {
        let store = store();
        add_project(&store, "prj_1");
        let preview = ContextEngine::new(store)
            .build_preview("prj_1", &options())
            .await
            .unwrap();
        assert!(preview.preview.is_empty());
        assert_eq!(preview.total_items, 0);
        assert_eq!(preview.summary, "Nothing recorded for this project yet.");
    }

    #[tokio::test]
    async fn entities_without_project_row_still_preview() {
        let store = store();
        add_context(&store, "ctx_1", ContextType::Note, "orphan");
        let preview = ContextEngine::new(store)
            .build_preview("prj_1", &options())
            .await
            .unwrap();
        assert_eq!(preview.total_items, 1);
    }

    #[tokio::test]
    async fn ranks_across_kinds() {
        let store = store();
        add_project(&store, "prj_1");
        add_block(&store, "blk_hot", Lane::Current, Priority::Urgent, BlockStatus::InProgress, Duration::zero());
        add_block(&store, "blk_cold", Lane::Vision, Priority::Low, BlockStatus::NotStarted, Duration::days(60));
        add_context(&store, "ctx_1", ContextType::Decision, "Use JWT.");
        add_pr(&store, "42", "open");

        let preview = ContextEngine::new(store)
            .build_preview("prj_1", &options())
            .await
            .unwrap();

        assert_eq!(preview.total_items, 4);
        assert_eq!(preview.preview.len(), 4);
        assert_eq!(preview.preview[0].id, "blk_hot");
        assert_eq!(preview.preview[0].score, 1.0);
        assert_eq!(preview.preview[3].id, "blk_cold");
        assert_sorted(&preview);
        assert_eq!(
            preview.summary,
            "2 blocks (1 in_progress, 1 not_started); 1 context item (1 decision); \
             1 GitHub item (1 pr). Showing 4 of 4."
        );
    }

    #[tokio::test]
    async fn toggles_exclude_sources() {
        let store = store();
        add_project(&store, "prj_1");
        add_block(&store, "blk_1", Lane::Next, Priority::High, BlockStatus::NotStarted, Duration::zero());
        add_context(&store, "ctx_1", ContextType::Note, "note");
        add_pr(&store, "7", "open");

        let opts = PreviewOptions {
            include_blocks: false,
            include_github: false,
            ..options()
        };
        let preview = ContextEngine::new(store).build_preview("prj_1", &opts).await.unwrap();
        let kinds: Vec<_> = preview.preview.iter().map(|i| i.item_type).collect();
        assert_eq!(kinds, [PreviewItemType::Context]);
        assert_eq!(preview.total_items, 1);
    }

    fn add_large_decisions(store: &ProjectionStore, n: usize) {
        add_project(store, "prj_1");
        for i in 0..n {
            add_context(store, &format!("ctx_{i}"), ContextType::Decision, &"d".repeat(4000));
        }
    }

    #[tokio::test]
    async fn overflow_compressed_by_summarizer() {
        let store = store();
        add_large_decisions(&store, 5);

        let mut mock = MockSummarizer::new();
        mock.expect_summarize()
            .withf(|req| req.items.len() == 3 && req.target_tokens == 480)
            .times(1)
            .returning(|_| Ok("Three more decisions.".into()));

        let engine = ContextEngine::new(store).with_summarizer(Arc::new(mock));
        let preview = engine
            .build_preview("prj_1", &options().with_budget(2600))
            .await
            .unwrap();

        assert_eq!(preview.total_items, 5);
        assert_eq!(preview.preview.len(), 3);
        assert!(preview.ranked_tokens() <= fit_limit(2600));
        let summary = preview.summary_item().unwrap();
        assert_eq!(summary.source, SOURCE_AI_COMPRESSED);
        assert_eq!(summary.content, "Three more decisions.");
        assert!(preview.summary.ends_with("Showing 2 of 5."));
    }

    #[tokio::test]
    async fn overflow_truncated_when_summarizer_fails() {
        let store = store();
        add_large_decisions(&store, 5);

        let mut mock = MockSummarizer::new();
        mock.expect_summarize()
            .returning(|_| Err(ContextError::InvalidResponse("nope".into())));

        let engine = ContextEngine::new(store).with_summarizer(Arc::new(mock));
        let preview = engine
            .build_preview("prj_1", &options().with_budget(1000))
            .await
            .unwrap();

        // Nothing fits in 800 tokens; all five queue, three are merged.
        assert_eq!(preview.preview.len(), 1);
        let summary = preview.summary_item().unwrap();
        assert_eq!(summary.source, SOURCE_TRUNCATED);
        assert_eq!(summary.content.lines().count(), 3);
    }

    #[tokio::test]
    async fn overflow_dropped_without_summarizer() {
        let store = store();
        add_large_decisions(&store, 5);
        let preview = ContextEngine::new(store)
            .build_preview("prj_1", &options().with_budget(2600))
            .await
            .unwrap();
        assert_eq!(preview.preview.len(), 2);
        assert!(preview.summary_item().is_none());
        assert_eq!(preview.total_items, 5);
    }

    #[tokio::test]
    async fn query_boost_reorders_equal_items() {
        let store = store();
        add_project(&store, "prj_1");
        add_context(&store, "ctx_a", ContextType::Note, "refactor the billing module");
        add_context(&store, "ctx_b", ContextType::Note, "login uses oauth tokens");

        let preview = ContextEngine::new(store)
            .build_preview("prj_1", &options().with_query("oauth login"))
            .await
            .unwrap();
        assert_eq!(preview.preview[0].id, "ctx_b");
        // 0.6 base + (0.1 + 0.1) * 1.5
        assert!((preview.preview[0].score - 0.9).abs() < 1e-5);
        assert!((preview.preview[1].score - 0.6).abs() < 1e-5);
    }

    #[tokio::test]
    async fn semantic_boost_adds_to_textual() {
        let store = store();
        add_project(&store, "prj_1");
        add_context(&store, "ctx_a", ContextType::Note, "alpha beta");

        let engine = ContextEngine::new(store.clone())
            .with_embeddings(adapter(&store, MockEmbeddingService::new(DIMS)));
        let preview = engine
            .build_preview("prj_1", &options().with_query("alpha beta"))
            .await
            .unwrap();
        assert_eq!(preview.preview[0].score, 1.0);

        let engine = engine.with_semantic_boost(false);
        let preview = engine
            .build_preview("prj_1", &options().with_query("alpha beta"))
            .await
            .unwrap();
        assert!((preview.preview[0].score - 0.9).abs() < 1e-5);
    }

    #[tokio::test]
    async fn failing_embeddings_degrade_to_textual() {
        let store = store();
        add_project(&store, "prj_1");
        add_context(&store, "ctx_a", ContextType::Note, "alpha beta");

        let engine = ContextEngine::new(store.clone())
            .with_embeddings(adapter(&store, MockEmbeddingService::failing(DIMS)));
        let preview = engine
            .build_preview("prj_1", &options().with_query("alpha beta"))
            .await
            .unwrap();
        assert!((preview.preview[0].score - 0.9).abs() < 1e-5);
    }

    #[tokio::test]
    async fn embedding_failure_midway_drops_all_semantic_boosts() {
        let store = store();
        add_project(&store, "prj_1");
        add_context(&store, "ctx_a", ContextType::Note, "alpha beta one");
        add_context(&store, "ctx_b", ContextType::Note, "alpha beta two");

        // Serves the query and the first item, then fails.
        let service = MockEmbeddingService::failing_after(DIMS, 2);
        let engine = ContextEngine::new(store.clone()).with_embeddings(adapter(&store, service));
        let preview = engine
            .build_preview("prj_1", &options().with_query("alpha beta"))
            .await
            .unwrap();

        assert_eq!(preview.preview.len(), 2);
        // 0.6 base + (0.1 + 0.1) * 1.5, no semantic part on either item.
        for item in &preview.preview {
            assert!((item.score - 0.9).abs() < 1e-5, "{}: {}", item.id, item.score);
        }
        assert_eq!(preview.preview[0].score, preview.preview[1].score);
    }

    #[tokio::test]
    async fn blank_query_is_ignored() {
        let store = store();
        add_project(&store, "prj_1");
        add_context(&store, "ctx_a", ContextType::Note, "alpha");
        let preview = ContextEngine::new(store)
            .build_preview("prj_1", &options().with_query("   "))
            .await
            .unwrap();
        assert!((preview.preview[0].score - 0.6).abs() < 1e-5);
    }

    #[tokio::test]
    async fn failed_source_reads_as_empty() {
        let store = store();
        add_project(&store, "prj_1");
        add_block(&store, "blk_1", Lane::Current, Priority::High, BlockStatus::InProgress, Duration::zero());
        add_context(&store, "ctx_1", ContextType::Decision, "Use JWT.");
        add_pr(&store, "42", "open");
        store
            .write(|tx| {
                tx.execute_batch("DROP TABLE github_entities")?;
                Ok::<_, EventStoreError>(())
            })
            .unwrap();

        let preview = ContextEngine::new(store)
            .build_preview("prj_1", &options())
            .await
            .unwrap();
        assert_eq!(preview.total_items, 2);
        assert!(preview.preview.iter().all(|i| i.item_type != PreviewItemType::GitHub));
    }

    #[tokio::test]
    async fn unreadable_store_is_not_found_not_error() {
        let store = store();
        store
            .write(|tx| {
                tx.execute_batch("DROP TABLE blocks; DROP TABLE projects")?;
                Ok::<_, EventStoreError>(())
            })
            .unwrap();
        let err = ContextEngine::new(store)
            .build_preview("prj_1", &options())
            .await
            .unwrap_err();
        assert_matches!(err, ContextError::ProjectNotFound(_));
    }

    #[test]
    fn options_follow_settings() {
        let settings = ContextSettings {
            default_token_budget: 1234,
            include_github: false,
            ..ContextSettings::default()
        };
        let opts = PreviewOptions::from_settings(&settings).with_query("auth");
        assert_eq!(opts.token_budget, 1234);
        assert!(!opts.include_github);
        assert_eq!(opts.focus_query(), Some("auth"));
    }
}
