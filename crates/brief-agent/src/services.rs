//! Wiring from settings and environment secrets to engine components.
//!
//! API keys are only ever read from the environment, never from the
//! settings file.

use std::sync::Arc;

use anyhow::{Context, Result};
use brief_context::{ContextEngine, HttpSummarizer, Summarizer};
use brief_embeddings::{EmbeddingAdapter, EmbeddingConfig, EmbeddingService, HttpEmbeddingService};
use brief_events::{ConnectionConfig, EventStore, ProjectionStore};
use brief_projector::{Projector, ProjectorConfig};
use brief_settings::BriefSettings;
use tracing::info;

/// Environment variable holding the embedding provider key.
pub const EMBEDDING_API_KEY_ENV: &str = "BRIEF_EMBEDDING_API_KEY";

/// Environment variable holding the summarizer key.
pub const SUMMARIZER_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Provider secrets.
#[derive(Clone, Debug, Default)]
pub struct ApiKeys {
    /// Key for the embeddings endpoint.
    pub embedding: Option<String>,
    /// Key for the Messages API.
    pub summarizer: Option<String>,
}

impl ApiKeys {
    /// Read keys from the process environment. Empty values count as unset.
    pub fn from_env() -> Self {
        let read = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            embedding: read(EMBEDDING_API_KEY_ENV),
            summarizer: read(SUMMARIZER_API_KEY_ENV),
        }
    }
}

/// Opened stores plus the settings and keys used to build services.
#[derive(Clone)]
pub struct App {
    /// Effective settings.
    pub settings: BriefSettings,
    /// Event log.
    pub events: EventStore,
    /// Projected entities.
    pub projections: ProjectionStore,
    keys: ApiKeys,
}

impl App {
    /// Open (and migrate) the database at `db_path`.
    pub fn open(db_path: &str, settings: BriefSettings, keys: ApiKeys) -> Result<Self> {
        let config = ConnectionConfig {
            pool_size: settings.database.pool_size,
            busy_timeout_ms: settings.database.busy_timeout_ms,
            ..ConnectionConfig::default()
        };
        let pool = brief_events::open(db_path, &config)
            .with_context(|| format!("Failed to open database: {db_path}"))?;
        info!(db_path, "database ready");
        Ok(Self {
            settings,
            events: EventStore::new(pool.clone()),
            projections: ProjectionStore::new(pool),
            keys,
        })
    }

    /// Projector configured from settings.
    pub fn projector(&self) -> Projector {
        Projector::new(
            self.events.clone(),
            self.projections.clone(),
            ProjectorConfig::from(&self.settings.projector),
        )
    }

    /// Embedding adapter; keyword-only when disabled or without a key.
    pub fn embedding_adapter(&self) -> Result<Arc<EmbeddingAdapter>> {
        let config = EmbeddingConfig::from_settings(&self.settings.embeddings);
        let service: Option<Arc<dyn EmbeddingService>> = match &self.keys.embedding {
            Some(key) if config.enabled => {
                let http = HttpEmbeddingService::new(config.clone(), Some(key.clone()))
                    .context("Failed to create embedding client")?;
                info!(model = %config.model, "embedding provider configured");
                Some(Arc::new(http))
            }
            _ => {
                info!("embedding provider not configured, using keyword search");
                None
            }
        };
        Ok(Arc::new(EmbeddingAdapter::new(
            self.projections.clone(),
            service,
            config,
        )))
    }

    /// Summarizer when enabled and a key is present.
    pub fn summarizer(&self) -> Result<Option<Arc<dyn Summarizer>>> {
        let summarizer = HttpSummarizer::from_settings(
            &self.settings.context.summarizer,
            self.keys.summarizer.clone(),
        )
        .context("Failed to create summarizer client")?;
        Ok(summarizer.map(|s| Arc::new(s) as Arc<dyn Summarizer>))
    }

    /// Context engine with whatever providers are available.
    pub fn context_engine(&self) -> Result<ContextEngine> {
        let mut engine = ContextEngine::new(self.projections.clone())
            .with_embeddings(self.embedding_adapter()?)
            .with_semantic_boost(self.settings.context.semantic_boost);
        if let Some(summarizer) = self.summarizer()? {
            engine = engine.with_summarizer(summarizer);
        }
        Ok(engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(keys: ApiKeys) -> (tempfile::TempDir, App) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brief.db");
        let app = App::open(path.to_str().unwrap(), BriefSettings::default(), keys).unwrap();
        (dir, app)
    }

    #[test]
    fn without_keys_providers_are_absent() {
        let (_dir, app) = app(ApiKeys::default());
        assert!(!app.embedding_adapter().unwrap().is_ready());
        assert!(app.summarizer().unwrap().is_none());
    }

    #[test]
    fn keys_enable_providers() {
        let (_dir, app) = app(ApiKeys {
            embedding: Some("emb".into()),
            summarizer: Some("sum".into()),
        });
        assert!(app.embedding_adapter().unwrap().is_ready());
        assert!(app.summarizer().unwrap().is_some());
    }

    #[test]
    fn disabled_embeddings_ignore_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brief.db");
        let mut settings = BriefSettings::default();
        settings.embeddings.enabled = false;
        let app = App::open(
            path.to_str().unwrap(),
            settings,
            ApiKeys {
                embedding: Some("emb".into()),
                summarizer: None,
            },
        )
        .unwrap();
        assert!(!app.embedding_adapter().unwrap().is_ready());
    }

    #[test]
    fn projector_uses_settings() {
        let (_dir, app) = app(ApiKeys::default());
        assert_eq!(
            app.projector().config().consumer_id,
            app.settings.projector.consumer_id
        );
    }
}
