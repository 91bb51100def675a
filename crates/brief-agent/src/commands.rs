//! Subcommand implementations. Each returns the text to print.

use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};
use brief_context::PreviewOptions;
use brief_core::ProjectId;
use brief_embeddings::{EmbeddingError, SearchOptions};
use brief_events::{AppendOptions, EventType};
use brief_projector::{BatchStats, Projector};
use clap::ValueEnum;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::services::{App, EMBEDDING_API_KEY_ENV};

/// Preview output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON.
    #[default]
    Json,
    /// Markdown digest.
    Markdown,
}

/// How the projector should run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProjectMode {
    /// Poll until cancelled.
    #[default]
    Follow,
    /// Apply everything pending, then stop.
    Once,
    /// Wipe projections and replay the whole log.
    Rebuild,
}

/// Run the projector for `consumer` (settings default when `None`).
pub async fn project(
    app: &App,
    consumer: Option<&str>,
    mode: ProjectMode,
    cancel: CancellationToken,
) -> Result<BatchStats> {
    let projector = app.projector().with_cancel_token(cancel);
    let consumer = consumer.map_or_else(|| projector.config().consumer_id.clone(), str::to_owned);

    let stats = match mode {
        ProjectMode::Follow => {
            let poll = projector.config().poll_interval;
            info!(consumer_id = %consumer, ?poll, "projector following event log");
            projector.run(&consumer, poll).await
        }
        ProjectMode::Once => {
            tokio::task::spawn_blocking(move || drain(&projector, &consumer))
                .await
                .context("projector task panicked")??
        }
        ProjectMode::Rebuild => tokio::task::spawn_blocking(move || projector.rebuild(&consumer))
            .await
            .context("projector task panicked")?
            .context("rebuild failed")?,
    };
    info!(
        fetched = stats.fetched,
        applied = stats.applied,
        ignored = stats.ignored,
        failed = stats.failed,
        "projector finished"
    );
    Ok(stats)
}

/// Process batches until the log is drained or the projector is stopped.
pub fn drain(projector: &Projector, consumer: &str) -> Result<BatchStats> {
    let mut total = BatchStats::default();
    loop {
        let stats = projector
            .process_batch(consumer)
            .context("projection cycle failed")?;
        let fetched = stats.fetched;
        total.merge(stats);
        if fetched < projector.config().batch_size || projector.is_stopped() {
            return Ok(total);
        }
    }
}

/// Build a preview and format it.
pub async fn preview(
    app: &App,
    project_id: &str,
    options: &PreviewOptions,
    format: OutputFormat,
) -> Result<String> {
    let engine = app.context_engine()?;
    let preview = engine
        .build_preview(project_id, options)
        .await
        .with_context(|| format!("Failed to build preview for {project_id}"))?;
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&preview)?),
        OutputFormat::Markdown => Ok(preview.render()),
    }
}

/// Semantic (or keyword) search over a project.
pub async fn search(app: &App, project_id: &str, query: &str, limit: Option<usize>) -> Result<String> {
    let adapter = app.embedding_adapter()?;
    let mut opts = SearchOptions::from_config(adapter.config());
    if let Some(limit) = limit {
        opts.limit = limit;
    }
    let hits = adapter
        .semantic_search(project_id, query, &opts)
        .await
        .context("search failed")?;
    Ok(serde_json::to_string_pretty(&hits)?)
}

/// Embed every block and context item that lacks a vector.
pub async fn backfill(app: &App) -> Result<String> {
    let adapter = app.embedding_adapter()?;
    match adapter.backfill().await {
        Ok(report) => Ok(serde_json::to_string_pretty(&report)?),
        Err(EmbeddingError::NotReady) => {
            bail!("embedding provider not configured (enable embeddings and set {EMBEDDING_API_KEY_ENV})")
        }
        Err(e) => Err(e).context("backfill failed"),
    }
}

/// Append one event to the log.
pub fn append(
    app: &App,
    project_id: &str,
    event_type: &str,
    payload: &str,
    actor: Option<&str>,
) -> Result<String> {
    let event_type = EventType::from_str(event_type).map_err(|e| anyhow!(e))?;
    let payload: Value = serde_json::from_str(payload).context("payload is not valid JSON")?;
    let project_id = ProjectId::from(project_id);
    let event = app
        .events
        .append(&AppendOptions {
            project_id: &project_id,
            event_type,
            actor_id: actor,
            payload,
            created_at: None,
        })
        .context("append failed")?;
    Ok(format!("{} {}", event.id, event.event_type))
}

/// Offset, backlog and dead letters of a consumer.
pub fn status(app: &App, consumer: Option<&str>) -> Result<String> {
    let projector = app.projector();
    let consumer = consumer.unwrap_or(&projector.config().consumer_id);
    let status = projector.status(consumer).context("status failed")?;
    Ok(serde_json::to_string_pretty(&status)?)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
