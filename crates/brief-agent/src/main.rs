//! # brief
//!
//! Command-line entry point: runs the event projector, builds context
//! previews, searches and backfills embeddings over one `SQLite` database.

#![deny(unsafe_code)]

mod commands;
mod services;

use std::path::PathBuf;

use anyhow::{Context, Result};
use brief_context::PreviewOptions;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::commands::{OutputFormat, ProjectMode};
use crate::services::{ApiKeys, App};

/// Project context engine.
#[derive(Parser, Debug)]
#[command(name = "brief", about = "Event-sourced project context engine")]
struct Cli {
    /// Path to the `SQLite` database (overrides settings).
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// Path to the settings file (default `~/.brief/settings.json`).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Project events into the read model until Ctrl-C.
    Project {
        /// Drain pending events once and exit.
        #[arg(long, conflicts_with = "rebuild")]
        once: bool,
        /// Clear projections and replay the whole log.
        #[arg(long)]
        rebuild: bool,
        /// Consumer name (overrides settings).
        #[arg(long)]
        consumer: Option<String>,
    },
    /// Print a ranked context preview.
    Preview {
        /// Project to preview.
        project_id: String,
        /// Token budget (overrides settings).
        #[arg(long)]
        budget: Option<usize>,
        /// Focus query.
        #[arg(long)]
        query: Option<String>,
        /// Leave out blocks.
        #[arg(long)]
        no_blocks: bool,
        /// Leave out context items.
        #[arg(long)]
        no_context: bool,
        /// Leave out GitHub entities.
        #[arg(long)]
        no_github: bool,
        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Search blocks and context items.
    Search {
        /// Project to search.
        project_id: String,
        /// Query text.
        query: String,
        /// Maximum hits (overrides settings).
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Generate missing embeddings.
    Backfill,
    /// Append a raw event (development helper).
    Append {
        /// Project the event belongs to.
        project_id: String,
        /// Event type, e.g. `block.created`.
        event_type: String,
        /// JSON object payload.
        #[arg(long, default_value = "{}")]
        payload: String,
        /// Actor ID.
        #[arg(long)]
        actor: Option<String>,
    },
    /// Show projector offset, backlog and dead letters.
    Status {
        /// Consumer name (overrides settings).
        #[arg(long)]
        consumer: Option<String>,
    },
}

impl Cli {
    fn settings_path(&self) -> PathBuf {
        self.settings
            .clone()
            .unwrap_or_else(brief_settings::loader::settings_path)
    }
}

fn preview_options(
    settings: &brief_settings::ContextSettings,
    budget: Option<usize>,
    query: Option<String>,
    excluded: (bool, bool, bool),
) -> PreviewOptions {
    let (no_blocks, no_context, no_github) = excluded;
    let mut options = PreviewOptions::from_settings(settings);
    if let Some(budget) = budget {
        options.token_budget = budget;
    }
    options.query = query;
    options.include_blocks &= !no_blocks;
    options.include_context &= !no_context;
    options.include_github &= !no_github;
    options
}

/// Cancel `token` on Ctrl-C.
fn cancel_on_ctrl_c(token: CancellationToken) {
    drop(tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutting down");
            token.cancel();
        }
    }));
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = brief_settings::loader::load_settings_from_path(&cli.settings_path())
        .context("Failed to load settings")?;
    brief_core::logging::init_subscriber(&settings.logging.level, settings.logging.json);

    let db_path = cli
        .db_path
        .clone()
        .map_or_else(|| settings.database.resolved_path(), |p| p.to_string_lossy().into_owned());
    let app = App::open(&db_path, settings, ApiKeys::from_env())?;

    let output = match cli.command {
        Command::Project {
            once,
            rebuild,
            consumer,
        } => {
            let mode = if rebuild {
                ProjectMode::Rebuild
            } else if once {
                ProjectMode::Once
            } else {
                ProjectMode::Follow
            };
            let cancel = CancellationToken::new();
            cancel_on_ctrl_c(cancel.clone());
            let stats = commands::project(&app, consumer.as_deref(), mode, cancel).await?;
            serde_json::to_string_pretty(&stats)?
        }
        Command::Preview {
            project_id,
            budget,
            query,
            no_blocks,
            no_context,
            no_github,
            format,
        } => {
            let options = preview_options(
                &app.settings.context,
                budget,
                query,
                (no_blocks, no_context, no_github),
            );
            commands::preview(&app, &project_id, &options, format).await?
        }
        Command::Search {
            project_id,
            query,
            limit,
        } => commands::search(&app, &project_id, &query, limit).await?,
        Command::Backfill => commands::backfill(&app).await?,
        Command::Append {
            project_id,
            event_type,
            payload,
            actor,
        } => commands::append(&app, &project_id, &event_type, &payload, actor.as_deref())?,
        Command::Status { consumer } => commands::status(&app, consumer.as_deref())?,
    };

    println!("{output}");
    Ok(())
}
