//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase", default)]`, so a settings
//! file may contain any subset of fields and the rest fall back to the
//! production defaults below.

mod context;
mod embeddings;
mod projector;

pub use context::*;
pub use embeddings::*;
pub use projector::*;

use serde::{Deserialize, Serialize};

/// Root settings type.
///
/// # JSON Format
///
/// ```json
/// {
///   "database": { "path": "/var/lib/brief/brief.db" },
///   "projector": { "pollIntervalMs": 500, "failurePolicy": "skip" }
/// }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BriefSettings {
    /// Settings schema version.
    pub version: String,
    /// Event/projection database.
    pub database: DatabaseSettings,
    /// Event projector loop.
    pub projector: ProjectorSettings,
    /// Embedding provider, cache and semantic search.
    pub embeddings: EmbeddingSettings,
    /// Context ranking and compression.
    pub context: ContextSettings,
    /// Logging output.
    pub logging: LoggingSettings,
}

impl Default for BriefSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            database: DatabaseSettings::default(),
            projector: ProjectorSettings::default(),
            embeddings: EmbeddingSettings::default(),
            context: ContextSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

/// `SQLite` database location and pool sizing.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatabaseSettings {
    /// Database file path (may start with `~/`).
    pub path: String,
    /// Maximum pooled connections.
    pub pool_size: u32,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: "~/.brief/brief.db".to_string(),
            pool_size: 16,
            busy_timeout_ms: 30_000,
        }
    }
}

impl DatabaseSettings {
    /// Resolve the database path, expanding `~/` to the home directory.
    pub fn resolved_path(&self) -> String {
        if let Some(rest) = self.path.strip_prefix("~/") {
            if let Ok(home) = std::env::var("HOME") {
                return format!("{home}/{rest}");
            }
        }
        self.path.clone()
    }
}

/// Logging output settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Emit one JSON object per line instead of compact text.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
