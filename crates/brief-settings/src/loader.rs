//! Settings loading with deep merge and environment overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`BriefSettings::default()`]
//! 2. If `~/.brief/settings.json` exists, deep-merge user values over defaults
//! 3. Apply `BRIEF_*` environment overrides (highest priority)
//!
//! Overrides are applied through a lookup function rather than reading the
//! process environment directly, so tests can feed a map.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{Result, SettingsError};
use crate::types::{BriefSettings, FailurePolicy};

/// Resolve the path to the settings file (`~/.brief/settings.json`).
///
/// `BRIEF_SETTINGS` replaces the whole path when set.
pub fn settings_path() -> PathBuf {
    if let Some(explicit) = std::env::var("BRIEF_SETTINGS").ok().filter(|v| !v.is_empty()) {
        return PathBuf::from(explicit);
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".brief").join("settings.json")
}

/// Load settings from the default path with environment overrides.
pub fn load_settings() -> Result<BriefSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with environment overrides.
///
/// A missing file yields defaults. Invalid JSON is an error.
pub fn load_settings_from_path(path: &Path) -> Result<BriefSettings> {
    let mut settings = load_file(path)?;
    apply_overrides(&mut settings, |key| std::env::var(key).ok());
    validate(&settings)?;
    Ok(settings)
}

fn load_file(path: &Path) -> Result<BriefSettings> {
    let defaults = serde_json::to_value(BriefSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `BRIEF_*` overrides read through `lookup`.
///
/// Invalid values are logged and ignored, leaving the file/default value.
pub fn apply_overrides(settings: &mut BriefSettings, lookup: impl Fn(&str) -> Option<String>) {
    let env = Lookup(&lookup);

    // ── Database ────────────────────────────────────────────────────
    if let Some(v) = env.string("BRIEF_DB_PATH") {
        settings.database.path = v;
    }
    if let Some(v) = env.u64("BRIEF_DB_POOL_SIZE", 1, 256) {
        settings.database.pool_size = u32::try_from(v).unwrap_or(settings.database.pool_size);
    }

    // ── Projector ───────────────────────────────────────────────────
    if let Some(v) = env.string("BRIEF_CONSUMER_ID") {
        settings.projector.consumer_id = v;
    }
    if let Some(v) = env.u64("BRIEF_POLL_INTERVAL_MS", 10, 3_600_000) {
        settings.projector.poll_interval_ms = v;
    }
    if let Some(v) = env.usize("BRIEF_BATCH_SIZE", 1, 10_000) {
        settings.projector.batch_size = v;
    }
    if let Some(raw) = env.string("BRIEF_FAILURE_POLICY") {
        match raw.parse::<FailurePolicy>() {
            Ok(policy) => settings.projector.failure_policy = policy,
            Err(e) => warn!(key = "BRIEF_FAILURE_POLICY", value = %raw, error = %e, "ignoring"),
        }
    }
    if let Some(v) = env.u64("BRIEF_MAX_ATTEMPTS", 1, 100) {
        settings.projector.max_attempts = u32::try_from(v).unwrap_or(1);
    }

    // ── Embeddings ──────────────────────────────────────────────────
    if let Some(v) = env.bool("BRIEF_EMBEDDINGS_ENABLED") {
        settings.embeddings.enabled = v;
    }
    if let Some(v) = env.string("BRIEF_EMBEDDING_URL") {
        settings.embeddings.base_url = v;
    }
    if let Some(v) = env.string("BRIEF_EMBEDDING_MODEL") {
        settings.embeddings.model = v;
    }
    if let Some(v) = env.usize("BRIEF_EMBEDDING_CACHE_CAPACITY", 1, 1_000_000) {
        settings.embeddings.cache_capacity = v;
    }

    // ── Context ─────────────────────────────────────────────────────
    if let Some(v) = env.usize("BRIEF_TOKEN_BUDGET", 1, 1_000_000) {
        settings.context.default_token_budget = v;
    }
    if let Some(v) = env.bool("BRIEF_SUMMARIZER_ENABLED") {
        settings.context.summarizer.enabled = v;
    }
    if let Some(v) = env.string("BRIEF_SUMMARIZER_MODEL") {
        settings.context.summarizer.model = v;
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = env.string("BRIEF_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = env.bool("BRIEF_LOG_JSON") {
        settings.logging.json = v;
    }
}

fn validate(settings: &BriefSettings) -> Result<()> {
    let checks = [
        ("projector.batchSize", settings.projector.batch_size == 0),
        ("projector.maxAttempts", settings.projector.max_attempts == 0),
        ("database.poolSize", settings.database.pool_size == 0),
    ];
    match checks.into_iter().find(|&(_, zero)| zero) {
        Some((key, _)) => Err(SettingsError::InvalidValue {
            key,
            reason: "must be at least 1",
        }),
        None => Ok(()),
    }
}

// ── Pure parsing functions ──────────────────────────────────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `usize` within a range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Lookup readers (thin wrappers) ──────────────────────────────────────────

struct Lookup<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Lookup<'_, F> {
    fn string(&self, name: &str) -> Option<String> {
        (self.0)(name).filter(|v| !v.is_empty())
    }

    fn bool(&self, name: &str) -> Option<bool> {
        let val = self.string(name)?;
        let result = parse_bool(&val);
        if result.is_none() {
            warn!(key = name, value = %val, "invalid boolean override, ignoring");
        }
        result
    }

    fn u64(&self, name: &str, min: u64, max: u64) -> Option<u64> {
        let val = self.string(name)?;
        let result = parse_u64_range(&val, min, max);
        if result.is_none() {
            warn!(key = name, value = %val, "invalid u64 override, ignoring");
        }
        result
    }

    fn usize(&self, name: &str, min: usize, max: usize) -> Option<usize> {
        let val = self.string(name)?;
        let result = parse_usize_range(&val, min, max);
        if result.is_none() {
            warn!(key = name, value = %val, "invalid usize override, ignoring");
        }
        result
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
