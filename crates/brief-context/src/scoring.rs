//! Deterministic relevance scoring.
//!
//! Base scores depend only on the entity and the current time. A query adds a
//! textual boost and, when embeddings are available, a semantic boost. Every
//! score is clamped into `[0, 1]`.

use brief_events::{Block, BlockStatus, ContextItem, ContextType, GitHubEntity, Lane, Priority, ProviderType};
use chrono::{DateTime, Duration, Utc};

use crate::constants::{
    BLOCK_BASE_SCORE, BLOCK_RECENCY, CONTEXT_BASE_SCORE, CONTEXT_RECENCY, GITHUB_BASE_SCORE,
    GITHUB_OPEN_BONUS, GITHUB_RECENCY, MIN_TERM_CHARS, MULTI_TERM_FACTOR, SEMANTIC_FLOOR,
    TERM_BOOST_CAP, TERM_HIT_BOOST, TEXTUAL_BOOST_CAP,
};

fn clamp_score(score: f32) -> f32 {
    score.clamp(0.0, 1.0)
}

/// Bonus of the first tier whose age limit `at` falls under.
///
/// Timestamps in the future count as fresh.
fn recency_bonus(now: DateTime<Utc>, at: DateTime<Utc>, tiers: &[(i64, f32)]) -> f32 {
    let age = now.signed_duration_since(at);
    tiers
        .iter()
        .find(|(days, _)| age < Duration::days(*days))
        .map_or(0.0, |(_, bonus)| *bonus)
}

// =============================================================================
// Base Scores
// =============================================================================

/// Base score of a block.
///
/// Recency uses `last_worked_at`, falling back to `updated_at`.
pub fn block_score(block: &Block, now: DateTime<Utc>) -> f32 {
    let status = match block.status {
        BlockStatus::InProgress => 0.3,
        BlockStatus::Blocked => 0.2,
        BlockStatus::NotStarted | BlockStatus::Completed | BlockStatus::Cancelled => 0.0,
    };
    let priority = match block.priority {
        Priority::Urgent => 0.2,
        Priority::High => 0.15,
        Priority::Medium => 0.1,
        Priority::Low => 0.05,
    };
    let lane = match block.lane {
        Lane::Current => 0.2,
        Lane::Next => 0.15,
        Lane::Goals => 0.1,
        Lane::Vision | Lane::Context => 0.05,
    };
    let worked = block.last_worked_at.unwrap_or(block.updated_at);
    let recency = recency_bonus(now, worked, BLOCK_RECENCY);
    clamp_score(BLOCK_BASE_SCORE + status + priority + recency + lane)
}

/// Base score of a context item.
pub fn context_score(item: &ContextItem, now: DateTime<Utc>) -> f32 {
    let kind = match item.context_type {
        ContextType::Decision => 0.25,
        ContextType::Blocker => 0.2,
        ContextType::Insight | ContextType::Solution => 0.15,
        ContextType::Reference => 0.1,
        ContextType::Note => 0.05,
    };
    let recency = recency_bonus(now, item.created_at, CONTEXT_RECENCY);
    clamp_score(CONTEXT_BASE_SCORE + kind + recency)
}

/// Base score of a GitHub entity.
pub fn github_score(entity: &GitHubEntity, now: DateTime<Utc>) -> f32 {
    let kind = match entity.provider_type {
        ProviderType::Pr => 0.2,
        ProviderType::Issue => 0.15,
        ProviderType::Commit => 0.1,
        ProviderType::Release | ProviderType::PrComment => 0.0,
    };
    let open = if entity.is_open() { GITHUB_OPEN_BONUS } else { 0.0 };
    let recency = recency_bonus(now, entity.updated_at, GITHUB_RECENCY);
    clamp_score(GITHUB_BASE_SCORE + kind + open + recency)
}

// =============================================================================
// Query Boosts
// =============================================================================

/// Distinct lowercase terms of at least two characters, in query order.
pub fn query_terms(query: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for raw in query.split(|c: char| !c.is_alphanumeric()) {
        let term = raw.to_lowercase();
        if term.chars().count() >= MIN_TERM_CHARS && !terms.contains(&term) {
            terms.push(term);
        }
    }
    terms
}

/// Boost for query terms occurring in `text`.
///
/// Each occurrence adds [`TERM_HIT_BOOST`], capped per term. Two or more
/// matching terms multiply the sum by [`MULTI_TERM_FACTOR`]; the total is
/// capped at [`TEXTUAL_BOOST_CAP`].
#[allow(clippy::cast_precision_loss)]
pub fn textual_boost(terms: &[String], text: &str) -> f32 {
    if terms.is_empty() {
        return 0.0;
    }
    let haystack = text.to_lowercase();
    let mut boost = 0.0;
    let mut matched = 0;
    for term in terms {
        let hits = haystack.matches(term.as_str()).count();
        if hits == 0 {
            continue;
        }
        matched += 1;
        boost += (TERM_HIT_BOOST * hits as f32).min(TERM_BOOST_CAP);
    }
    if matched >= 2 {
        boost *= MULTI_TERM_FACTOR;
    }
    boost.min(TEXTUAL_BOOST_CAP)
}

/// Boost for cosine similarity above the floor.
pub fn semantic_boost(similarity: f32) -> f32 {
    (similarity - SEMANTIC_FLOOR).max(0.0)
}

/// Combine base score and boosts.
pub fn final_score(base: f32, textual: f32, semantic: f32) -> f32 {
    clamp_score(base + textual + semantic)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
