//! Scoring weights, budget ratios, and compression limits.

// =============================================================================
// Token Estimation
// =============================================================================

/// Characters per token for estimation.
pub const CHARS_PER_TOKEN: usize = 4;

// =============================================================================
// Budget Fitting
// =============================================================================

/// Share of the token budget available to ranked items.
///
/// The remainder is held back for a compressed summary of the overflow.
pub const FIT_RATIO: f64 = 0.8;

/// Overflow items scoring strictly above this are queued for compression.
pub const COMPRESSION_THRESHOLD: f32 = 0.7;

// =============================================================================
// Compression
// =============================================================================

/// Summary target as a share of the budget left after fitting.
pub const SUMMARY_TARGET_RATIO: f64 = 0.8;

/// Queued items merged into the truncation fallback.
pub const TRUNCATED_ITEM_COUNT: usize = 3;

/// Characters kept per item in the truncation fallback.
pub const TRUNCATED_ITEM_CHARS: usize = 100;

/// ID of the synthesized summary item.
pub const SUMMARY_ITEM_ID: &str = "summary";

/// Source of a summary written by the text-generation provider.
pub const SOURCE_AI_COMPRESSED: &str = "ai_compressed";

/// Source of the truncation fallback summary.
pub const SOURCE_TRUNCATED: &str = "truncated";

// =============================================================================
// Base Scores
// =============================================================================

/// Base score of a block before status, priority, recency, and lane.
pub const BLOCK_BASE_SCORE: f32 = 0.5;

/// Base score of a context item before type and recency.
pub const CONTEXT_BASE_SCORE: f32 = 0.4;

/// Base score of a GitHub entity before kind, state, and recency.
pub const GITHUB_BASE_SCORE: f32 = 0.3;

/// Bonus for a GitHub entity that is open or active.
pub const GITHUB_OPEN_BONUS: f32 = 0.1;

/// Block recency tiers: `(max age in days, bonus)`, first match wins.
pub const BLOCK_RECENCY: &[(i64, f32)] = &[(1, 0.2), (7, 0.1)];

/// Context item recency tiers.
pub const CONTEXT_RECENCY: &[(i64, f32)] = &[(1, 0.15), (7, 0.1), (30, 0.05)];

/// GitHub entity recency tiers.
pub const GITHUB_RECENCY: &[(i64, f32)] = &[(1, 0.1), (7, 0.05)];

// =============================================================================
// Query Boosts
// =============================================================================

/// Query terms shorter than this are ignored.
pub const MIN_TERM_CHARS: usize = 2;

/// Boost per occurrence of a query term.
pub const TERM_HIT_BOOST: f32 = 0.1;

/// Maximum boost contributed by one term.
pub const TERM_BOOST_CAP: f32 = 0.2;

/// Multiplier applied when two or more distinct terms match.
pub const MULTI_TERM_FACTOR: f32 = 1.5;

/// Maximum total textual boost.
pub const TEXTUAL_BOOST_CAP: f32 = 0.5;

/// Cosine similarity below this adds nothing.
pub const SEMANTIC_FLOOR: f32 = 0.5;
