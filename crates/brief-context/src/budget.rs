//! Token estimation and greedy budget fitting.
//!
//! ## Algorithm
//!
//! 1. If every candidate fits in the full budget, keep them all.
//! 2. Otherwise walk the ranked list, keeping items while the running total
//!    stays within [`FIT_RATIO`] of the budget.
//! 3. A non-fitting item scoring above [`COMPRESSION_THRESHOLD`] is queued
//!    for compression; anything else is dropped. Scanning continues, so a
//!    smaller item further down can still fit.

use crate::constants::{CHARS_PER_TOKEN, COMPRESSION_THRESHOLD, FIT_RATIO};
use crate::types::ContextPreviewItem;

/// Estimated tokens for `text`: characters divided by four, rounded up.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// Tokens available to ranked items for a budget.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn fit_limit(token_budget: usize) -> usize {
    (token_budget as f64 * FIT_RATIO).floor() as usize
}

/// Result of fitting a ranked list into a budget.
#[derive(Clone, Debug, Default)]
pub struct FitOutcome {
    /// Items kept, in ranked order.
    pub included: Vec<ContextPreviewItem>,
    /// High-scoring overflow, in ranked order.
    pub queued: Vec<ContextPreviewItem>,
    /// Overflow discarded outright.
    pub dropped: usize,
    /// Estimated tokens of `included`.
    pub used_tokens: usize,
}

/// Fit `ranked` (already sorted by descending score) into `token_budget`.
pub fn fit_to_budget(ranked: Vec<ContextPreviewItem>, token_budget: usize) -> FitOutcome {
    let total: usize = ranked.iter().map(|i| i.tokens).sum();
    if total <= token_budget {
        return FitOutcome {
            included: ranked,
            used_tokens: total,
            ..FitOutcome::default()
        };
    }

    let limit = fit_limit(token_budget);
    let mut outcome = FitOutcome::default();
    for item in ranked {
        if outcome.used_tokens + item.tokens <= limit {
            outcome.used_tokens += item.tokens;
            outcome.included.push(item);
        } else if item.score > COMPRESSION_THRESHOLD {
            outcome.queued.push(item);
        } else {
            outcome.dropped += 1;
        }
    }
    outcome
}
