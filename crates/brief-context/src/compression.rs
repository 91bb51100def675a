//! Compression of queued overflow into one summary item.

use serde_json::json;
use tracing::{debug, warn};

use crate::constants::{
    SOURCE_AI_COMPRESSED, SOURCE_TRUNCATED, SUMMARY_ITEM_ID, SUMMARY_TARGET_RATIO,
    TRUNCATED_ITEM_CHARS, TRUNCATED_ITEM_COUNT,
};
use crate::summarizer::{Summarizer, SummaryRequest};
use crate::types::{ContextPreviewItem, PreviewItemType};

/// Summary target for the budget left after fitting.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn summary_target(remaining_tokens: usize) -> usize {
    ((remaining_tokens as f64 * SUMMARY_TARGET_RATIO).floor() as usize).max(1)
}

/// Compress `queued` into one summary item.
///
/// Without a summarizer the queue is dropped and `None` is returned. A
/// summarizer failure falls back to [`truncated_summary`].
pub async fn compress(
    summarizer: Option<&dyn Summarizer>,
    queued: &[ContextPreviewItem],
    remaining_tokens: usize,
    focus_query: Option<&str>,
) -> Option<ContextPreviewItem> {
    if queued.is_empty() {
        return None;
    }
    let Some(summarizer) = summarizer else {
        debug!(dropped = queued.len(), "no summarizer configured, dropping overflow");
        return None;
    };

    let request = SummaryRequest {
        items: queued.to_vec(),
        target_tokens: summary_target(remaining_tokens),
        focus_query: focus_query.map(str::to_owned),
    };
    match summarizer.summarize(&request).await {
        Ok(text) if !text.trim().is_empty() => {
            debug!(items = queued.len(), "overflow compressed");
            Some(summary_item(SOURCE_AI_COMPRESSED, text.trim().to_string(), queued))
        }
        Ok(_) => {
            warn!(items = queued.len(), "summarizer returned empty text, truncating");
            Some(truncated_summary(queued))
        }
        Err(error) => {
            warn!(items = queued.len(), %error, "summarizer failed, truncating");
            Some(truncated_summary(queued))
        }
    }
}

/// Merge the top queued items, each cut to a short snippet.
pub fn truncated_summary(queued: &[ContextPreviewItem]) -> ContextPreviewItem {
    let lines: Vec<String> = queued
        .iter()
        .take(TRUNCATED_ITEM_COUNT)
        .map(|item| {
            let label = item.title.as_deref().filter(|t| !t.is_empty()).unwrap_or(&item.id);
            format!("- {label}: {}", snippet(&item.content, TRUNCATED_ITEM_CHARS))
        })
        .collect();
    summary_item(SOURCE_TRUNCATED, lines.join("\n"), queued)
}

fn snippet(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}

fn summary_item(source: &str, content: String, queued: &[ContextPreviewItem]) -> ContextPreviewItem {
    let mut item = ContextPreviewItem::new(
        SUMMARY_ITEM_ID,
        PreviewItemType::Summary,
        source,
        Some(format!("Compressed context ({} items)", queued.len())),
        content,
    );
    item.score = queued.iter().map(|i| i.score).fold(0.0, f32::max);
    item.metadata = json!({
        "compressed_ids": queued.iter().map(|i| i.id.as_str()).collect::<Vec<_>>(),
    });
    item
}

/// Tokens left for a summary after `used_tokens` of `token_budget`.
pub fn remaining_tokens(token_budget: usize, used_tokens: usize) -> usize {
    token_budget.saturating_sub(used_tokens)
}

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use crate::errors::ContextError;
    use crate::summarizer::MockSummarizer;

    fn queued(n: usize, chars: usize) -> Vec<ContextPreviewItem> {
        (0..n)
            .map(|i| {
                let mut item = ContextPreviewItem::new(
                    format!("ctx_{i}"),
                    PreviewItemType::Context,
                    "manual",
                    Some(format!("Item {i}")),
                    "y".repeat(chars),
                );
                item.score = 0.9 - 0.01 * i as f32;
                item
            })
            .collect()
    }

    #[test]
    fn target_is_share_of_remaining() {
        assert_eq!(summary_target(600), 480);
        assert_eq!(summary_target(0), 1);
    }

    #[test]
    fn remaining_never_underflows() {
        assert_eq!(remaining_tokens(1000, 800), 200);
        assert_eq!(remaining_tokens(1000, 1200), 0);
    }

    #[test]
    fn truncation_keeps_top_three_snippets() {
        let item = truncated_summary(&queued(5, 400));
        assert_eq!(item.source, SOURCE_TRUNCATED);
        assert_eq!(item.item_type, PreviewItemType::Summary);
        let lines: Vec<&str> = item.content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("- Item 0: "));
        assert!(lines[0].ends_with("..."));
        assert_eq!(lines[0].len(), "- Item 0: ".len() + 100 + 3);
        assert_eq!(item.metadata["compressed_ids"].as_array().unwrap().len(), 5);
    }

    #[test]
    fn short_content_is_not_marked_truncated() {
        let item = truncated_summary(&queued(1, 20));
        assert_eq!(item.content, format!("- Item 0: {}", "y".repeat(20)));
    }

    #[tokio::test]
    async fn nothing_queued_yields_nothing() {
        let mut mock = MockSummarizer::new();
        mock.expect_summarize().never();
        assert!(compress(Some(&mock), &[], 500, None).await.is_none());
    }

    #[tokio::test]
    async fn without_summarizer_queue_is_dropped() {
        assert!(compress(None, &queued(3, 40), 500, None).await.is_none());
    }

    #[tokio::test]
    async fn summarizer_output_becomes_ai_item() {
        let mut mock = MockSummarizer::new();
        mock.expect_summarize()
            .withf(|req| {
                req.items.len() == 2
                    && req.target_tokens == 480
                    && req.focus_query.as_deref() == Some("auth")
            })
            .times(1)
            .returning(|_| Ok("Two decisions about auth.".into()));

        let item = compress(Some(&mock), &queued(2, 40), 600, Some("auth"))
            .await
            .unwrap();
        assert_eq!(item.source, SOURCE_AI_COMPRESSED);
        assert_eq!(item.id, SUMMARY_ITEM_ID);
        assert_eq!(item.content, "Two decisions about auth.");
        assert!((item.score - 0.9).abs() < 1e-6);
    }

    #[tokio::test]
    async fn summarizer_failure_falls_back_to_truncation() {
        let mut mock = MockSummarizer::new();
        mock.expect_summarize().times(1).returning(|_| {
            Err(ContextError::Api {
                status: 500,
                message: "boom".into(),
            })
        });

        let item = compress(Some(&mock), &queued(4, 40), 600, None).await.unwrap();
        assert_eq!(item.source, SOURCE_TRUNCATED);
        assert_eq!(item.content.lines().count(), 3);
    }

    #[tokio::test]
    async fn blank_summary_falls_back_to_truncation() {
        let mut mock = MockSummarizer::new();
        mock.expect_summarize().returning(|_| Ok("   ".into()));
        let item = compress(Some(&mock), &queued(1, 40), 600, None).await.unwrap();
        assert_eq!(item.source, SOURCE_TRUNCATED);
    }
}
