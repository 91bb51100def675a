//! Preview output types and Markdown rendering.

use std::fmt::Write as _;

use brief_events::{Block, ContextItem, GitHubEntity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::budget::estimate_tokens;

/// Kind of a preview item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PreviewItemType {
    /// A work block.
    #[serde(rename = "block")]
    Block,
    /// A captured context item.
    #[serde(rename = "context")]
    Context,
    /// A GitHub entity.
    #[serde(rename = "github")]
    GitHub,
    /// Compressed overflow.
    #[serde(rename = "summary")]
    Summary,
}

impl PreviewItemType {
    /// Wire string.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Block => "block",
            Self::Context => "context",
            Self::GitHub => "github",
            Self::Summary => "summary",
        }
    }
}

/// One ranked entry of a preview.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContextPreviewItem {
    /// Entity ID, or `summary` for the compressed item.
    pub id: String,
    /// Item kind.
    #[serde(rename = "type")]
    pub item_type: PreviewItemType,
    /// Block status, context type, or GitHub kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Where the item came from.
    pub source: String,
    /// Title, when the entity has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Body text.
    pub content: String,
    /// Final relevance in `[0, 1]`.
    pub score: f32,
    /// Estimated tokens of title and content.
    pub tokens: usize,
    /// Kind-specific extras.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub metadata: Value,
}

impl ContextPreviewItem {
    /// Build an unscored item, estimating its tokens.
    pub fn new(
        id: impl Into<String>,
        item_type: PreviewItemType,
        source: impl Into<String>,
        title: Option<String>,
        content: impl Into<String>,
    ) -> Self {
        let mut item = Self {
            id: id.into(),
            item_type,
            category: None,
            source: source.into(),
            title,
            content: content.into(),
            score: 0.0,
            tokens: 0,
            metadata: Value::Null,
        };
        item.tokens = estimate_tokens(&item.text());
        item
    }

    /// Item for a block.
    pub fn from_block(block: &Block) -> Self {
        let mut item = Self::new(
            block.id.as_str(),
            PreviewItemType::Block,
            "block",
            Some(block.title.clone()),
            block.content.clone().unwrap_or_default(),
        );
        item.category = Some(block.status.as_str().to_string());
        item.metadata = json!({
            "lane": block.lane,
            "priority": block.priority,
            "progress": block.progress,
        });
        item
    }

    /// Item for a context item.
    pub fn from_context(context: &ContextItem) -> Self {
        let mut item = Self::new(
            context.id.as_str(),
            PreviewItemType::Context,
            context.source.clone(),
            context.title.clone(),
            context.content.clone(),
        );
        item.category = Some(context.context_type.as_str().to_string());
        item
    }

    /// Item for a GitHub entity.
    pub fn from_github(entity: &GitHubEntity) -> Self {
        let mut item = Self::new(
            entity.id.as_str(),
            PreviewItemType::GitHub,
            "github",
            Some(entity.title.clone()),
            entity.url.clone().unwrap_or_default(),
        );
        item.category = Some(entity.provider_type.as_str().to_string());
        item.metadata = json!({
            "provider_id": entity.provider_id,
            "status": entity.status,
        });
        item
    }

    /// Title and content joined the way they are estimated and searched.
    pub fn text(&self) -> String {
        match &self.title {
            Some(title) if !title.is_empty() && !self.content.is_empty() => {
                format!("{title}\n{}", self.content)
            }
            Some(title) if !title.is_empty() => title.clone(),
            _ => self.content.clone(),
        }
    }

    fn label(&self) -> &str {
        match self.title.as_deref() {
            Some(title) if !title.is_empty() => title,
            _ => &self.id,
        }
    }
}

/// Ranked, budget-fitted context for one project.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContextPreview {
    /// Project the preview describes.
    pub project_id: String,
    /// Included items, most relevant first; a summary item, if any, is last.
    pub preview: Vec<ContextPreviewItem>,
    /// One-line status and type counts over all candidates.
    pub summary: String,
    /// Candidates considered before fitting and compression.
    pub total_items: usize,
    /// When the preview was built.
    pub generated_at: DateTime<Utc>,
}

impl ContextPreview {
    /// Estimated tokens of the included entity items, excluding the summary.
    pub fn ranked_tokens(&self) -> usize {
        self.preview
            .iter()
            .filter(|i| i.item_type != PreviewItemType::Summary)
            .map(|i| i.tokens)
            .sum()
    }

    /// The compressed summary item, if one was produced.
    pub fn summary_item(&self) -> Option<&ContextPreviewItem> {
        self.preview
            .last()
            .filter(|i| i.item_type == PreviewItemType::Summary)
    }

    /// Render as a Markdown digest, grouped by kind in ranked order.
    pub fn render(&self) -> String {
        const SECTIONS: [(&str, PreviewItemType); 4] = [
            ("Blocks", PreviewItemType::Block),
            ("Context", PreviewItemType::Context),
            ("GitHub", PreviewItemType::GitHub),
            ("Compressed", PreviewItemType::Summary),
        ];

        let mut out = String::new();
        let _ = writeln!(out, "# Project context: {}", self.project_id);
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", self.summary);

        for (heading, kind) in SECTIONS {
            let mut items = self.preview.iter().filter(|i| i.item_type == kind).peekable();
            if items.peek().is_none() {
                continue;
            }
            let _ = writeln!(out, "\n## {heading}");
            for item in items {
                match &item.category {
                    Some(category) => {
                        let _ = writeln!(out, "\n### {} [{category}]", item.label());
                    }
                    None => {
                        let _ = writeln!(out, "\n### {}", item.label());
                    }
                }
                let content = item.content.trim_end();
                if !content.is_empty() {
                    let _ = writeln!(out, "{content}");
                }
            }
        }
        out
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
