//! One-line digest of what a project contains.

use std::collections::BTreeMap;

use crate::types::{ContextPreviewItem, PreviewItemType};

/// Per-kind category counts over a candidate set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SummaryCounts {
    blocks: BTreeMap<String, usize>,
    context: BTreeMap<String, usize>,
    github: BTreeMap<String, usize>,
}

impl SummaryCounts {
    /// Count categories of `items`. Summary items are ignored.
    pub fn from_items(items: &[ContextPreviewItem]) -> Self {
        let mut counts = Self::default();
        for item in items {
            let bucket = match item.item_type {
                PreviewItemType::Block => &mut counts.blocks,
                PreviewItemType::Context => &mut counts.context,
                PreviewItemType::GitHub => &mut counts.github,
                PreviewItemType::Summary => continue,
            };
            let category = item.category.clone().unwrap_or_else(|| "other".to_string());
            *bucket.entry(category).or_insert(0) += 1;
        }
        counts
    }

    /// Items counted.
    pub fn total(&self) -> usize {
        [&self.blocks, &self.context, &self.github]
            .iter()
            .map(|m| m.values().sum::<usize>())
            .sum()
    }

    /// Render the digest, noting how many of the counted items are shown.
    pub fn line(&self, shown: usize) -> String {
        let groups: Vec<String> = [
            group("block", "blocks", &self.blocks),
            group("context item", "context items", &self.context),
            group("GitHub item", "GitHub items", &self.github),
        ]
        .into_iter()
        .flatten()
        .collect();
        if groups.is_empty() {
            return "Nothing recorded for this project yet.".to_string();
        }
        format!("{}. Showing {shown} of {}.", groups.join("; "), self.total())
    }
}

fn group(singular: &str, plural: &str, counts: &BTreeMap<String, usize>) -> Option<String> {
    let n: usize = counts.values().sum();
    if n == 0 {
        return None;
    }
    let detail = counts
        .iter()
        .map(|(category, count)| format!("{count} {category}"))
        .collect::<Vec<_>>()
        .join(", ");
    let noun = if n == 1 { singular } else { plural };
    Some(format!("{n} {noun} ({detail})"))
}
