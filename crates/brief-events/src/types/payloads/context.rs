//! `context.*` payloads.

use brief_core::{BlockId, ContextId};
use serde::{Deserialize, Serialize};

use crate::types::ContextType;

/// Payload for `context.captured`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextCapturedPayload {
    /// Context item to create.
    pub context_id: Option<ContextId>,
    /// Kind of context.
    #[serde(rename = "type")]
    pub context_type: Option<ContextType>,
    /// Optional title.
    pub title: Option<String>,
    /// Body text.
    pub content: Option<String>,
    /// Where the context came from (e.g. `"claude"`, `"manual"`).
    pub source: Option<String>,
    /// Who captured it.
    pub author_id: Option<String>,
    /// Blocks to link the new item to.
    pub block_ids: Vec<BlockId>,
}

/// Payload for `context.linked`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextLinkedPayload {
    /// Context item.
    pub context_id: Option<ContextId>,
    /// Block it relates to.
    pub block_id: Option<BlockId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn captured_reads_type_field() {
        let p: ContextCapturedPayload = serde_json::from_value(json!({
            "context_id": "ctx_1",
            "type": "decision",
            "content": "Use SQLite",
            "block_ids": ["blk_1", "blk_2"]
        }))
        .unwrap();
        assert_eq!(p.context_type, Some(ContextType::Decision));
        assert_eq!(p.block_ids.len(), 2);
    }

    #[test]
    fn captured_defaults_empty_links() {
        let p: ContextCapturedPayload =
            serde_json::from_value(json!({"context_id": "ctx_1"})).unwrap();
        assert!(p.block_ids.is_empty());
    }
}
