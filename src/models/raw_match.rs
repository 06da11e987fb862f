// file: src/models/raw_match.rs
// description: Nearest-neighbor match exactly as returned by the vector index
// reference: https://docs.pinecone.io/reference/api/data-plane/query

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMatch {
    /// Vector id inside the index
    pub id: String,

    /// Similarity score (higher is more similar, scale depends on the index metric).
    /// The query API may omit it; a missing score reads as 0.0.
    #[serde(default)]
    pub score: f32,

    /// Metadata stored alongside the vector, if any was returned
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

impl RawMatch {
    #[cfg(test)]
    pub(crate) fn new(id: impl Into<String>, score: f32, metadata: Option<Map<String, Value>>) -> Self {
        Self {
            id: id.into(),
            score,
            metadata,
        }
    }

    /// True when the match carries at least one metadata entry.
    pub fn has_metadata(&self) -> bool {
        self.metadata.as_ref().is_some_and(|m| !m.is_empty())
    }
}
