// file: src/pipeline/outcome.rs
// description: pipeline states, terminal status signals and run output
// reference: search pipeline state machine

use crate::models::CompanyRecord;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Idle,
    Embedding,
    Retrieving,
    Normalizing,
    Analyzing,
    Done,
}

impl PipelineStage {
    pub fn label(&self) -> &'static str {
        match self {
            PipelineStage::Idle => "Waiting for query",
            PipelineStage::Embedding => "Embedding query...",
            PipelineStage::Retrieving => "Searching, please wait...",
            PipelineStage::Normalizing => "Preparing results...",
            PipelineStage::Analyzing => "Generating insights...",
            PipelineStage::Done => "Done",
        }
    }
}

/// How a run ended. Only `Success` carries analysis text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum StatusSignal {
    Success,
    EmptyQuery,
    NoMatches,
    EmbeddingFailed(String),
    Unavailable(String),
}

impl StatusSignal {
    /// Plain-text message for the user, if the status needs one.
    pub fn message(&self) -> Option<String> {
        match self {
            StatusSignal::Success => None,
            StatusSignal::EmptyQuery => Some("Please enter a search query.".to_string()),
            StatusSignal::NoMatches => Some("No matching companies found.".to_string()),
            StatusSignal::EmbeddingFailed(cause) => {
                Some(format!("Could not search for this query: {}", cause))
            }
            StatusSignal::Unavailable(cause) => {
                Some(format!("Search is unavailable: {}", cause))
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunStats {
    pub embedding_ms: u64,
    pub retrieval_ms: u64,
    pub analysis_ms: u64,
    pub total_ms: u64,
    pub matches_retrieved: usize,
    pub records_kept: usize,
    pub analysis_invoked: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub query: String,
    pub companies: Vec<CompanyRecord>,
    pub analysis: Option<String>,
    pub status: StatusSignal,
    /// Set when the index query failed and the run degraded to zero matches.
    pub retrieval_error: Option<String>,
    pub stats: RunStats,
}
