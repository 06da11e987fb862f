// file: src/analysis/generator.rs
// description: Generates comparative investment analysis for matched companies
// reference: prompt-based analysis over chat completion services

use super::chat::{ChatCompletion, OpenAiChatClient};
use super::prompt::{AnalysisPrompt, SYSTEM_PROMPT};
use crate::config::AnalysisConfig;
use crate::error::{PipelineError, Result};
use crate::models::CompanyRecord;
use std::sync::Arc;
use tracing::{info, warn};

pub const ANALYSIS_ERROR_PREFIX: &str = "Error generating analysis: ";

#[derive(Clone)]
pub struct AnalysisGenerator {
    chat: Arc<dyn ChatCompletion>,
    reference_exchange: String,
}

impl AnalysisGenerator {
    pub fn new(chat: Arc<dyn ChatCompletion>, reference_exchange: impl Into<String>) -> Self {
        Self {
            chat,
            reference_exchange: reference_exchange.into(),
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(
            Arc::new(OpenAiChatClient::new(config)),
            config.reference_exchange.clone(),
        )
    }

    /// Failure-preserving variant for callers that need the structured error.
    pub async fn try_analyze(&self, query: &str, companies: &[CompanyRecord]) -> Result<String> {
        if companies.is_empty() {
            return Err(PipelineError::Analysis(
                "no companies to analyze".to_string(),
            ));
        }

        let prompt = AnalysisPrompt::new(query, companies, &self.reference_exchange);
        info!(
            "Generating analysis for {} companies with {}",
            companies.len(),
            self.chat.model()
        );

        self.chat.complete(SYSTEM_PROMPT, &prompt.render()).await
    }

    /// Always yields displayable text; failures become `"Error generating analysis: <cause>"`.
    ///
    /// `companies` must be non-empty.
    pub async fn analyze(&self, query: &str, companies: &[CompanyRecord]) -> String {
        debug_assert!(!companies.is_empty(), "analyze requires at least one company");

        match self.try_analyze(query, companies).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Analysis generation failed: {}", e);
                format!("{}{}", ANALYSIS_ERROR_PREFIX, e)
            }
        }
    }
}
