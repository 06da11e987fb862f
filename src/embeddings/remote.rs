// file: src/embeddings/remote.rs
// description: OpenAI-compatible embeddings endpoint client (text-embeddings-inference, vLLM, OpenAI)
// reference: https://huggingface.co/docs/text-embeddings-inference

use super::EmbeddingProvider;
use crate::config::EmbeddingConfig;
use crate::error::{PipelineError, Result};
use crate::utils::Validator;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Sent once at construction to confirm the model is loaded and learn its dimension.
const MODEL_PROBE_TEXT: &str = "model warmup";

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: Vec<&'a str>,
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

pub struct RemoteEmbeddingClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    dimension: usize,
}

impl RemoteEmbeddingClient {
    pub async fn connect(config: &EmbeddingConfig) -> Result<Self> {
        info!(
            "Loading embedding model {} from {}",
            config.model, config.endpoint
        );

        let mut provider = Self {
            client: Client::new(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            model: config.model.clone(),
            dimension: 0,
        };

        let probe = provider
            .request_embedding(MODEL_PROBE_TEXT)
            .await
            .map_err(|cause| {
                PipelineError::Initialization(format!(
                    "Embedding model {} is unavailable: {}",
                    provider.model, cause
                ))
            })?;

        if probe.is_empty() {
            return Err(PipelineError::Initialization(format!(
                "Embedding model {} returned an empty vector",
                provider.model
            )));
        }

        provider.dimension = probe.len();
        info!(
            "Embedding model {} ready ({} dimensions)",
            provider.model, provider.dimension
        );

        Ok(provider)
    }

    async fn request_embedding(&self, text: &str) -> std::result::Result<Vec<f32>, String> {
        let url = format!("{}/embeddings", self.endpoint);

        let request = EmbeddingRequest {
            input: vec![text],
            model: &self.model,
        };

        debug!("Requesting embedding for {} chars", text.len());

        let mut builder = self.client.post(&url).json(&request);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| format!("Failed to send embedding request: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(format!(
                "Embedding request failed with status {}: {}",
                status, error_text
            ));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse embedding response: {}", e))?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|data| data.embedding)
            .ok_or_else(|| "No embedding data returned".to_string())
    }
}

#[async_trait]
impl EmbeddingProvider for RemoteEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embedding = self
            .request_embedding(text)
            .await
            .map_err(|cause| PipelineError::embedding(text, cause))?;

        Validator::validate_dimension(self.dimension, embedding.len())
            .map_err(|e| PipelineError::embedding(text, e.to_string()))?;

        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
