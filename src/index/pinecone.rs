// file: src/index/pinecone.rs
// description: Pinecone data-plane client with control-plane host discovery
// reference: https://docs.pinecone.io/reference/api/introduction

use super::VectorIndex;
use crate::config::IndexConfig;
use crate::error::{PipelineError, Result};
use crate::models::RawMatch;
use crate::utils::Validator;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct IndexDescription {
    host: String,
    dimension: Option<usize>,
    #[serde(default)]
    spec: Option<IndexSpec>,
}

#[derive(Debug, Deserialize)]
struct IndexSpec {
    pod: Option<PodSpec>,
    serverless: Option<ServerlessSpec>,
}

#[derive(Debug, Deserialize)]
struct PodSpec {
    environment: String,
}

#[derive(Debug, Deserialize)]
struct ServerlessSpec {
    region: String,
}

impl IndexSpec {
    fn location(&self) -> Option<&str> {
        self.pod
            .as_ref()
            .map(|p| p.environment.as_str())
            .or_else(|| self.serverless.as_ref().map(|s| s.region.as_str()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexStats {
    dimension: Option<usize>,
    #[serde(default)]
    total_vector_count: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    namespace: &'a str,
    include_metadata: bool,
    include_values: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<RawMatch>,
}

#[derive(Clone)]
pub struct PineconeClient {
    client: Client,
    api_key: String,
    api_version: String,
    index_name: String,
    host: String,
    dimension: Option<usize>,
}

impl PineconeClient {
    /// Resolves the index host (configured or via the control plane) and
    /// confirms the data plane answers before handing out a handle.
    pub async fn connect(config: &IndexConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                PipelineError::Initialization(
                    "Pinecone API key is not set (PINECONE_API_KEY)".to_string(),
                )
            })?;

        let mut client = Self {
            client: Client::new(),
            api_key,
            api_version: config.api_version.clone(),
            index_name: config.index_name.clone(),
            host: String::new(),
            dimension: None,
        };

        match &config.host {
            Some(host) if !host.trim().is_empty() => {
                client.host = normalize_host(host);
            }
            _ => {
                let description = client
                    .describe_index(&config.control_plane_url)
                    .await
                    .map_err(|e| PipelineError::Initialization(e.to_string()))?;

                if let (Some(expected), Some(actual)) = (
                    config.environment.as_deref(),
                    description.spec.as_ref().and_then(IndexSpec::location),
                ) && expected != actual
                {
                    warn!(
                        "Index {} lives in {}, but PINECONE_ENVIRONMENT is {}",
                        client.index_name, actual, expected
                    );
                }

                client.host = normalize_host(&description.host);
                client.dimension = description.dimension;
            }
        }

        let stats = client
            .describe_index_stats()
            .await
            .map_err(|e| PipelineError::Initialization(e.to_string()))?;
        if client.dimension.is_none() {
            client.dimension = stats.dimension;
        }

        info!(
            "Connected to Pinecone index {} at {} ({} vectors, dimension {:?})",
            client.index_name, client.host, stats.total_vector_count, client.dimension
        );

        Ok(client)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", &self.api_version)
    }

    async fn describe_index(&self, control_plane_url: &str) -> Result<IndexDescription> {
        let url = format!(
            "{}/indexes/{}",
            control_plane_url.trim_end_matches('/'),
            self.index_name
        );
        debug!("Describing index via {}", url);

        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(|e| PipelineError::Query(format!("Pinecone unreachable: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Query(format!(
                "Failed to describe index {} ({}): {}",
                self.index_name, status, body
            )));
        }

        response.json().await.map_err(|e| {
            PipelineError::Query(format!("Invalid index description: {}", e))
        })
    }

    async fn describe_index_stats(&self) -> Result<IndexStats> {
        let url = format!("{}/describe_index_stats", self.host);

        let response = self
            .authorized(self.client.post(&url))
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| PipelineError::Query(format!("Pinecone unreachable: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Query(format!(
                "Failed to read index stats ({}): {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| PipelineError::Query(format!("Invalid index stats: {}", e)))
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

#[async_trait]
impl VectorIndex for PineconeClient {
    async fn search(&self, vector: &[f32], top_k: usize, namespace: &str) -> Result<Vec<RawMatch>> {
        Validator::validate_top_k(top_k).map_err(|e| PipelineError::Query(e.to_string()))?;

        if let Some(dimension) = self.dimension {
            Validator::validate_dimension(dimension, vector.len())
                .map_err(|e| PipelineError::Query(e.to_string()))?;
        }

        info!(
            "Querying index {} (namespace {}, top_k {})",
            self.index_name, namespace, top_k
        );

        let request = QueryRequest {
            vector,
            top_k,
            namespace,
            include_metadata: true,
            include_values: false,
        };

        let response = self
            .authorized(self.client.post(format!("{}/query", self.host)))
            .json(&request)
            .send()
            .await
            .map_err(|e| PipelineError::Query(format!("Failed to send query: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Query(format!(
                "Query failed with status {}: {}",
                status, body
            )));
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::Query(format!("Failed to parse query response: {}", e)))?;

        info!("Vector search returned {} matches", parsed.matches.len());
        Ok(parsed.matches)
    }

    fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    fn name(&self) -> &str {
        &self.index_name
    }

    async fn ping(&self) -> Result<()> {
        self.describe_index_stats().await.map(|_| ())
    }
}
