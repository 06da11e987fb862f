// file: src/embeddings/mod.rs
// description: embedding provider abstraction and backend selection
// reference: internal module structure

pub mod hash;
pub mod remote;

pub use hash::HashEmbedder;
pub use remote::RemoteEmbeddingClient;

use crate::config::{EmbeddingBackend, EmbeddingConfig};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Turns text into a fixed-dimension vector. Callers guarantee non-empty input.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn dimension(&self) -> usize;

    fn model_name(&self) -> &str;
}

/// Builds the configured provider once; failures are `PipelineError::Initialization`.
pub async fn init_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    match config.backend {
        EmbeddingBackend::Remote => {
            let client = RemoteEmbeddingClient::connect(config).await?;
            Ok(Arc::new(client))
        }
        EmbeddingBackend::Hash => {
            info!(
                "Using offline feature-hash embedder ({} dimensions)",
                config.dimension
            );
            Ok(Arc::new(HashEmbedder::new(config.dimension)))
        }
    }
}
