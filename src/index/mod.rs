// file: src/index/mod.rs
// description: vector index abstraction and client construction
// reference: internal module structure

pub mod pinecone;

pub use pinecone::PineconeClient;

use crate::config::IndexConfig;
use crate::error::Result;
use crate::models::RawMatch;
use async_trait::async_trait;
use std::sync::Arc;

/// Nearest-neighbor search over indexed company vectors.
///
/// Implementations return matches ordered by descending similarity and report
/// invalid arguments or transport failures as `PipelineError::Query`; deciding
/// whether a failure degrades to "no matches" is left to the caller.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn search(&self, vector: &[f32], top_k: usize, namespace: &str) -> Result<Vec<RawMatch>>;

    /// Dimensionality of indexed vectors, when the service reports it.
    fn dimension(&self) -> Option<usize>;

    fn name(&self) -> &str;

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

pub async fn init_index(config: &IndexConfig) -> Result<Arc<dyn VectorIndex>> {
    let client = PineconeClient::connect(config).await?;
    Ok(Arc::new(client))
}
