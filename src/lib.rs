// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod analysis;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod exporter;
pub mod index;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod utils;

pub use analysis::{AnalysisGenerator, ChatCompletion, OpenAiChatClient};
pub use config::{
    AnalysisConfig, Config, EmbeddingBackend, EmbeddingConfig, IndexConfig, SearchConfig,
};
pub use embeddings::{EmbeddingProvider, HashEmbedder, RemoteEmbeddingClient};
pub use error::{PipelineError, Result};
pub use exporter::ReportExporter;
pub use index::{PineconeClient, VectorIndex};
pub use models::{CompanyRecord, RawMatch};
pub use parser::ResultNormalizer;
pub use pipeline::{PipelineOutput, PipelineStage, SearchPipeline, StatusSignal};
pub use utils::{HealthCheck, HealthReport, HealthStatus, OperationTimer, Validator};
