// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Initialization error: {0}")]
    Initialization(String),

    #[error("Embedding failed for query \"{text}\": {message}")]
    Embedding { text: String, message: String },

    #[error("Query error: {0}")]
    Query(String),

    /// Carries the bare cause so it can be shown to the user after a prefix.
    #[error("{0}")]
    Analysis(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn embedding(text: &str, message: impl Into<String>) -> Self {
        Self::Embedding {
            text: text.to_string(),
            message: message.into(),
        }
    }
}
