// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{PipelineError, Result};
use crate::utils::Validator;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub embedding: EmbeddingConfig,
    pub index: IndexConfig,
    pub analysis: AnalysisConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// OpenAI-compatible `/embeddings` endpoint.
    Remote,
    /// Offline feature-hashing embedder.
    Hash,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub backend: EmbeddingBackend,
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    /// Only used by the hash backend; the remote backend learns it from the model.
    pub dimension: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IndexConfig {
    pub api_key: Option<String>,
    pub environment: Option<String>,
    pub index_name: String,
    pub host: Option<String>,
    pub control_plane_url: String,
    pub api_version: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub reference_exchange: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchConfig {
    pub top_k: usize,
    pub namespace: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::Remote,
            endpoint: "http://localhost:8080/v1".to_string(),
            model: "sentence-transformers/all-mpnet-base-v2".to_string(),
            api_key: None,
            dimension: 768,
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            environment: None,
            index_name: "stocks".to_string(),
            host: None,
            control_plane_url: "https://api.pinecone.io".to_string(),
            api_version: "2024-07".to_string(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4".to_string(),
            reference_exchange: "New York Stock Exchange (NYSE)".to_string(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            namespace: "stock-descriptions".to_string(),
        }
    }
}

impl Config {
    /// Layers the TOML file (required only when a path is given explicitly),
    /// `STOCK_RESEARCH__SECTION__KEY` variables, then the well-known provider
    /// variables for any credential still unset.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder
                .add_source(config::File::from(Path::new(DEFAULT_CONFIG_PATH)).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("STOCK_RESEARCH")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        let mut config: Config = settings
            .try_deserialize()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        config.apply_well_known_env();
        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        let mut config = Self::default();
        config.apply_well_known_env();
        config
    }

    fn apply_well_known_env(&mut self) {
        fill_from_env(&mut self.index.api_key, "PINECONE_API_KEY");
        fill_from_env(&mut self.index.environment, "PINECONE_ENVIRONMENT");
        fill_from_env(&mut self.analysis.api_key, "OPENAI_API_KEY");
    }

    pub fn validate(&self) -> Result<()> {
        Validator::validate_top_k(self.search.top_k)
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        if self.search.namespace.trim().is_empty() {
            return Err(PipelineError::Config(
                "search.namespace must not be empty".to_string(),
            ));
        }

        if self.index.index_name.trim().is_empty() {
            return Err(PipelineError::Config(
                "index.index_name must not be empty".to_string(),
            ));
        }

        if self.embedding.backend == EmbeddingBackend::Hash && self.embedding.dimension == 0 {
            return Err(PipelineError::Config(
                "embedding.dimension must be greater than 0".to_string(),
            ));
        }

        for url in [
            &self.embedding.endpoint,
            &self.index.control_plane_url,
            &self.analysis.base_url,
        ] {
            Validator::validate_url(url).map_err(|e| PipelineError::Config(e.to_string()))?;
        }

        Ok(())
    }
}

fn fill_from_env(slot: &mut Option<String>, var: &str) {
    if slot.as_deref().is_none_or(str::is_empty)
        && let Ok(value) = std::env::var(var)
        && !value.trim().is_empty()
    {
        *slot = Some(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_service_layout() {
        let config = Config::default();

        assert_eq!(config.search.top_k, 5);
        assert_eq!(config.search.namespace, "stock-descriptions");
        assert_eq!(config.index.index_name, "stocks");
        assert_eq!(config.analysis.model, "gpt-4");
        assert_eq!(config.embedding.backend, EmbeddingBackend::Remote);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(
            &path,
            "[search]\ntop_k = 3\n\n[embedding]\nbackend = \"hash\"\ndimension = 64\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();

        assert_eq!(config.search.top_k, 3);
        assert_eq!(config.search.namespace, "stock-descriptions");
        assert_eq!(config.embedding.backend, EmbeddingBackend::Hash);
        assert_eq!(config.embedding.dimension, 64);
        assert_eq!(config.index.index_name, "stocks");
    }

    #[test]
    fn test_load_rejects_zero_top_k() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[search]\ntop_k = 0\n").unwrap();

        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_bad_endpoint() {
        let mut config = Config::default();
        config.analysis.base_url = "api.openai.com".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_fill_from_env_keeps_explicit_value() {
        let mut slot = Some("explicit".to_string());
        fill_from_env(&mut slot, "PATH");
        assert_eq!(slot.as_deref(), Some("explicit"));
    }
}
