//! Embedding provider configuration and factory.
//!
//! Supports multiple embedding backends via a tagged enum configuration.
//! Default is an OpenAI-compatible endpoint keyed by `OPENAI_API_KEY`; with
//! no key in the environment the factory falls back to the no-op service.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::embedding::http::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::embedding::{
    EmbeddingService, HttpEmbeddingService, NoopEmbeddingService, DEFAULT_DIMENSIONS,
};
use crate::DramaturgError;

/// Embedding provider configuration.
///
/// Loaded from `{data_path}/embedding.toml` or `DRAMATURG_EMBEDDING_PROVIDER`
/// env var (JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum EmbeddingProviderConfig {
    /// Vectors disabled: search returns nothing, indexing is skipped.
    None {
        #[serde(default = "default_dimensions")]
        dimensions: usize,
    },
    /// OpenAI-compatible HTTP endpoint.
    OpenAi {
        #[serde(default = "default_model")]
        model: String,
        #[serde(default = "default_dimensions")]
        dimensions: usize,
        #[serde(default = "default_base_url")]
        base_url: String,
        /// Name of the env var holding the key; the key itself never lives in config.
        #[serde(default = "default_api_key_env")]
        api_key_env: String,
    },
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_dimensions() -> usize {
    DEFAULT_DIMENSIONS
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

impl Default for EmbeddingProviderConfig {
    fn default() -> Self {
        Self::OpenAi {
            model: default_model(),
            dimensions: default_dimensions(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
        }
    }
}

/// Load embedding provider config with priority:
/// 1. `{data_path}/embedding.toml` file
/// 2. `DRAMATURG_EMBEDDING_PROVIDER` env var (JSON)
/// 3. Default (OpenAI-compatible, 512 dimensions)
pub fn load_provider_config(data_path: &Path) -> EmbeddingProviderConfig {
    let config_path = data_path.join("embedding.toml");
    if config_path.exists() {
        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match toml::from_str::<EmbeddingProviderConfig>(&contents) {
                Ok(config) => {
                    info!("Loaded embedding config from {}", config_path.display());
                    return config;
                }
                Err(e) => {
                    warn!(
                        "Failed to parse {}: {}. Using default.",
                        config_path.display(),
                        e
                    );
                }
            },
            Err(e) => {
                warn!(
                    "Failed to read {}: {}. Using default.",
                    config_path.display(),
                    e
                );
            }
        }
    }

    if let Ok(json) = std::env::var("DRAMATURG_EMBEDDING_PROVIDER") {
        match serde_json::from_str::<EmbeddingProviderConfig>(&json) {
            Ok(config) => {
                info!("Loaded embedding config from DRAMATURG_EMBEDDING_PROVIDER env");
                return config;
            }
            Err(e) => {
                warn!(
                    "Failed to parse DRAMATURG_EMBEDDING_PROVIDER: {}. Using default.",
                    e
                );
            }
        }
    }

    EmbeddingProviderConfig::default()
}

/// Create an embedding service from provider configuration.
///
/// A missing credential is not an error: vectors are disabled and a warning
/// is logged.
pub fn create_embedding_service(
    config: &EmbeddingProviderConfig,
) -> Result<Arc<dyn EmbeddingService + Send + Sync>, DramaturgError> {
    match config {
        EmbeddingProviderConfig::None { dimensions } => {
            info!("Embeddings disabled by config");
            Ok(Arc::new(NoopEmbeddingService::with_dimensions(*dimensions)))
        }
        EmbeddingProviderConfig::OpenAi {
            model,
            dimensions,
            base_url,
            api_key_env,
        } => {
            if *dimensions == 0 {
                return Err(DramaturgError::Config(
                    "Embedding dimensions must be positive".into(),
                ));
            }
            match std::env::var(api_key_env).ok().filter(|k| !k.trim().is_empty()) {
                Some(key) => {
                    let service =
                        HttpEmbeddingService::new(base_url, key, model, *dimensions)?;
                    info!("Embedding via {} ({} dimensions)", model, dimensions);
                    Ok(Arc::new(service))
                }
                None => {
                    warn!(
                        "{} not set; semantic memory disabled (search returns nothing)",
                        api_key_env
                    );
                    Ok(Arc::new(NoopEmbeddingService::with_dimensions(*dimensions)))
                }
            }
        }
    }
}
