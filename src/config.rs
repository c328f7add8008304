//! Canon engine tuning from `{data_path}/canon.toml`.
//!
//! ```toml
//! [compaction]
//! threshold_chars = 80000
//! keep_last = 10
//!
//! [retrieval]
//! contradiction_distance = 0.8
//! context_limit = 5
//! query_cache_ttl_secs = 600
//!
//! [summarizer]
//! model = "claude-sonnet-4-20250514"
//! api_key_env = "ANTHROPIC_API_KEY"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::embedding::index::RetrievalConfig;
use crate::services::compactor::CompactionConfig;
use crate::services::summarizer::DEFAULT_SUMMARY_MODEL;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    pub model: String,
    /// Env var holding the API key.
    pub api_key_env: String,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_SUMMARY_MODEL.to_string(),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanonConfig {
    pub compaction: CompactionConfig,
    pub retrieval: RetrievalConfig,
    pub summarizer: SummarizerConfig,
}

/// Load `canon.toml`, falling back to defaults when absent or malformed.
pub fn load_canon_config(data_path: &Path) -> CanonConfig {
    let config_path = data_path.join("canon.toml");
    if !config_path.exists() {
        return CanonConfig::default();
    }
    match std::fs::read_to_string(&config_path) {
        Ok(contents) => match toml::from_str::<CanonConfig>(&contents) {
            Ok(config) => {
                info!("Loaded canon config from {}", config_path.display());
                config
            }
            Err(e) => {
                warn!(
                    "Failed to parse {}: {}. Using defaults.",
                    config_path.display(),
                    e
                );
                CanonConfig::default()
            }
        },
        Err(e) => {
            warn!(
                "Failed to read {}: {}. Using defaults.",
                config_path.display(),
                e
            );
            CanonConfig::default()
        }
    }
}
