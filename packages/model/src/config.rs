use crate::command_stack::DEFAULT_UNDO_LIMIT;
use crate::error::StoreResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_NAME: &str = "arbor.config.json";

/// Model settings file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    /// Whether changes are recorded for undo
    #[serde(default = "default_undo_enabled")]
    pub undo_enabled: bool,

    /// Maximum number of undo steps (0 = unlimited)
    #[serde(default = "default_undo_limit")]
    pub undo_limit: usize,

    /// Application tag written to and expected in documents
    #[serde(default = "default_application_type")]
    pub application_type: String,
}

fn default_undo_enabled() -> bool {
    true
}

fn default_undo_limit() -> usize {
    DEFAULT_UNDO_LIMIT
}

fn default_application_type() -> String {
    "arbor".to_string()
}

impl ModelConfig {
    /// Load config from a directory
    pub fn load(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let config_path = dir.as_ref().join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: ModelConfig = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(ModelConfig::default())
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            undo_enabled: default_undo_enabled(),
            undo_limit: default_undo_limit(),
            application_type: default_application_type(),
        }
    }
}
