use crate::selection::SelectionMode;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SourceListConfig {
    #[serde(default)]
    pub selection: SelectionConfig,

    #[serde(default)]
    pub store: StoreConfig,
}

/// Selection tracker configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SelectionConfig {
    /// Whether selecting an item replaces the selection or adds to it
    #[serde(default)]
    pub mode: SelectionMode,

    /// Maximum number of entries kept in the selection history
    #[serde(default = "default_max_history_size")]
    pub max_history_size: usize,
}

fn default_max_history_size() -> usize {
    50
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            mode: SelectionMode::default(),
            max_history_size: default_max_history_size(),
        }
    }
}

/// Tree store configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StoreConfig {
    /// Publish the whole forest after every change.
    /// When disabled only the typed insert/update/remove events are sent,
    /// which is cheaper for large trees.
    #[serde(default = "default_true")]
    pub broadcast_snapshots: bool,

    /// Publish change and deletion events even when `delete_item` is called
    /// with an id that is not in the forest
    #[serde(default = "default_true")]
    pub notify_unknown_deletes: bool,
}

fn default_true() -> bool {
    true
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            broadcast_snapshots: true,
            notify_unknown_deletes: true,
        }
    }
}

impl SourceListConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        let config: SourceListConfig =
            serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        tracing::debug!("Loaded source list config from {:?}", path.as_ref());
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path.as_ref(), contents).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.selection.max_history_size == 0 {
            return Err(ConfigError::ValidationError(
                "max_history_size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// JSON Schema describing the configuration file
    pub fn json_schema() -> Result<serde_json::Value, ConfigError> {
        let schema = schemars::schema_for!(SourceListConfig);
        serde_json::to_value(&schema).map_err(|e| ConfigError::SerializeError(e.to_string()))
    }
}

/// Configuration error types
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(msg) => write!(f, "IO error: {msg}"),
            ConfigError::ParseError(msg) => write!(f, "Parse error: {msg}"),
            ConfigError::SerializeError(msg) => write!(f, "Serialize error: {msg}"),
            ConfigError::ValidationError(msg) => write!(f, "Validation error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}
