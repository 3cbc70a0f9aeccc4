use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::tool::ToolSettings;

/// Session-wide settings, usually read from a JSON file.
///
/// Every field has a default, so a partial (or empty) file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Maximum number of undo snapshots kept, 0 for unbounded
    pub history_limit: usize,
    /// Recompute filters on a background thread
    pub background_filtering: bool,
    /// Tool selected when a session starts or is reset
    pub default_tool: ToolSettings,
    /// Paper colour prints are flattened onto
    pub print_background: [u8; 3],
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: 50,
            background_filtering: true,
            default_tool: ToolSettings::default(),
            print_background: [255, 255, 255],
        }
    }
}

impl EditorConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Config for deterministic, single-threaded use (tests, batch export)
    pub fn synchronous() -> Self {
        Self {
            background_filtering: false,
            ..Self::default()
        }
    }
}
