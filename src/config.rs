//! Engine configuration loaded from `config.toml` in the data directory.
//!
//! Keeps the knobs small: the classifier confidence threshold and per-module
//! configuration tables. Module tables are opaque to the engine; they are
//! handed to the matching command-module handler unchanged.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{EngineError, RiposteResult};

fn default_threshold() -> f32 {
    0.25
}

/// Engine configuration.
///
/// All fields have defaults, so an absent `config.toml` is not an error.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Minimum classifier score for a prediction to count.
    #[serde(rename = "chat_threshold")]
    pub threshold: f32,

    /// Per-module configuration tables, keyed by module name.
    ///
    /// Passed through unchanged to the handler on every `execute`.
    pub modules: HashMap<String, toml::Value>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            modules: HashMap::new(),
        }
    }
}

impl BotConfig {
    /// Load configuration from a TOML file.
    ///
    /// A missing file yields the defaults; an unreadable or malformed file
    /// is an error (a half-applied configuration is worse than none).
    pub fn load(path: &Path) -> RiposteResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content =
            std::fs::read_to_string(path).map_err(|e| EngineError::InvalidConfig {
                message: format!("cannot read {}: {e}", path.display()),
            })?;
        let config: Self = toml::from_str(&content).map_err(|e| EngineError::InvalidConfig {
            message: format!("{}: {e}", path.display()),
        })?;
        if !(0.0..=1.0).contains(&config.threshold) {
            return Err(EngineError::InvalidConfig {
                message: format!(
                    "chat_threshold must be between 0.0 and 1.0, got {}",
                    config.threshold
                ),
            }
            .into());
        }
        Ok(config)
    }

    /// Configuration table for a module, if one was declared.
    pub fn module_config(&self, name: &str) -> Option<&toml::Value> {
        self.modules.get(name)
    }
}
