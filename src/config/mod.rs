pub mod actions;
mod defaults;
pub mod logging;
pub mod parser;
pub mod validator;

pub use actions::{load_actions, ActionConfig};
pub use logging::LoggingConfig;

use crate::waf::Action;
use anyhow::Result;
use defaults::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "fe-waf.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Subscription used when a command is not given one
    #[serde(default)]
    pub subscription_id: String,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Root directory of the file-backed policy store
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

/// Maximum generated rules per action when a command does not say otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_block_max_rules")]
    pub block_max_rules: usize,
    #[serde(default = "default_allow_max_rules")]
    pub allow_max_rules: usize,
    #[serde(default = "default_log_max_rules")]
    pub log_max_rules: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            block_max_rules: default_block_max_rules(),
            allow_max_rules: default_allow_max_rules(),
            log_max_rules: default_log_max_rules(),
        }
    }
}

impl LimitsConfig {
    pub fn max_rules_for(&self, action: Action) -> usize {
        match action {
            Action::Block => self.block_max_rules,
            Action::Allow => self.allow_max_rules,
            Action::Log => self.log_max_rules,
        }
    }
}

impl Config {
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        parser::parse_config(path)
    }

    pub fn validate(&self) -> Result<Vec<String>> {
        validator::validate_config(self)
    }
}
