//! Default values for configuration options

use crate::waf::Action;
use std::path::PathBuf;

// Store defaults
pub(super) fn default_store_path() -> PathBuf {
    PathBuf::from("policies")
}

// Logging defaults
pub(super) fn default_log_level() -> String {
    "info".to_string()
}

pub(super) fn default_log_format() -> String {
    "text".to_string()
}

// Limit defaults
pub(super) fn default_block_max_rules() -> usize {
    Action::Block.spec().default_max_rules
}

pub(super) fn default_allow_max_rules() -> usize {
    Action::Allow.spec().default_max_rules
}

pub(super) fn default_log_max_rules() -> usize {
    Action::Log.spec().default_max_rules
}
