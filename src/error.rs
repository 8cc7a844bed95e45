//! Error types for fe-waf.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WafError {
    #[error("Parse error in {source_name} line {line_number}: invalid network '{line}'")]
    Parse {
        source_name: String,
        line_number: usize,
        line: String,
    },

    #[error("Unsupported action: '{0}'. Valid values: block, allow, log")]
    UnsupportedAction(String),

    #[error("Operation exceeds custom rules limit of {limit} ({count} rules)")]
    RuleLimitExceeded { count: usize, limit: usize },

    #[error("Policy not found: {0}")]
    TargetNotFound(String),

    #[error("Invalid scope: {0}")]
    InvalidScope(String),

    #[error("Nothing to change: {0}")]
    NoChanges(String),

    #[error("Diff error: {0}")]
    Diff(String),

    #[error("Invalid resource id '{id}': {reason}")]
    InvalidResourceId { id: String, reason: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid backup {}: {message}", path.display())]
    InvalidBackup { path: PathBuf, message: String },

    #[error("Policy store error for {id}: {message}")]
    Store { id: String, message: String },
}

impl WafError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, WafError>;
