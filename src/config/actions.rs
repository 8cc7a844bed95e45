//! Batch action files for the `run` command.
//!
//! ```toml
//! [[actions]]
//! action = "block"
//! policy = "/subscriptions/.../frontdoorWebApplicationFirewallPolicies/mypolicy"
//! paths = ["~/lists/bad-actors.txt", "/etc/fe-waf/block.d"]
//! max_rules = 20
//! ```

use crate::ipset::{load_sources, IpSource};
use crate::reconcile::{ApplyIpsInput, IpChangeMode};
use crate::waf::{Action, ResourceId};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ActionsFile {
    #[serde(default)]
    actions: Vec<ActionConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionConfig {
    pub action: String,
    pub policy: String,
    #[serde(default)]
    pub paths: Vec<PathBuf>,
    #[serde(default, alias = "max-rules")]
    pub max_rules: Option<usize>,
}

pub fn load_actions(path: &Path) -> Result<Vec<ActionConfig>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read actions file: {}", path.display()))?;

    let file: ActionsFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse actions file: {}", path.display()))?;

    Ok(file.actions)
}

impl ActionConfig {
    /// Resolve the action, policy id and networks.
    ///
    /// Every path is loaded now, so a bad list fails before anything is pushed.
    pub fn to_input(&self, home: Option<&Path>) -> Result<ApplyIpsInput> {
        let action: Action = self.action.parse()?;
        let policy_id: ResourceId = self
            .policy
            .parse()
            .with_context(|| format!("Invalid policy in {} action", self.action))?;

        let sources: Vec<IpSource> = self
            .paths
            .iter()
            .map(|p| IpSource::Path(expand_home(p, home)))
            .collect();
        let networks = load_sources(&sources)
            .with_context(|| format!("Failed to load networks for policy {}", policy_id.name))?;

        Ok(ApplyIpsInput {
            policy_id,
            action,
            networks,
            max_rules: self.max_rules,
            mode: IpChangeMode::default(),
        })
    }
}

/// Replace a leading `~` with the home directory.
pub fn expand_home(path: &Path, home: Option<&Path>) -> PathBuf {
    let home = match home {
        Some(home) => home,
        None => return path.to_path_buf(),
    };

    match path.strip_prefix("~") {
        Ok(rest) => home.join(rest),
        Err(_) => path.to_path_buf(),
    }
}

/// The current user's home directory, from `$HOME`.
pub fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
}
