pub mod backup;
pub mod config;
pub mod copy;
pub mod delete;
pub mod ips;
pub mod list;
pub mod prompt;
pub mod restore;
pub mod run;
pub mod show;

pub use backup::BackupArgs;
pub use config::ConfigArgs;
pub use copy::CopyArgs;
pub use delete::DeleteArgs;
pub use ips::IpsArgs;
pub use list::ListArgs;
pub use restore::RestoreArgs;
pub use run::RunArgs;
pub use show::ShowArgs;

use crate::config::DEFAULT_CONFIG_FILE;
use crate::store::{FilePolicyStore, PushMode};
use crate::Config;
use anyhow::{bail, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::debug;

/// Flags shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Path to configuration file [default: fe-waf.toml if present]
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Subscription to operate on
    #[arg(long, global = true)]
    pub subscription_id: Option<String>,

    /// Root directory of the policy store
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Only print errors and requested output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Resolved settings for one invocation.
pub struct Session {
    pub config: Config,
    pub store: FilePolicyStore,
    pub quiet: bool,
}

impl GlobalArgs {
    /// Load the configuration, apply flag overrides and start logging.
    pub fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Config::from_file(&default)?
                } else {
                    Config::default()
                }
            }
        };

        if let Some(subscription_id) = &self.subscription_id {
            config.subscription_id = subscription_id.clone();
        }
        if let Some(store) = &self.store {
            config.store.path = store.clone();
        }

        Ok(config)
    }

    pub fn session(&self) -> Result<Session> {
        let config = self.load_config()?;

        let level = if self.quiet { "error" } else { config.logging.level.as_str() };
        crate::logging::init_logging(level, &config.logging.format)?;

        debug!("using policy store at {}", config.store.path.display());

        Ok(Session {
            store: FilePolicyStore::new(&config.store.path),
            quiet: self.quiet,
            config,
        })
    }
}

impl Session {
    /// Print a status line unless running quietly.
    pub fn say(&self, message: impl AsRef<str>) {
        if !self.quiet {
            println!("{}", message.as_ref());
        }
    }

    pub fn subscription_id(&self) -> Result<&str> {
        if self.config.subscription_id.is_empty() {
            bail!("subscription id required: pass --subscription-id or set subscription_id in the config file");
        }
        Ok(&self.config.subscription_id)
    }
}

pub(crate) fn push_mode(no_wait: bool) -> PushMode {
    if no_wait {
        PushMode::NoWait
    } else {
        PushMode::Wait
    }
}
