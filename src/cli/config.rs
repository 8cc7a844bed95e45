use super::GlobalArgs;
use crate::config::validator::has_errors;
use crate::config::DEFAULT_CONFIG_FILE;
use anyhow::{bail, Result};
use clap::{Args, Subcommand};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Validate the configuration file
    Check,
}

pub async fn run(args: ConfigArgs, global: GlobalArgs) -> Result<()> {
    match args.command {
        ConfigCommand::Check => {
            let path = global
                .config
                .clone()
                .unwrap_or_else(|| DEFAULT_CONFIG_FILE.into());
            println!("Checking configuration: {}", path.display());

            let cfg = global.load_config()?;
            let warnings = cfg.validate()?;

            if warnings.is_empty() {
                println!("Configuration is valid!");
                return Ok(());
            }

            println!("Configuration loaded with warnings:\n");
            for warning in &warnings {
                println!("{}", warning);
            }

            if has_errors(&warnings) {
                bail!("configuration has errors");
            }

            Ok(())
        }
    }
}
