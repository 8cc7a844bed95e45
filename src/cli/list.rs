use super::GlobalArgs;
use crate::store::{PolicyStore, MAX_POLICIES_TO_FETCH};
use anyhow::{bail, Result};
use clap::{Args, Subcommand};

#[derive(Args)]
pub struct ListArgs {
    #[command(subcommand)]
    pub command: ListCommand,
}

#[derive(Subcommand)]
pub enum ListCommand {
    /// List policy ids in the subscription
    Policies {
        /// Maximum number of policies to list
        #[arg(long, default_value_t = MAX_POLICIES_TO_FETCH)]
        top: usize,
    },
}

pub async fn run(args: ListArgs, global: GlobalArgs) -> Result<()> {
    match args.command {
        ListCommand::Policies { top } => {
            if top == 0 {
                bail!("--top must be greater than 0");
            }

            let session = global.session()?;
            let ids = session
                .store
                .list_policies(session.subscription_id()?, top)?;

            if ids.is_empty() {
                session.say("no policies found");
            }
            for id in ids {
                println!("{}", id);
            }

            Ok(())
        }
    }
}
