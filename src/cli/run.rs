use super::GlobalArgs;
use crate::config::actions::home_dir;
use crate::config::load_actions;
use crate::reconcile::{run_actions, ApplyStatus};
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use tracing::info;

#[derive(Args)]
pub struct RunArgs {
    /// TOML file with [[actions]] entries
    pub path: PathBuf,

    /// Report changes without applying them
    #[arg(short, long)]
    pub dry_run: bool,
}

pub async fn run(args: RunArgs, global: GlobalArgs) -> Result<()> {
    let session = global.session()?;

    let actions = load_actions(&args.path)?;
    info!("loaded {} actions from {}", actions.len(), args.path.display());

    let home = home_dir();
    let mut inputs = Vec::with_capacity(actions.len());
    for action in &actions {
        let mut input = action.to_input(home.as_deref())?;
        if input.max_rules.is_none() {
            input.max_rules = Some(session.config.limits.max_rules_for(input.action));
        }
        inputs.push(input);
    }

    let outcomes = run_actions(&session.store, inputs.clone(), args.dry_run)?;

    for (input, outcome) in inputs.iter().zip(&outcomes) {
        let list = input.action.as_str().to_lowercase();
        let message = match outcome.status {
            ApplyStatus::NothingToDo => "nothing to do".to_string(),
            ApplyStatus::DryRun => format!("{} changes to {} list would be applied", outcome.changes(), list),
            _ => format!("{} changes to {} list have been applied", outcome.changes(), list),
        };
        session.say(format!("{}: {}", input.policy_id.name, message));
    }

    Ok(())
}
