use super::prompt::StdinConfirm;
use super::GlobalArgs;
use crate::backup::load_backups;
use crate::reconcile::{restore_policies, AutoConfirm, Confirm, ReconcileOptions, RestoreStatus};
use crate::waf::{ResourceId, RuleScope};
use anyhow::{bail, Result};
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct RestoreArgs {
    /// Backup files, or directories of backups
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Restore into this policy instead of the one the backup came from
    #[arg(long)]
    pub target: Option<String>,

    /// Resource group to create missing policies in
    #[arg(long)]
    pub resource_group: Option<String>,

    /// Only restore custom rules
    #[arg(long, conflicts_with = "managed_only")]
    pub custom_only: bool,

    /// Only restore managed rules
    #[arg(long)]
    pub managed_only: bool,

    /// Replace without asking for confirmation
    #[arg(long)]
    pub force: bool,

    /// Stop at the first backup that cannot be restored
    #[arg(long)]
    pub fail_fast: bool,
}

pub async fn run(args: RestoreArgs, global: GlobalArgs) -> Result<()> {
    let session = global.session()?;

    let options = ReconcileOptions {
        subscription_id: session.config.subscription_id.clone(),
        scope: RuleScope::from_flags(args.custom_only, args.managed_only)?,
        target: args.target.as_deref().map(str::parse::<ResourceId>).transpose()?,
        resource_group: args.resource_group,
        force: args.force,
        fail_fast: args.fail_fast,
    };

    let backups = load_backups(&args.paths)?;

    let confirm: &dyn Confirm = if args.force {
        &AutoConfirm(true)
    } else {
        &StdinConfirm
    };
    let outcomes = restore_policies(&session.store, confirm, &backups, &options)?;

    let mut failed = 0;
    for outcome in &outcomes {
        match &outcome.status {
            RestoreStatus::Applied { target, .. } => session.say(format!("restored {}", target)),
            RestoreStatus::Skipped(reason) => session.say(format!("skipped {}: {}", outcome.source, reason)),
            RestoreStatus::Failed(e) => {
                failed += 1;
                eprintln!("failed {}: {}", outcome.source, e);
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} backups could not be restored", failed, outcomes.len());
    }

    Ok(())
}
