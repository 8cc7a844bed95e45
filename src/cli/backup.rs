use super::GlobalArgs;
use crate::backup::{backup_policies, BackupOptions};
use crate::waf::ResourceId;
use anyhow::{bail, Result};
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct BackupArgs {
    /// Directory to write backups to
    #[arg(short, long, default_value = ".")]
    pub path: PathBuf,

    /// Stop at the first policy that cannot be backed up
    #[arg(long)]
    pub fail_fast: bool,

    /// Policies to back up [default: every policy in the subscription]
    pub ids: Vec<String>,
}

pub async fn run(args: BackupArgs, global: GlobalArgs) -> Result<()> {
    let session = global.session()?;

    let ids = args
        .ids
        .iter()
        .map(|id| id.parse::<ResourceId>())
        .collect::<crate::Result<Vec<_>>>()?;

    let subscription_id = if ids.is_empty() {
        session.subscription_id()?.to_string()
    } else {
        session.config.subscription_id.clone()
    };

    let options = BackupOptions {
        subscription_id,
        ids,
        dir: args.path,
        fail_fast: args.fail_fast,
    };

    let report = backup_policies(&session.store, &options)?;
    for path in &report.written {
        session.say(format!("backup written to: {}", path.display()));
    }

    if !report.failed.is_empty() {
        bail!("{} of {} policies could not be backed up", report.failed.len(), report.failed.len() + report.written.len());
    }

    Ok(())
}
