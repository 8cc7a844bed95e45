use super::{push_mode, GlobalArgs};
use crate::reconcile::delete_rules;
use crate::waf::ResourceId;
use anyhow::{bail, Result};
use clap::Args;

#[derive(Args)]
pub struct DeleteArgs {
    /// Resource id of the policy
    #[arg(long)]
    pub policy: String,

    /// Delete every custom rule whose name starts with this prefix
    #[arg(long)]
    pub prefix: String,

    /// Do not wait for the update to complete
    #[arg(long)]
    pub no_wait: bool,
}

pub async fn run(args: DeleteArgs, global: GlobalArgs) -> Result<()> {
    let session = global.session()?;

    if args.prefix.is_empty() {
        bail!("prefix must not be empty");
    }

    let id: ResourceId = args.policy.parse()?;
    let removed = delete_rules(&session.store, &id, &args.prefix, push_mode(args.no_wait))?;

    if removed == 0 {
        session.say("nothing to do");
    } else {
        session.say(format!("{} custom rules deleted from {}", removed, id.name));
    }

    Ok(())
}
