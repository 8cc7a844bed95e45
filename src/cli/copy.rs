use super::{push_mode, GlobalArgs};
use crate::reconcile::copy_rules;
use crate::waf::{ResourceId, RuleScope};
use anyhow::Result;
use clap::Args;

#[derive(Args)]
pub struct CopyArgs {
    /// Policy to copy rules from
    #[arg(long)]
    pub source: String,

    /// Policy to copy rules to
    #[arg(long)]
    pub target: String,

    /// Only copy custom rules
    #[arg(long, conflicts_with = "managed_only")]
    pub custom_only: bool,

    /// Only copy managed rules
    #[arg(long)]
    pub managed_only: bool,

    /// Do not wait for the update to complete
    #[arg(long)]
    pub no_wait: bool,
}

pub async fn run(args: CopyArgs, global: GlobalArgs) -> Result<()> {
    let session = global.session()?;

    let source: ResourceId = args.source.parse()?;
    let target: ResourceId = args.target.parse()?;
    let scope = RuleScope::from_flags(args.custom_only, args.managed_only)?;

    let summary = copy_rules(&session.store, &source, &target, scope, push_mode(args.no_wait))?;
    session.say(format!(
        "copied {}rules from {} to {} ({} differences)",
        scope.describe(),
        source.name,
        target.name,
        summary.relevant_changes(scope)
    ));

    Ok(())
}
