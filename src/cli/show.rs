use super::GlobalArgs;
use crate::error::WafError;
use crate::store::PolicyStore;
use crate::waf::ResourceId;
use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};

#[derive(Args)]
pub struct ShowArgs {
    #[command(subcommand)]
    pub command: ShowCommand,
}

#[derive(Subcommand)]
pub enum ShowCommand {
    /// Print a policy, or one custom rule given `<policy id>|<rule name>`
    Policy { id: String },
}

pub async fn run(args: ShowArgs, global: GlobalArgs) -> Result<()> {
    let ShowCommand::Policy { id } = args.command;
    let session = global.session()?;

    if id.contains('|') {
        let (policy_id, rule_name) = ResourceId::parse_extended(&id)?;
        let policy = fetch(&session.store, &policy_id)?;
        let rule = policy
            .custom_rule(&rule_name)
            .ok_or_else(|| anyhow!("custom rule '{}' not found in {}", rule_name, policy_id.name))?;
        println!("{}", serde_json::to_string_pretty(rule)?);
    } else {
        let policy_id: ResourceId = id.parse()?;
        let policy = fetch(&session.store, &policy_id)?;
        println!("{}", serde_json::to_string_pretty(&policy)?);
    }

    Ok(())
}

fn fetch<S: PolicyStore>(store: &S, id: &ResourceId) -> Result<crate::waf::WafPolicy> {
    store
        .get_policy(id)?
        .ok_or_else(|| WafError::TargetNotFound(id.to_string()).into())
}
