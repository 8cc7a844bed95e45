use super::{push_mode, GlobalArgs};
use crate::ipset::{load_sources, IpSource};
use crate::reconcile::{apply_ips, ApplyIpsInput, ApplyStatus, IpChangeMode};
use crate::waf::{Action, ResourceId, MAX_CUSTOM_RULES};
use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Args)]
pub struct IpsArgs {
    #[command(subcommand)]
    pub command: IpsCommand,
}

#[derive(Subcommand)]
pub enum IpsCommand {
    /// Replace the generated IP rules of a policy
    Ips(IpsOptions),
}

#[derive(Args, Debug)]
pub struct IpsOptions {
    /// Resource id of the policy to update
    #[arg(long)]
    pub policy: String,

    /// File, or directory of files, with one network per line
    #[arg(short, long = "file")]
    pub files: Vec<PathBuf>,

    /// Maximum number of rules to generate (0 for no limit)
    #[arg(short, long)]
    pub max_rules: Option<usize>,

    /// Print the updated policy instead of applying it
    #[arg(short, long, conflicts_with = "dry_run")]
    pub output: bool,

    /// Report how many changes would be applied
    #[arg(short, long)]
    pub dry_run: bool,

    /// Do not wait for the update to complete
    #[arg(long)]
    pub no_wait: bool,

    /// Networks to add, e.g. 1.2.3.4 or 10.0.0.0/8
    pub networks: Vec<String>,
}

pub async fn run(action: Action, args: IpsArgs, global: GlobalArgs) -> Result<()> {
    let IpsCommand::Ips(opts) = args.command;
    let session = global.session()?;

    if let Some(max) = opts.max_rules {
        if max > MAX_CUSTOM_RULES {
            bail!("--max-rules cannot exceed {}", MAX_CUSTOM_RULES);
        }
    }

    let policy_id: ResourceId = opts.policy.parse()?;

    let mut sources = Vec::new();
    if !opts.networks.is_empty() {
        sources.push(IpSource::Literal(opts.networks.clone()));
    }
    sources.extend(opts.files.iter().cloned().map(IpSource::Path));
    let networks = load_sources(&sources).context("Failed to load networks")?;

    let mode = if opts.dry_run {
        IpChangeMode::DryRun
    } else if opts.output {
        IpChangeMode::Output
    } else {
        IpChangeMode::Apply(push_mode(opts.no_wait))
    };

    let input = ApplyIpsInput {
        policy_id,
        action,
        networks,
        max_rules: Some(opts.max_rules.unwrap_or_else(|| session.config.limits.max_rules_for(action))),
        mode,
    };

    let outcome = apply_ips(&session.store, &input)?;
    let list = action.as_str().to_lowercase();

    match outcome.status {
        ApplyStatus::NothingToDo => session.say("nothing to do"),
        ApplyStatus::DryRun => session.say(format!("{} changes to {} list would be applied", outcome.changes(), list)),
        ApplyStatus::Output => println!("{}", serde_json::to_string_pretty(&outcome.policy)?),
        ApplyStatus::Applied => session.say(format!("{} changes to {} list have been applied", outcome.changes(), list)),
    }

    Ok(())
}
