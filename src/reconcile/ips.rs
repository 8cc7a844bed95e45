//! Applying IP lists to a live policy.

use crate::error::{Result, WafError};
use crate::ipset::IpSet;
use crate::store::{PolicyStore, PushMode};
use crate::waf::{
    compile_rules, diff_policies, merge_rules, remove_rules_with_prefix, Action, PatchSummary, ResourceId,
    WafPolicy,
};
use tracing::info;

/// What to do with the merged policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpChangeMode {
    /// Push the merged policy
    Apply(PushMode),
    /// Only count the changes
    DryRun,
    /// Hand the merged policy back without persisting it
    Output,
}

impl Default for IpChangeMode {
    fn default() -> Self {
        Self::Apply(PushMode::Wait)
    }
}

#[derive(Debug, Clone)]
pub struct ApplyIpsInput {
    pub policy_id: ResourceId,
    pub action: Action,
    pub networks: IpSet,
    /// Overrides the action's default rule count; `Some(0)` means no limit
    pub max_rules: Option<usize>,
    pub mode: IpChangeMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyStatus {
    NothingToDo,
    DryRun,
    Output,
    Applied,
}

#[derive(Debug, Clone)]
pub struct ApplyIpsOutcome {
    pub summary: PatchSummary,
    /// The policy after merging, whether or not it was pushed
    pub policy: WafPolicy,
    pub status: ApplyStatus,
}

impl ApplyIpsOutcome {
    pub fn changes(&self) -> usize {
        self.summary.custom_rule_changes()
    }
}

/// Replace the generated rules for `input.action` in a live policy with
/// rules compiled from `input.networks`.
pub fn apply_ips<S: PolicyStore>(store: &S, input: &ApplyIpsInput) -> Result<ApplyIpsOutcome> {
    if input.networks.is_empty() {
        return Err(WafError::InvalidScope("no IPs loaded".to_string()));
    }

    let original = store
        .get_policy(&input.policy_id)?
        .ok_or_else(|| WafError::TargetNotFound(input.policy_id.to_string()))?;

    let max_rules = input
        .max_rules
        .unwrap_or(input.action.spec().default_max_rules);
    let rules = compile_rules(&input.networks, input.action, max_rules);
    let merged = merge_rules(original.clone(), rules, input.action)?;

    let summary = diff_policies(&original, &merged)?;
    let action = input.action.as_str().to_lowercase();

    let status = if summary.custom_rule_changes() == 0 {
        info!("nothing to do for {}", input.policy_id);
        ApplyStatus::NothingToDo
    } else {
        match input.mode {
            IpChangeMode::DryRun => {
                info!(
                    "{} changes to {} list would be applied",
                    summary.custom_rule_changes(),
                    action
                );
                ApplyStatus::DryRun
            }
            IpChangeMode::Output => ApplyStatus::Output,
            IpChangeMode::Apply(push) => {
                info!("updating policy {}", input.policy_id);
                store.put_policy(&input.policy_id, &merged, push)?;
                info!(
                    "{} changes to {} list have been applied",
                    summary.custom_rule_changes(),
                    action
                );
                ApplyStatus::Applied
            }
        }
    };

    Ok(ApplyIpsOutcome {
        summary,
        policy: merged,
        status,
    })
}

/// Remove every custom rule whose name starts with `prefix`.
///
/// Returns the number of rules removed; nothing is pushed when none match.
pub fn delete_rules<S: PolicyStore>(store: &S, id: &ResourceId, prefix: &str, mode: PushMode) -> Result<usize> {
    let mut policy = store
        .get_policy(id)?
        .ok_or_else(|| WafError::TargetNotFound(id.to_string()))?;

    let removed = remove_rules_with_prefix(&mut policy, prefix);
    if removed == 0 {
        info!("nothing to do: no custom rules in {} start with '{}'", id, prefix);
        return Ok(0);
    }

    info!("updating policy {}", id);
    store.put_policy(id, &policy, mode)?;
    info!("removed {} custom rules from {}", removed, id);

    Ok(removed)
}

/// Apply each action in turn, stopping at the first error.
///
/// With `dry_run` set every action only counts its changes.
pub fn run_actions<S: PolicyStore>(
    store: &S,
    actions: Vec<ApplyIpsInput>,
    dry_run: bool,
) -> Result<Vec<ApplyIpsOutcome>> {
    let mut outcomes = Vec::with_capacity(actions.len());

    for mut input in actions {
        if dry_run {
            input.mode = IpChangeMode::DryRun;
        }

        info!(
            "running {} action for policy {} ({} networks)",
            input.action.as_str().to_uppercase(),
            input.policy_id.name,
            input.networks.len()
        );
        outcomes.push(apply_ips(store, &input)?);
    }

    Ok(outcomes)
}
