//! Deciding whether, and how, a candidate policy replaces a live one.
//!
//! [`decide`] runs for one backup (or copy source) at a time:
//!
//! ```text
//! no live policy ── explicit target ──────────────► Error(TargetNotFound)
//!        │ └──── no resource group ───────────────► Error(InvalidScope)
//!        └────── resource group given ────────────► Apply (create)
//! live policy ──── no relevant changes ───────────► Skip
//!        ├──────── force ─────────────────────────► Apply
//!        └──────── confirm? ── no ────────────────► Skip
//!                          └── yes ───────────────► Apply
//! ```

pub mod copy;
pub mod ips;
pub mod restore;

pub use copy::copy_rules;
pub use ips::{apply_ips, delete_rules, run_actions, ApplyIpsInput, ApplyIpsOutcome, ApplyStatus, IpChangeMode};
pub use restore::{restore_policies, RestoreOutcome, RestoreStatus};

use crate::error::{Result, WafError};
use crate::waf::{check_rule_limit, diff_policies, PatchSummary, ResourceId, RuleScope, WrappedPolicy};
use chrono::Utc;
use tracing::{debug, info};

/// Synchronous yes/no question put to the operator.
pub trait Confirm {
    fn confirm(&self, headline: &str, detail: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str, &str) -> bool,
{
    fn confirm(&self, headline: &str, detail: &str) -> bool {
        self(headline, detail)
    }
}

/// Answers every question with the same value.
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

impl Confirm for AutoConfirm {
    fn confirm(&self, _headline: &str, _detail: &str) -> bool {
        self.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReconcileOptions {
    /// Subscription new policies are created in
    pub subscription_id: String,
    pub scope: RuleScope,
    /// Explicit policy to reconcile against, instead of each backup's origin
    pub target: Option<ResourceId>,
    /// Resource group new policies are created in
    pub resource_group: Option<String>,
    pub force: bool,
    pub fail_fast: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Persist `policy`. `summary` is absent when a new policy is created.
    Apply {
        policy: WrappedPolicy,
        summary: Option<PatchSummary>,
    },
    Skip(String),
}

/// Run the reconciliation state machine for one candidate.
///
/// `existing` is the live policy matched by the explicit target or by the
/// candidate's origin id. The only side effect is the confirmation question.
pub fn decide(
    existing: Option<&WrappedPolicy>,
    candidate: &WrappedPolicy,
    options: &ReconcileOptions,
    confirm: &dyn Confirm,
) -> Result<Decision> {
    let existing = match existing {
        Some(existing) => existing,
        None => return decide_create(candidate, options),
    };

    let summary = diff_policies(&existing.policy, &candidate.policy)?;
    if summary.relevant_changes(options.scope) == 0 {
        let reason = match options.scope {
            RuleScope::CustomOnly => "target policy's custom rules are identical to those in backup",
            RuleScope::ManagedOnly => "target policy's managed rules are identical to those in backup",
            RuleScope::All => "target policy rules are identical to backup",
        };
        info!("{}: {}", existing.policy_id, reason);
        return Ok(Decision::Skip(reason.to_string()));
    }

    if !options.force {
        let op = options.scope.describe();
        let taken = candidate.date.format("%A, %d-%b-%y %H:%M:%S UTC");
        let (headline, detail) = match &options.target {
            Some(target) => (
                format!("confirm replacement of {}rules in target policy {}", op, target),
                format!("with backup {}\ntaken {}", candidate.policy_id, taken),
            ),
            None => (
                format!("found an existing policy: {}", existing.policy_id),
                format!("confirm replacement of {}rules with backup taken {}", op, taken),
            ),
        };

        if !confirm.confirm(&headline, &detail) {
            return Ok(Decision::Skip("replacement declined".to_string()));
        }
    }

    let policy = replace_rules(existing, candidate, options.scope);
    check_rule_limit(&policy.policy)?;
    debug!("applying {} rule changes to {}", summary.relevant_changes(options.scope), policy.policy_id);

    Ok(Decision::Apply {
        policy,
        summary: Some(summary),
    })
}

fn decide_create(candidate: &WrappedPolicy, options: &ReconcileOptions) -> Result<Decision> {
    if let Some(target) = &options.target {
        return Err(WafError::TargetNotFound(target.to_string()));
    }

    let resource_group = match options.resource_group.as_deref() {
        Some(rg) if !rg.is_empty() => rg,
        _ => {
            return Err(WafError::InvalidScope(format!(
                "cannot create new policy {} without resource group",
                candidate.name
            )))
        }
    };

    let subscription_id = if options.subscription_id.is_empty() {
        candidate.subscription_id.as_str()
    } else {
        options.subscription_id.as_str()
    };

    let id = ResourceId::policy(subscription_id, resource_group, &candidate.name);
    let mut document = candidate.policy.clone();
    document.id = Some(id.to_string());
    document.name = Some(id.name.clone());

    let mut policy = WrappedPolicy::new(&id, document);
    policy.date = Utc::now();
    check_rule_limit(&policy.policy)?;

    info!("policy {} does not exist and will be created", id);
    Ok(Decision::Apply {
        policy,
        summary: None,
    })
}

/// Copy the sections named by `scope` from `candidate` into `existing`.
///
/// A managed-only replacement clears the live managed rules when the
/// candidate has none.
pub fn replace_rules(existing: &WrappedPolicy, candidate: &WrappedPolicy, scope: RuleScope) -> WrappedPolicy {
    let mut result = existing.clone();
    let target = &mut result.policy.properties;
    let source = &candidate.policy.properties;

    match scope {
        RuleScope::CustomOnly => {
            target.custom_rules = Some(source.custom_rules.clone().unwrap_or_default());
        }
        RuleScope::ManagedOnly => {
            target.managed_rules = source.managed_rules.clone();
        }
        RuleScope::All => {
            target.custom_rules = source.custom_rules.clone();
            target.managed_rules = source.managed_rules.clone();
        }
    }

    result.date = Utc::now();
    result
}
