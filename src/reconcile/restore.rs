use super::{decide, Confirm, Decision, ReconcileOptions};
use crate::error::{Result, WafError};
use crate::store::{PolicyStore, PushMode};
use crate::waf::{PatchSummary, ResourceId, WrappedPolicy};
use tracing::{error, info, warn};

#[derive(Debug)]
pub enum RestoreStatus {
    Applied {
        target: ResourceId,
        summary: Option<PatchSummary>,
    },
    Skipped(String),
    Failed(WafError),
}

/// What happened to one backup.
#[derive(Debug)]
pub struct RestoreOutcome {
    /// Origin id of the backup
    pub source: String,
    pub status: RestoreStatus,
}

/// Restore `backups` in order.
///
/// Every backup is decided first; policies are pushed only once all decisions
/// are made. A failing backup aborts the batch in fail-fast mode and is
/// recorded otherwise, the remaining backups still being restored. A backup
/// over the custom rule ceiling is never pushed.
pub fn restore_policies<S: PolicyStore>(
    store: &S,
    confirm: &dyn Confirm,
    backups: &[WrappedPolicy],
    options: &ReconcileOptions,
) -> Result<Vec<RestoreOutcome>> {
    if backups.is_empty() {
        return Err(WafError::InvalidScope("no backups to restore".to_string()));
    }

    if options.target.is_some() && backups.len() > 1 {
        return Err(WafError::InvalidScope(
            "restoring more than one backup to a single policy is not supported".to_string(),
        ));
    }

    let mut decisions = Vec::with_capacity(backups.len());
    for backup in backups {
        match decide_backup(store, confirm, backup, options) {
            Err(e) if options.fail_fast => return Err(e),
            decision => decisions.push((backup, decision)),
        }
    }

    let mut outcomes = Vec::with_capacity(decisions.len());
    for (backup, decision) in decisions {
        let status = match decision {
            Ok(Decision::Apply { policy, summary }) => push_policy(store, policy, summary, options)?,
            Ok(Decision::Skip(reason)) => {
                info!("skipping backup of {}: {}", backup.policy_id, reason);
                RestoreStatus::Skipped(reason)
            }
            Err(e) => {
                error!("failed to restore backup of {}: {}", backup.policy_id, e);
                RestoreStatus::Failed(e)
            }
        };
        outcomes.push(RestoreOutcome {
            source: backup.policy_id.clone(),
            status,
        });
    }

    Ok(outcomes)
}

fn push_policy<S: PolicyStore>(
    store: &S,
    policy: WrappedPolicy,
    summary: Option<PatchSummary>,
    options: &ReconcileOptions,
) -> Result<RestoreStatus> {
    let target = match &options.target {
        Some(target) => target.clone(),
        None => ResourceId::policy(&policy.subscription_id, &policy.resource_group, &policy.name),
    };

    info!("restoring policy {}", target);
    match store.put_policy(&target, &policy.policy, PushMode::Wait) {
        Ok(()) => Ok(RestoreStatus::Applied { target, summary }),
        Err(e) if options.fail_fast => Err(e),
        Err(e) => {
            warn!("failed to push policy {}: {}", target, e);
            Ok(RestoreStatus::Failed(e))
        }
    }
}

fn decide_backup<S: PolicyStore>(
    store: &S,
    confirm: &dyn Confirm,
    backup: &WrappedPolicy,
    options: &ReconcileOptions,
) -> Result<Decision> {
    let match_id = match &options.target {
        Some(target) => target.clone(),
        None => backup.resource_id()?,
    };

    let existing = store
        .get_policy(&match_id)?
        .map(|policy| WrappedPolicy::new(&match_id, policy));

    decide(existing.as_ref(), backup, options, confirm)
}
