use super::replace_rules;
use crate::error::{Result, WafError};
use crate::store::{PolicyStore, PushMode};
use crate::waf::{check_rule_limit, diff_policies, PatchSummary, ResourceId, RuleScope, WrappedPolicy};
use tracing::{debug, info};

/// Copy the rules named by `scope` from `source` into `target` and push the result.
///
/// Both policies must exist. A copy that would change nothing in the
/// requested scope is refused with `NoChanges`.
pub fn copy_rules<S: PolicyStore>(
    store: &S,
    source: &ResourceId,
    target: &ResourceId,
    scope: RuleScope,
    mode: PushMode,
) -> Result<PatchSummary> {
    if source == target {
        return Err(WafError::InvalidScope("source and target must be different".to_string()));
    }

    debug!("copy source: {}", source);
    debug!("copy target: {}", target);

    let source_policy = fetch(store, source)?;
    let target_policy = fetch(store, target)?;

    let summary = diff_policies(&target_policy.policy, &source_policy.policy)?;
    if summary.relevant_changes(scope) == 0 {
        let reason = match scope {
            RuleScope::CustomOnly => "custom rules are already identical",
            RuleScope::ManagedOnly => "managed rules are already identical",
            RuleScope::All => "rules are already identical",
        };
        return Err(WafError::NoChanges(reason.to_string()));
    }

    let updated = replace_rules(&target_policy, &source_policy, scope);
    check_rule_limit(&updated.policy)?;

    store.put_policy(target, &updated.policy, mode)?;
    info!(
        "copied {}rules from {} to {} ({} changes)",
        scope.describe(),
        source,
        target,
        summary.relevant_changes(scope)
    );

    Ok(summary)
}

fn fetch<S: PolicyStore>(store: &S, id: &ResourceId) -> Result<WrappedPolicy> {
    store
        .get_policy(id)?
        .map(|policy| WrappedPolicy::new(id, policy))
        .ok_or_else(|| WafError::TargetNotFound(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::fixtures::*;
    use crate::store::MemoryPolicyStore;

    fn seeded() -> (MemoryPolicyStore, ResourceId, ResourceId) {
        let source = ResourceId::policy("sub", "rg", "source");
        let target = ResourceId::policy("sub", "rg", "target");
        let store = MemoryPolicyStore::new();
        store.insert(source.clone(), policy_two(&source).policy);
        store.insert(target.clone(), policy_one(&target).policy);
        (store, source, target)
    }

    #[test]
    fn test_same_source_and_target_rejected() {
        let store = MemoryPolicyStore::new();
        let a = ResourceId::policy("sub", "rg", "pol");
        let b = ResourceId::policy("SUB", "RG", "POL");

        let err = copy_rules(&store, &a, &b, RuleScope::All, PushMode::Wait).unwrap_err();
        assert!(matches!(err, WafError::InvalidScope(_)));
    }

    #[test]
    fn test_missing_policies() {
        let (store, source, _) = seeded();
        let missing = ResourceId::policy("sub", "rg", "missing");

        let err = copy_rules(&store, &missing, &source, RuleScope::All, PushMode::Wait).unwrap_err();
        assert!(matches!(err, WafError::TargetNotFound(id) if id.ends_with("/missing")));

        let err = copy_rules(&store, &source, &missing, RuleScope::All, PushMode::Wait).unwrap_err();
        assert!(matches!(err, WafError::TargetNotFound(_)));
        assert!(store.pushes().is_empty());
    }

    #[test]
    fn test_copy_custom_rules_only() {
        let (store, source, target) = seeded();

        let summary = copy_rules(&store, &source, &target, RuleScope::CustomOnly, PushMode::NoWait).unwrap();
        assert_eq!(summary.custom_rule_changes(), 2);

        let updated = store.get_policy(&target).unwrap().unwrap();
        assert_eq!(updated.custom_rules(), policy_two(&source).policy.custom_rules());
        assert_eq!(updated.managed_rules(), policy_one(&target).policy.managed_rules());
        assert_eq!(updated.name.as_deref(), Some("target"));
        assert_eq!(store.pushes(), vec![(target, PushMode::NoWait)]);
    }

    #[test]
    fn test_copy_everything() {
        let (store, source, target) = seeded();

        copy_rules(&store, &source, &target, RuleScope::All, PushMode::Wait).unwrap();

        let updated = store.get_policy(&target).unwrap().unwrap();
        let expected = policy_two(&source).policy;
        assert_eq!(updated.custom_rules(), expected.custom_rules());
        assert_eq!(updated.managed_rules(), expected.managed_rules());
    }

    #[test]
    fn test_identical_rules_refused() {
        let (store, source, target) = seeded();
        store.insert(target.clone(), policy_two(&target).policy);

        let err = copy_rules(&store, &source, &target, RuleScope::ManagedOnly, PushMode::Wait).unwrap_err();
        assert!(matches!(err, WafError::NoChanges(msg) if msg.contains("managed")));
        assert!(store.pushes().is_empty());
    }
}
