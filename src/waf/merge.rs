use super::policy::WafPolicy;
use super::rules::{Action, CustomRule, MAX_CUSTOM_RULES};
use crate::error::{Result, WafError};
use tracing::debug;

/// Replace the rules previously generated for `action` with `new_rules`.
///
/// Every existing rule whose name starts with the action's prefix is removed
/// and `new_rules` are appended after the remaining rules. Other rules are
/// passed through unchanged. Fails with `RuleLimitExceeded` if the result
/// holds more than [`MAX_CUSTOM_RULES`] rules.
///
/// Removal is by name prefix only: a manual rule named e.g. `BlockNetsLegacy`
/// is swept up together with the generated ones.
pub fn merge_rules(
    mut policy: WafPolicy,
    new_rules: Vec<CustomRule>,
    action: Action,
) -> Result<WafPolicy> {
    let removed = remove_rules_with_prefix(&mut policy, action.rule_prefix());
    debug!(
        "replacing {} existing {} rules with {} new rules",
        removed,
        action,
        new_rules.len()
    );

    policy.custom_rules_mut().extend(new_rules);
    check_rule_limit(&policy)?;

    Ok(policy)
}

/// Remove every custom rule whose name starts with `prefix`, returning how many went.
pub fn remove_rules_with_prefix(policy: &mut WafPolicy, prefix: &str) -> usize {
    let rules = policy.custom_rules_mut();
    let before = rules.len();
    rules.retain(|rule| !rule.name.starts_with(prefix));
    before - rules.len()
}

pub fn check_rule_limit(policy: &WafPolicy) -> Result<()> {
    let count = policy.custom_rules().len();
    if count > MAX_CUSTOM_RULES {
        return Err(WafError::RuleLimitExceeded {
            count,
            limit: MAX_CUSTOM_RULES,
        });
    }
    Ok(())
}
