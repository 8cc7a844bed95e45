pub mod diff;
pub mod merge;
pub mod policy;
pub mod resource_id;
pub mod rules;

pub use diff::{diff_documents, diff_policies, PatchSummary, RuleCategory, RuleScope};
pub use merge::{check_rule_limit, merge_rules, remove_rules_with_prefix};
pub use policy::{WafPolicy, WrappedPolicy};
pub use resource_id::ResourceId;
pub use rules::{compile_rules, Action, CustomRule, MAX_CUSTOM_RULES, MAX_IP_MATCH_VALUES};
