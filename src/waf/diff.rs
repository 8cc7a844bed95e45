//! Structural comparison of policy documents.
//!
//! Two documents are compared as JSON trees. Every elementary change is an
//! add, remove or replace at a JSON pointer path, and is attributed to a rule
//! category when its path falls under one of the category subtrees in
//! [`RULE_CATEGORIES`]. Array elements are compared by index, so order
//! matters.

use super::policy::WafPolicy;
use crate::error::{Result, WafError};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCategory {
    CustomRule,
    ManagedRule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Add,
    Remove,
    Replace,
}

/// Path prefix → category. A path matches when it equals the prefix or
/// continues it with `/`.
pub const RULE_CATEGORIES: &[(&str, RuleCategory)] = &[
    ("/properties/customRules", RuleCategory::CustomRule),
    ("/properties/managedRules", RuleCategory::ManagedRule),
];

const CUSTOM_RULES_POINTER: &str = "/properties/customRules/rules";

/// Which rule sections an operation is concerned with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuleScope {
    #[default]
    All,
    CustomOnly,
    ManagedOnly,
}

impl RuleScope {
    pub fn from_flags(custom_only: bool, managed_only: bool) -> Result<Self> {
        match (custom_only, managed_only) {
            (false, false) => Ok(Self::All),
            (true, false) => Ok(Self::CustomOnly),
            (false, true) => Ok(Self::ManagedOnly),
            (true, true) => Err(WafError::InvalidScope(
                "custom-only and managed-only are mutually exclusive".to_string(),
            )),
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Self::All => "",
            Self::CustomOnly => "custom ",
            Self::ManagedOnly => "managed ",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub kind: ChangeKind,
    pub path: String,
}

impl Change {
    pub fn category(&self) -> Option<RuleCategory> {
        classify(&self.path)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PatchSummary {
    pub total_differences: usize,
    pub custom_rule_additions: usize,
    pub custom_rule_removals: usize,
    pub custom_rule_replacements: usize,
    pub managed_rule_additions: usize,
    pub managed_rule_removals: usize,
    pub managed_rule_replacements: usize,
}

impl PatchSummary {
    pub fn from_changes(changes: &[Change]) -> Self {
        let mut summary = Self {
            total_differences: changes.len(),
            ..Self::default()
        };

        for change in changes {
            let counter = match (change.category(), change.kind) {
                (Some(RuleCategory::CustomRule), ChangeKind::Add) => &mut summary.custom_rule_additions,
                (Some(RuleCategory::CustomRule), ChangeKind::Remove) => &mut summary.custom_rule_removals,
                (Some(RuleCategory::CustomRule), ChangeKind::Replace) => &mut summary.custom_rule_replacements,
                (Some(RuleCategory::ManagedRule), ChangeKind::Add) => &mut summary.managed_rule_additions,
                (Some(RuleCategory::ManagedRule), ChangeKind::Remove) => &mut summary.managed_rule_removals,
                (Some(RuleCategory::ManagedRule), ChangeKind::Replace) => &mut summary.managed_rule_replacements,
                (None, _) => continue,
            };
            *counter += 1;
        }

        summary
    }

    pub fn custom_rule_changes(&self) -> usize {
        self.custom_rule_additions + self.custom_rule_removals + self.custom_rule_replacements
    }

    pub fn managed_rule_changes(&self) -> usize {
        self.managed_rule_additions + self.managed_rule_removals + self.managed_rule_replacements
    }

    pub fn total_rule_differences(&self) -> usize {
        self.custom_rule_changes() + self.managed_rule_changes()
    }

    /// Changes that matter for an operation limited to `scope`.
    pub fn relevant_changes(&self, scope: RuleScope) -> usize {
        match scope {
            RuleScope::All => self.total_rule_differences(),
            RuleScope::CustomOnly => self.custom_rule_changes(),
            RuleScope::ManagedOnly => self.managed_rule_changes(),
        }
    }
}

/// Diff two typed policies. The candidate's custom rules are put in priority
/// order first; the original is taken as it is.
pub fn diff_policies(original: &WafPolicy, candidate: &WafPolicy) -> Result<PatchSummary> {
    let original = to_value(original)?;
    let mut candidate = candidate.clone();
    candidate.sort_custom_rules();
    let candidate = to_value(&candidate)?;

    Ok(summarize(&original, &candidate))
}

/// Diff two serialized policy documents.
pub fn diff_documents(original: &[u8], candidate: &[u8]) -> Result<PatchSummary> {
    let original: Value = serde_json::from_slice(original)
        .map_err(|e| WafError::Diff(format!("malformed original document: {}", e)))?;
    let mut candidate: Value = serde_json::from_slice(candidate)
        .map_err(|e| WafError::Diff(format!("malformed candidate document: {}", e)))?;

    sort_rules_by_priority(&mut candidate)?;

    Ok(summarize(&original, &candidate))
}

/// Every elementary change turning `original` into `candidate`.
pub fn compare(original: &Value, candidate: &Value) -> Vec<Change> {
    let mut changes = Vec::new();
    compare_at(&mut String::new(), original, candidate, &mut changes);
    changes
}

fn summarize(original: &Value, candidate: &Value) -> PatchSummary {
    let changes = compare(original, candidate);
    for change in &changes {
        trace!("{:?} {}", change.kind, change.path);
    }

    let summary = PatchSummary::from_changes(&changes);
    debug!("patch summary: {:?}", summary);
    summary
}

fn to_value(policy: &WafPolicy) -> Result<Value> {
    serde_json::to_value(policy).map_err(|e| WafError::Diff(format!("failed to serialize policy: {}", e)))
}

fn sort_rules_by_priority(document: &mut Value) -> Result<()> {
    let rules = match document.pointer_mut(CUSTOM_RULES_POINTER) {
        Some(Value::Array(rules)) => rules,
        Some(_) => return Err(WafError::Diff("custom rules is not an array".to_string())),
        None => return Ok(()),
    };

    rules.sort_by_key(|rule| rule.get("priority").and_then(Value::as_i64).unwrap_or(i64::MAX));
    Ok(())
}

fn classify(path: &str) -> Option<RuleCategory> {
    RULE_CATEGORIES.iter().find_map(|(prefix, category)| {
        let rest = path.strip_prefix(prefix)?;
        (rest.is_empty() || rest.starts_with('/')).then_some(*category)
    })
}

fn compare_at(path: &mut String, original: &Value, candidate: &Value, changes: &mut Vec<Change>) {
    if original == candidate {
        return;
    }

    match (original, candidate) {
        (Value::Object(src), Value::Object(tgt)) => {
            for (key, src_value) in src {
                let len = path.len();
                push_token(path, key);
                match tgt.get(key) {
                    Some(tgt_value) => compare_at(path, src_value, tgt_value, changes),
                    None => record(changes, ChangeKind::Remove, path),
                }
                path.truncate(len);
            }

            for key in tgt.keys().filter(|key| !src.contains_key(*key)) {
                let len = path.len();
                push_token(path, key);
                record(changes, ChangeKind::Add, path);
                path.truncate(len);
            }
        }
        (Value::Array(src), Value::Array(tgt)) => {
            let common = src.len().min(tgt.len());

            // removed elements all sit at the first index past the common part
            for _ in common..src.len() {
                let len = path.len();
                push_token(path, &common.to_string());
                record(changes, ChangeKind::Remove, path);
                path.truncate(len);
            }

            for (idx, (src_value, tgt_value)) in src.iter().zip(tgt.iter()).enumerate() {
                let len = path.len();
                push_token(path, &idx.to_string());
                compare_at(path, src_value, tgt_value, changes);
                path.truncate(len);
            }

            for _ in common..tgt.len() {
                let len = path.len();
                push_token(path, "-");
                record(changes, ChangeKind::Add, path);
                path.truncate(len);
            }
        }
        _ => record(changes, ChangeKind::Replace, path),
    }
}

fn push_token(path: &mut String, token: &str) {
    path.push('/');
    path.push_str(&token.replace('~', "~0").replace('/', "~1"));
}

fn record(changes: &mut Vec<Change>, kind: ChangeKind, path: &str) {
    changes.push(Change {
        kind,
        path: path.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waf::rules::{Action, CustomRule};
    use serde_json::json;

    fn rule(name: &str, priority: i32, values: &[&str]) -> CustomRule {
        CustomRule::ip_match(
            name.to_string(),
            priority,
            Action::Block,
            values.iter().map(|v| v.to_string()).collect(),
        )
    }

    fn policy(rules: Vec<CustomRule>, managed: Value) -> WafPolicy {
        let mut policy = WafPolicy::named("pol");
        policy.set_custom_rules(rules);
        policy.properties.managed_rules = Some(managed);
        policy
            .properties
            .extra
            .insert("provisioningState".to_string(), json!("Succeeded"));
        policy
    }

    fn managed(version: &str) -> Value {
        json!({ "managedRuleSets": [{ "ruleSetType": "DefaultRuleSet", "ruleSetVersion": version }] })
    }

    #[test]
    fn test_identical_policies_have_no_changes() {
        let p = policy(vec![rule("BlockNets5000", 5000, &["1.1.1.1/32"])], managed("1.0"));
        let summary = diff_policies(&p, &p).unwrap();
        assert_eq!(summary, PatchSummary::default());
        assert_eq!(summary.total_rule_differences(), 0);
    }

    #[test]
    fn test_match_value_removals_and_managed_replacement() {
        let original = policy(
            vec![
                rule("ManualA", 10, &["1.1.1.1/32", "2.2.2.2/32"]),
                rule("ManualB", 20, &["3.3.3.3/32", "4.4.4.4/32"]),
            ],
            managed("1.0"),
        );
        let candidate = policy(
            vec![
                rule("ManualA", 10, &["1.1.1.1/32"]),
                rule("ManualB", 20, &["3.3.3.3/32"]),
            ],
            managed("1.1"),
        );

        let changes = compare(
            &serde_json::to_value(&original).unwrap(),
            &serde_json::to_value(&candidate).unwrap(),
        );
        let paths: Vec<&str> = changes.iter().map(|c| c.path.as_str()).collect();
        assert!(paths.contains(&"/properties/customRules/rules/0/matchConditions/0/matchValue/1"));
        assert!(paths.contains(&"/properties/managedRules/managedRuleSets/0/ruleSetVersion"));

        let summary = diff_policies(&original, &candidate).unwrap();
        assert_eq!(summary.custom_rule_removals, 2);
        assert_eq!(summary.custom_rule_replacements, 0);
        assert_eq!(summary.custom_rule_changes(), 2);
        assert_eq!(summary.managed_rule_replacements, 1);
        assert_eq!(summary.managed_rule_changes(), 1);
        assert_eq!(summary.total_rule_differences(), 3);
    }

    #[test]
    fn test_out_of_order_candidate_is_sorted_before_compare() {
        let a = rule("ManualA", 10, &["1.1.1.1/32"]);
        let b = rule("BlockNets5000", 5000, &["2.2.2.2/32"]);
        let c = rule("BlockNets5001", 5001, &["3.3.3.3/32"]);

        let original = policy(vec![a.clone(), b.clone()], managed("1.0"));
        let candidate = policy(vec![c, a, b], managed("1.0"));

        let summary = diff_policies(&original, &candidate).unwrap();
        assert_eq!(summary.custom_rule_additions, 1);
        assert_eq!(summary.custom_rule_changes(), 1);
    }

    #[test]
    fn test_changes_outside_rule_sections_not_attributed() {
        let original = policy(vec![], managed("1.0"));
        let mut candidate = original.clone();
        candidate.name = Some("renamed".to_string());
        candidate
            .properties
            .extra
            .insert("provisioningState".to_string(), json!("Updating"));

        let summary = diff_policies(&original, &candidate).unwrap();
        assert_eq!(summary.total_differences, 2);
        assert_eq!(summary.total_rule_differences(), 0);
    }

    #[test]
    fn test_categories_never_cross() {
        let original = policy(vec![rule("A", 1, &["1.1.1.1/32"])], managed("1.0"));
        let mut custom_only = original.clone();
        custom_only.custom_rules_mut()[0].priority = 2;
        let mut managed_only = original.clone();
        managed_only.properties.managed_rules = Some(managed("2.0"));

        let summary = diff_policies(&original, &custom_only).unwrap();
        assert_eq!(summary.custom_rule_replacements, 1);
        assert_eq!(summary.managed_rule_changes(), 0);

        let summary = diff_policies(&original, &managed_only).unwrap();
        assert_eq!(summary.managed_rule_replacements, 1);
        assert_eq!(summary.custom_rule_changes(), 0);
    }

    #[test]
    fn test_section_root_belongs_to_category() {
        let mut original = policy(vec![], managed("1.0"));
        original.properties.managed_rules = None;
        let candidate = policy(vec![], managed("1.0"));

        let summary = diff_policies(&original, &candidate).unwrap();
        assert_eq!(summary.managed_rule_additions, 1);
        assert_eq!(summary.relevant_changes(RuleScope::ManagedOnly), 1);
        assert_eq!(summary.relevant_changes(RuleScope::CustomOnly), 0);
    }

    #[test]
    fn test_array_growth_and_shrink_paths() {
        let changes = compare(&json!({ "a": [1, 2, 3] }), &json!({ "a": [1] }));
        assert_eq!(
            changes,
            vec![
                Change { kind: ChangeKind::Remove, path: "/a/1".to_string() },
                Change { kind: ChangeKind::Remove, path: "/a/1".to_string() },
            ]
        );

        let changes = compare(&json!({ "a": [1] }), &json!({ "a": [9, 2] }));
        assert_eq!(
            changes,
            vec![
                Change { kind: ChangeKind::Replace, path: "/a/0".to_string() },
                Change { kind: ChangeKind::Add, path: "/a/-".to_string() },
            ]
        );
    }

    #[test]
    fn test_pointer_tokens_escaped() {
        let changes = compare(&json!({ "a/b": 1, "c~d": 1 }), &json!({ "a/b": 2 }));
        let paths: Vec<&str> = changes.iter().map(|c| c.path.as_str()).collect();
        assert!(paths.contains(&"/a~1b"));
        assert!(paths.contains(&"/c~0d"));
    }

    #[test]
    fn test_classify_requires_segment_boundary() {
        assert_eq!(classify("/properties/customRules/rules/0"), Some(RuleCategory::CustomRule));
        assert_eq!(classify("/properties/customRules"), Some(RuleCategory::CustomRule));
        assert_eq!(classify("/properties/customRulesExtra"), None);
        assert_eq!(classify("/properties/managedRules/x"), Some(RuleCategory::ManagedRule));
        assert_eq!(classify("/name"), None);
    }

    #[test]
    fn test_diff_documents() {
        let original = br#"{"properties":{"customRules":{"rules":[{"name":"A","priority":1}]}}}"#;
        let candidate = br#"{"properties":{"customRules":{"rules":[{"name":"B","priority":2},{"name":"A","priority":1}]}}}"#;

        let summary = diff_documents(original, candidate).unwrap();
        assert_eq!(summary.custom_rule_additions, 1);
        assert_eq!(summary.custom_rule_changes(), 1);
    }

    #[test]
    fn test_malformed_documents_fail() {
        assert!(matches!(diff_documents(b"{", b"{}"), Err(WafError::Diff(_))));
        assert!(matches!(diff_documents(b"{}", b"not json"), Err(WafError::Diff(_))));
        assert!(matches!(
            diff_documents(b"{}", br#"{"properties":{"customRules":{"rules":5}}}"#),
            Err(WafError::Diff(_))
        ));
    }

    #[test]
    fn test_scope_flags() {
        assert_eq!(RuleScope::from_flags(false, false).unwrap(), RuleScope::All);
        assert_eq!(RuleScope::from_flags(true, false).unwrap(), RuleScope::CustomOnly);
        assert_eq!(RuleScope::from_flags(false, true).unwrap(), RuleScope::ManagedOnly);
        assert!(RuleScope::from_flags(true, true).is_err());
    }
}
