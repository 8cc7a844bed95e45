use super::resource_id::ResourceId;
use super::rules::CustomRule;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A WAF policy document in the upstream resource shape.
///
/// Only the custom rule list is modelled; everything else (policy settings,
/// provisioning state, managed rule sets, tags) is carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WafPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub properties: PolicyProperties,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_rules: Option<CustomRuleList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_rules: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomRuleList {
    #[serde(default)]
    pub rules: Vec<CustomRule>,
}

impl WafPolicy {
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::default()
        }
    }

    pub fn custom_rules(&self) -> &[CustomRule] {
        self.properties
            .custom_rules
            .as_ref()
            .map(|list| list.rules.as_slice())
            .unwrap_or(&[])
    }

    pub fn custom_rules_mut(&mut self) -> &mut Vec<CustomRule> {
        &mut self
            .properties
            .custom_rules
            .get_or_insert_with(CustomRuleList::default)
            .rules
    }

    pub fn set_custom_rules(&mut self, rules: Vec<CustomRule>) {
        *self.custom_rules_mut() = rules;
    }

    pub fn managed_rules(&self) -> Option<&Value> {
        self.properties.managed_rules.as_ref()
    }

    pub fn custom_rule(&self, name: &str) -> Option<&CustomRule> {
        self.custom_rules().iter().find(|r| r.name == name)
    }

    /// Sort custom rules by ascending priority. Stable for equal priorities.
    pub fn sort_custom_rules(&mut self) {
        if let Some(list) = self.properties.custom_rules.as_mut() {
            list.rules.sort_by_key(|r| r.priority);
        }
    }
}

/// A policy captured together with where it came from.
///
/// This is the on-disk backup format, one JSON document per file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WrappedPolicy {
    pub date: DateTime<Utc>,
    #[serde(rename = "SubscriptionID")]
    pub subscription_id: String,
    pub resource_group: String,
    pub name: String,
    pub policy: WafPolicy,
    #[serde(rename = "PolicyID")]
    pub policy_id: String,
    #[serde(default)]
    pub app_version: String,
}

impl WrappedPolicy {
    pub fn new(id: &ResourceId, policy: WafPolicy) -> Self {
        Self {
            date: Utc::now(),
            subscription_id: id.subscription_id.clone(),
            resource_group: id.resource_group.clone(),
            name: id.name.clone(),
            policy,
            policy_id: id.to_string(),
            app_version: crate::VERSION.to_string(),
        }
    }

    /// Backup file name: `<subscription>+<resourceGroup>+<name>+<YYYYMMDDhhmmss>.json`
    pub fn file_name(&self) -> String {
        format!(
            "{}+{}+{}+{}.json",
            self.subscription_id,
            self.resource_group,
            self.name,
            self.date.format("%Y%m%d%H%M%S")
        )
    }

    pub fn resource_id(&self) -> crate::Result<ResourceId> {
        self.policy_id.parse()
    }
}
