use crate::error::{Result, WafError};
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

pub const POLICY_PROVIDER: &str = "Microsoft.Network";
pub const POLICY_RESOURCE_TYPE: &str = "frontdoorWebApplicationFirewallPolicies";

lazy_static! {
    static ref RESOURCE_ID_RE: Regex = Regex::new(
        r"(?i)^/subscriptions/(.+?)/resourcegroups/(.+?)/providers/(.+?)/(.+?)/(.+)$"
    )
    .expect("resource id pattern is valid");
}

/// Fully-qualified path of a cloud resource:
/// `/subscriptions/<sub>/resourceGroups/<rg>/providers/<provider>/<type>/<name>`
#[derive(Debug, Clone)]
pub struct ResourceId {
    pub subscription_id: String,
    pub resource_group: String,
    pub provider: String,
    pub resource_type: String,
    pub name: String,
    raw: String,
}

impl ResourceId {
    /// Id of a WAF policy resource.
    pub fn policy(subscription_id: &str, resource_group: &str, name: &str) -> Self {
        let raw = format!(
            "/subscriptions/{}/resourceGroups/{}/providers/{}/{}/{}",
            subscription_id, resource_group, POLICY_PROVIDER, POLICY_RESOURCE_TYPE, name
        );

        Self {
            subscription_id: subscription_id.to_string(),
            resource_group: resource_group.to_string(),
            provider: POLICY_PROVIDER.to_string(),
            resource_type: POLICY_RESOURCE_TYPE.to_string(),
            name: name.to_string(),
            raw,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Split an extended id (`<resource id>|<custom rule name>`).
    pub fn parse_extended(extended: &str) -> Result<(Self, String)> {
        let mut parts = extended.split('|');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(id), Some(rule), None) if !rule.is_empty() => Ok((id.parse()?, rule.to_string())),
            _ => Err(WafError::InvalidResourceId {
                id: extended.to_string(),
                reason: "extended id must be <resource id>|<rule name>".to_string(),
            }),
        }
    }
}

impl FromStr for ResourceId {
    type Err = WafError;

    fn from_str(raw: &str) -> Result<Self> {
        let invalid = |reason: &str| WafError::InvalidResourceId {
            id: raw.to_string(),
            reason: reason.to_string(),
        };

        if raw.contains('|') {
            return Err(invalid("unexpected '|' in resource id"));
        }

        let components: Vec<&str> = raw.split('/').collect();
        if components.len() != 9 {
            return Err(invalid("resource id has incorrect number of sections"));
        }

        if !RESOURCE_ID_RE.is_match(raw) {
            return Err(invalid("resource id has invalid format"));
        }

        Ok(Self {
            subscription_id: components[2].to_string(),
            resource_group: components[4].to_string(),
            provider: components[6].to_string(),
            resource_type: components[7].to_string(),
            name: components[8].to_string(),
            raw: raw.to_string(),
        })
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

// Resource ids are case-insensitive upstream.
impl PartialEq for ResourceId {
    fn eq(&self, other: &Self) -> bool {
        self.raw.eq_ignore_ascii_case(&other.raw)
    }
}

impl Eq for ResourceId {}
