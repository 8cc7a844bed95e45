use crate::error::WafError;
use crate::ipset::IpSet;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Upstream hard limit on IPMatch values per rule
pub const MAX_IP_MATCH_VALUES: usize = 600;

/// Upstream hard limit on custom rules per policy
pub const MAX_CUSTOM_RULES: usize = 90;

// Priority bands:
// - Log:   manual 0-999,     generated 1000-1999
// - Allow: manual 2000-2999, generated 3000-3999
// - Block: manual 4000-4999, generated 5000-5999

/// What a compiled set of IP rules does with matching requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    #[serde(alias = "Log")]
    Log,
    #[serde(alias = "Allow")]
    Allow,
    #[serde(alias = "Block")]
    Block,
}

/// Fixed configuration owned by each action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionSpec {
    pub rule_prefix: &'static str,
    pub priority_start: i32,
    pub default_max_rules: usize,
}

const LOG_NETS: ActionSpec = ActionSpec {
    rule_prefix: "LogNets",
    priority_start: 1000,
    default_max_rules: 10,
};

const ALLOW_NETS: ActionSpec = ActionSpec {
    rule_prefix: "AllowNets",
    priority_start: 3000,
    default_max_rules: 10,
};

const BLOCK_NETS: ActionSpec = ActionSpec {
    rule_prefix: "BlockNets",
    priority_start: 5000,
    default_max_rules: 40,
};

impl Action {
    pub const ALL: [Action; 3] = [Action::Log, Action::Allow, Action::Block];

    pub fn spec(self) -> &'static ActionSpec {
        match self {
            Self::Log => &LOG_NETS,
            Self::Allow => &ALLOW_NETS,
            Self::Block => &BLOCK_NETS,
        }
    }

    pub fn rule_prefix(self) -> &'static str {
        self.spec().rule_prefix
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Log => "Log",
            Self::Allow => "Allow",
            Self::Block => "Block",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = WafError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "log" => Ok(Self::Log),
            "allow" => Ok(Self::Allow),
            "block" => Ok(Self::Block),
            _ => Err(WafError::UnsupportedAction(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomRule {
    pub name: String,
    pub priority: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub match_conditions: Vec<MatchCondition>,
    pub action: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchCondition {
    pub match_variable: String,
    pub operator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negate_condition: Option<bool>,
    #[serde(default)]
    pub match_value: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transforms: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CustomRule {
    /// An enabled rule matching the remote address against `values`.
    pub fn ip_match(name: String, priority: i32, action: Action, values: Vec<String>) -> Self {
        Self {
            name,
            priority,
            enabled_state: Some("Enabled".to_string()),
            rule_type: Some("MatchRule".to_string()),
            match_conditions: vec![MatchCondition {
                match_variable: "RemoteAddr".to_string(),
                operator: "IPMatch".to_string(),
                negate_condition: Some(false),
                match_value: values,
                transforms: Some(Vec::new()),
                extra: Map::new(),
            }],
            action: action.as_str().to_string(),
            extra: Map::new(),
        }
    }

    pub fn match_value_count(&self) -> usize {
        self.match_conditions.iter().map(|mc| mc.match_value.len()).sum()
    }
}

/// Compile networks into priority-ordered IP match rules for `action`.
///
/// Networks are split, in insertion order, into chunks of at most
/// [`MAX_IP_MATCH_VALUES`]. Rule `n` gets priority `priority_start + n` and is
/// named `<prefix><priority>`. At most `max_rules` rules are produced; zero
/// means no limit beyond the number of chunks.
pub fn compile_rules(ipset: &IpSet, action: Action, max_rules: usize) -> Vec<CustomRule> {
    let spec = action.spec();
    let values = IpSet::dedupe(ipset.iter().copied()).to_strings();
    let limit = if max_rules == 0 { usize::MAX } else { max_rules };

    let rules: Vec<CustomRule> = values
        .chunks(MAX_IP_MATCH_VALUES)
        .take(limit)
        .enumerate()
        .map(|(idx, chunk)| {
            let priority = spec.priority_start + idx as i32;
            let name = format!("{}{}", spec.rule_prefix, priority);
            CustomRule::ip_match(name, priority, action, chunk.to_vec())
        })
        .collect();

    debug!(
        "compiled {} networks into {} {} rules",
        values.len(),
        rules.len(),
        action
    );

    rules
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipset::parse_network;
    use std::collections::HashSet;

    fn host_set(count: u32) -> IpSet {
        (0..count)
            .map(|i| parse_network(&format!("10.{}.{}.{}", i >> 16 & 0xff, i >> 8 & 0xff, i & 0xff)).unwrap())
            .collect()
    }

    #[test]
    fn test_action_from_str() {
        assert_eq!("Block".parse::<Action>().unwrap(), Action::Block);
        assert_eq!("allow".parse::<Action>().unwrap(), Action::Allow);
        assert_eq!("LOG".parse::<Action>().unwrap(), Action::Log);

        let err = "Deny".parse::<Action>().unwrap_err();
        assert!(matches!(err, WafError::UnsupportedAction(ref a) if a == "Deny"));
    }

    #[test]
    fn test_action_table() {
        assert_eq!(Action::Block.rule_prefix(), "BlockNets");
        assert_eq!(Action::Allow.spec().priority_start, 3000);
        assert_eq!(Action::Log.spec().default_max_rules, 10);
        assert_eq!(Action::Block.spec().default_max_rules, 40);
    }

    #[test]
    fn test_unbounded_compile_splits_into_chunks() {
        let set = host_set(2046);
        let rules = compile_rules(&set, Action::Block, 0);

        assert_eq!(rules.len(), 4);
        let sizes: Vec<usize> = rules.iter().map(|r| r.match_value_count()).collect();
        assert_eq!(sizes, vec![600, 600, 600, 246]);

        let priorities: Vec<i32> = rules.iter().map(|r| r.priority).collect();
        assert_eq!(priorities, vec![5000, 5001, 5002, 5003]);
        assert_eq!(rules[0].name, "BlockNets5000");
        assert_eq!(rules[3].name, "BlockNets5003");
    }

    #[test]
    fn test_max_rules_discards_trailing_chunks() {
        let set = host_set(2046);
        let rules = compile_rules(&set, Action::Block, 3);

        assert_eq!(rules.len(), 3);
        assert_eq!(rules[2].priority, 5002);
        assert!(rules.iter().all(|r| r.match_value_count() == 600));
    }

    #[test]
    fn test_priorities_contiguous_and_names_unique() {
        for action in Action::ALL {
            let rules = compile_rules(&host_set(1900), action, 0);
            let start = action.spec().priority_start;

            for (idx, rule) in rules.iter().enumerate() {
                assert_eq!(rule.priority, start + idx as i32);
                assert_eq!(rule.name, format!("{}{}", action.rule_prefix(), rule.priority));
                assert_eq!(rule.action, action.as_str());
                assert!(rule.match_value_count() <= MAX_IP_MATCH_VALUES);
            }

            let names: HashSet<&str> = rules.iter().map(|r| r.name.as_str()).collect();
            assert_eq!(names.len(), rules.len());
        }
    }

    #[test]
    fn test_compile_is_deterministic() {
        let set = host_set(1234);
        let first = serde_json::to_vec(&compile_rules(&set, Action::Allow, 0)).unwrap();
        let second = serde_json::to_vec(&compile_rules(&set, Action::Allow, 0)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_exact_chunk_boundary() {
        let rules = compile_rules(&host_set(1200), Action::Log, 0);
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[1].match_value_count(), 600);
    }

    #[test]
    fn test_empty_set_yields_no_rules() {
        assert!(compile_rules(&IpSet::new(), Action::Block, 10).is_empty());
    }

    #[test]
    fn test_generated_rule_shape() {
        let set: IpSet = vec![parse_network("1.2.3.4").unwrap()].into_iter().collect();
        let rules = compile_rules(&set, Action::Block, 1);
        let value = serde_json::to_value(&rules[0]).unwrap();

        assert_eq!(value["ruleType"], "MatchRule");
        assert_eq!(value["enabledState"], "Enabled");
        assert_eq!(value["action"], "Block");
        assert_eq!(value["matchConditions"][0]["matchVariable"], "RemoteAddr");
        assert_eq!(value["matchConditions"][0]["operator"], "IPMatch");
        assert_eq!(value["matchConditions"][0]["negateCondition"], false);
        assert_eq!(value["matchConditions"][0]["matchValue"][0], "1.2.3.4/32");
    }
}
