use super::Config;
use crate::waf::{Action, MAX_CUSTOM_RULES};
use anyhow::Result;

pub fn validate_config(config: &Config) -> Result<Vec<String>> {
    let mut warnings = Vec::new();

    if config.subscription_id.is_empty() {
        warnings.push(
            "[!] subscription_id is not set. Commands that list policies will need --subscription-id".to_string(),
        );
    }

    if !config.store.path.is_dir() {
        warnings.push(format!(
            "[!] Policy store directory does not exist: {}",
            config.store.path.display()
        ));
    }

    for action in Action::ALL {
        let max = config.limits.max_rules_for(action);
        if max == 0 || max > MAX_CUSTOM_RULES {
            warnings.push(format!(
                "[X] {}_max_rules must be between 1 and {} (got {})",
                action.as_str().to_lowercase(),
                MAX_CUSTOM_RULES,
                max
            ));
        }
    }

    let combined: usize = Action::ALL
        .iter()
        .map(|action| config.limits.max_rules_for(*action))
        .sum();
    if combined > MAX_CUSTOM_RULES {
        warnings.push(format!(
            "[*] Combined rule limits ({}) exceed the {} custom rules a policy can hold",
            combined, MAX_CUSTOM_RULES
        ));
    }

    if !["trace", "debug", "info", "warn", "error"].contains(&config.logging.level.as_str()) {
        warnings.push(format!(
            "[X] Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
            config.logging.level
        ));
    }

    if !["text", "json", "pretty"].contains(&config.logging.format.as_str()) {
        warnings.push(format!(
            "[X] Invalid log format: {}. Must be 'text', 'json' or 'pretty'",
            config.logging.format
        ));
    }

    Ok(warnings)
}

/// Whether any warning is an error (`[X]`).
pub fn has_errors(warnings: &[String]) -> bool {
    warnings.iter().any(|w| w.starts_with("[X]"))
}
