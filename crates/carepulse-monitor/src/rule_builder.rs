use crate::config::{MonitorConfig, RuleConfig};
use crate::rule_seed;
use carepulse_alert::{AlertEngine, AlertRule};
use carepulse_common::types::{Condition, Priority};
use std::collections::HashSet;

/// Convert a single config entry into an [`AlertRule`].
pub fn build_rule_from_config(cfg: &RuleConfig) -> anyhow::Result<AlertRule> {
    let condition: Condition = cfg
        .condition
        .parse()
        .map_err(|e: String| anyhow::anyhow!("{e}"))?;
    let priority: Priority = cfg
        .priority
        .parse()
        .map_err(|e: String| anyhow::anyhow!("{e}"))?;

    let rule = AlertRule::new(cfg.id.clone(), cfg.metric.clone(), condition, cfg.threshold)
        .with_name(cfg.name.clone())
        .with_priority(priority)
        .with_cooldown_minutes(cfg.cooldown_minutes)
        .with_enabled(cfg.enabled)
        .with_message(cfg.message.clone());
    rule.validate()?;
    Ok(rule)
}

/// Convert multiple entries, skipping invalid ones and repeated ids with warnings.
pub fn build_rules_from_configs(configs: &[RuleConfig]) -> Vec<AlertRule> {
    let mut rules = Vec::with_capacity(configs.len());
    let mut seen = HashSet::with_capacity(configs.len());
    for cfg in configs {
        if !seen.insert(cfg.id.as_str()) {
            tracing::warn!(rule_id = %cfg.id, "Skipping alert rule with duplicate id");
            continue;
        }
        match build_rule_from_config(cfg) {
            Ok(rule) => rules.push(rule),
            Err(e) => {
                tracing::warn!(
                    rule_id = %cfg.id,
                    metric = %cfg.metric,
                    error = %e,
                    "Skipping invalid alert rule"
                );
            }
        }
    }
    rules
}

/// Build an engine from the config, falling back to the default rule set
/// when none are configured and seeding is enabled.
pub fn build_engine(config: &MonitorConfig) -> anyhow::Result<AlertEngine> {
    let rules = if config.rules.is_empty() && config.seed_default_rules {
        tracing::info!("No rules configured, loading default rule set");
        build_rules_from_configs(&rule_seed::default_rule_configs())
    } else {
        build_rules_from_configs(&config.rules)
    };

    let count = rules.len();
    let engine = AlertEngine::new(rules)?;
    tracing::info!(count, "Alert engine loaded");
    Ok(engine)
}
