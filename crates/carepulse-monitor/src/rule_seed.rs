use crate::config::{RuleConfig, RulesFile};
use carepulse_common::metrics;

/// Built-in hospital operations rules, used when the config defines none.
struct RuleDef {
    id: &'static str,
    name: &'static str,
    metric: &'static str,
    condition: &'static str,
    threshold: f64,
    priority: &'static str,
    cooldown_minutes: u64,
    message: &'static str,
}

const DEFAULT_RULES: &[RuleDef] = &[
    // ---- Patient flow ----
    RuleDef {
        id: "wait-time-high",
        name: "Emergency wait time high",
        metric: metrics::AVG_WAIT_TIME,
        condition: "greater_than",
        threshold: 45.0,
        priority: "HIGH",
        cooldown_minutes: 30,
        message: "Average wait time is {value} min, above the {threshold} min target",
    },
    // ---- Capacity ----
    RuleDef {
        id: "bed-utilization-warning",
        name: "Bed utilization warning",
        metric: metrics::BED_UTILIZATION,
        condition: "greater_than",
        threshold: 85.0,
        priority: "MEDIUM",
        cooldown_minutes: 60,
        message: "Bed utilization at {value}% (warning above {threshold}%)",
    },
    RuleDef {
        id: "bed-utilization-critical",
        name: "Bed utilization critical",
        metric: metrics::BED_UTILIZATION,
        condition: "greater_than",
        threshold: 95.0,
        priority: "CRITICAL",
        cooldown_minutes: 30,
        message: "Bed utilization at {value}%, capacity nearly exhausted",
    },
    RuleDef {
        id: "er-occupancy-high",
        name: "ER occupancy high",
        metric: metrics::ER_OCCUPANCY,
        condition: "greater_than",
        threshold: 90.0,
        priority: "HIGH",
        cooldown_minutes: 30,
        message: "ER occupancy at {value}%",
    },
    // ---- Staffing ----
    RuleDef {
        id: "staff-low",
        name: "Staffing below minimum",
        metric: metrics::STAFF_ON_DUTY,
        condition: "less_than",
        threshold: 25.0,
        priority: "HIGH",
        cooldown_minutes: 120,
        message: "Only {value} staff on duty (minimum {threshold})",
    },
    // ---- Quality ----
    RuleDef {
        id: "satisfaction-low",
        name: "Patient satisfaction dropping",
        metric: metrics::PATIENT_SATISFACTION,
        condition: "less_than",
        threshold: 80.0,
        priority: "LOW",
        cooldown_minutes: 240,
        message: "Patient satisfaction score fell to {value}",
    },
];

pub fn default_rule_configs() -> Vec<RuleConfig> {
    DEFAULT_RULES
        .iter()
        .map(|def| RuleConfig {
            id: def.id.to_string(),
            name: def.name.to_string(),
            metric: def.metric.to_string(),
            condition: def.condition.to_string(),
            threshold: def.threshold,
            priority: def.priority.to_string(),
            cooldown_minutes: def.cooldown_minutes,
            enabled: true,
            message: def.message.to_string(),
        })
        .collect()
}

/// Render the default rules as a TOML `[[rules]]` document, suitable for
/// pasting into a config file.
pub fn default_rules_toml() -> anyhow::Result<String> {
    let file = RulesFile {
        rules: default_rule_configs(),
    };
    Ok(toml::to_string_pretty(&file)?)
}
