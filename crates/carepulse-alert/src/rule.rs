use crate::error::{AlertError, Result};
use carepulse_common::types::{format_value, Condition, Priority, TriggeredAlert};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

const MAX_COOLDOWN_MINUTES: i64 = i64::MAX / 60_000;

/// A threshold condition over a single metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRule {
    pub id: String,
    /// Optional display name; empty when the rule is only known by id.
    #[serde(default)]
    pub name: String,
    pub metric: String,
    pub condition: Condition,
    pub threshold: f64,
    pub priority: Priority,
    pub cooldown_minutes: u64,
    pub enabled: bool,
    /// Message template. Supports `{metric}`, `{value}`, `{threshold}`,
    /// `{rule_id}` and `{priority}` placeholders.
    pub message: String,
}

impl AlertRule {
    pub fn new(
        id: impl Into<String>,
        metric: impl Into<String>,
        condition: Condition,
        threshold: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            metric: metric.into(),
            condition,
            threshold,
            priority: Priority::Medium,
            cooldown_minutes: 0,
            enabled: true,
            message: String::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_cooldown_minutes(mut self, minutes: u64) -> Self {
        self.cooldown_minutes = minutes;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Cooldown window as a duration, saturating at the largest span chrono
    /// can represent.
    pub fn cooldown(&self) -> Duration {
        let minutes = i64::try_from(self.cooldown_minutes)
            .unwrap_or(MAX_COOLDOWN_MINUTES)
            .min(MAX_COOLDOWN_MINUTES);
        Duration::minutes(minutes)
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(AlertError::InvalidRule {
                id: self.id.clone(),
                reason: "id must not be empty".to_string(),
            });
        }
        if !self.threshold.is_finite() {
            return Err(AlertError::InvalidRule {
                id: self.id.clone(),
                reason: format!("threshold must be finite, got {}", self.threshold),
            });
        }
        Ok(())
    }

    /// Returns true when `value` breaches the threshold. Disabled state is
    /// not considered here.
    pub fn matches(&self, value: f64) -> bool {
        self.condition.check(value, self.threshold)
    }

    /// Substitute placeholders in a single pass over the template, so text
    /// coming from a substituted field is never expanded again.
    pub fn render_message(&self, value: f64) -> String {
        let mut out = String::with_capacity(self.message.len());
        let mut rest = self.message.as_str();

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let tail = &rest[open..];
            let Some(close) = tail.find('}') else {
                out.push_str(tail);
                return out;
            };
            match &tail[1..close] {
                "metric" => out.push_str(&self.metric),
                "value" => out.push_str(&format_value(value)),
                "threshold" => out.push_str(&format_value(self.threshold)),
                "rule_id" => out.push_str(&self.id),
                "priority" => out.push_str(&self.priority.to_string()),
                // Not a placeholder: emit the brace and rescan after it
                _ => {
                    out.push('{');
                    rest = &tail[1..];
                    continue;
                }
            }
            rest = &tail[close + 1..];
        }
        out.push_str(rest);
        out
    }

    pub(crate) fn trigger(&self, value: f64, now: DateTime<Utc>) -> TriggeredAlert {
        TriggeredAlert {
            rule_id: self.id.clone(),
            metric: self.metric.clone(),
            condition: self.condition,
            current_value: value,
            threshold: self.threshold,
            priority: self.priority,
            message: self.render_message(value),
            timestamp: now,
        }
    }

    /// Returns a copy of this rule with every `Some` field of `patch` applied.
    pub fn merged(&self, patch: &AlertRulePatch) -> AlertRule {
        let mut rule = self.clone();
        if let Some(name) = &patch.name {
            rule.name = name.clone();
        }
        if let Some(metric) = &patch.metric {
            rule.metric = metric.clone();
        }
        if let Some(condition) = patch.condition {
            rule.condition = condition;
        }
        if let Some(threshold) = patch.threshold {
            rule.threshold = threshold;
        }
        if let Some(priority) = patch.priority {
            rule.priority = priority;
        }
        if let Some(minutes) = patch.cooldown_minutes {
            rule.cooldown_minutes = minutes;
        }
        if let Some(enabled) = patch.enabled {
            rule.enabled = enabled;
        }
        if let Some(message) = &patch.message {
            rule.message = message.clone();
        }
        rule
    }
}

/// Partial update for an [`AlertRule`]. The id cannot be changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertRulePatch {
    pub name: Option<String>,
    pub metric: Option<String>,
    pub condition: Option<Condition>,
    pub threshold: Option<f64>,
    pub priority: Option<Priority>,
    pub cooldown_minutes: Option<u64>,
    pub enabled: Option<bool>,
    pub message: Option<String>,
}

impl AlertRulePatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
