use crate::clock::Clock;
use crate::cooldown::{CooldownState, CooldownStatus};
use crate::error::{AlertError, Result};
use crate::rule::{AlertRule, AlertRulePatch};
use carepulse_common::types::{MetricValues, TriggeredAlert};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

/// Evaluates threshold rules against metric snapshots and enforces a
/// per-rule cooldown.
///
/// Rules are evaluated in registration order. The engine does no locking;
/// every mutation takes `&mut self`, so hosts sharing it between tasks wrap
/// it in a `Mutex`.
pub struct AlertEngine {
    rules: Vec<AlertRule>,
    cooldowns: HashMap<String, CooldownState>,
}

impl AlertEngine {
    pub fn new(rules: Vec<AlertRule>) -> Result<Self> {
        check_rule_set(&rules)?;
        Ok(Self {
            rules,
            cooldowns: HashMap::new(),
        })
    }

    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            cooldowns: HashMap::new(),
        }
    }

    pub fn rules(&self) -> &[AlertRule] {
        &self.rules
    }

    /// Get a rule by its ID.
    pub fn get_rule(&self, id: &str) -> Option<&AlertRule> {
        self.rules.iter().find(|r| r.id == id)
    }

    pub fn cooldown_state(&self, id: &str) -> Option<&CooldownState> {
        self.cooldowns.get(id)
    }

    /// Register a new rule at the end of the evaluation order.
    pub fn add_rule(&mut self, rule: AlertRule) -> Result<()> {
        if self.get_rule(&rule.id).is_some() {
            return Err(AlertError::DuplicateRule(rule.id));
        }
        rule.validate()?;
        tracing::info!(rule_id = %rule.id, metric = %rule.metric, "Alert rule added");
        self.rules.push(rule);
        Ok(())
    }

    /// Remove a rule and its cooldown state, returning the removed rule.
    pub fn remove_rule(&mut self, id: &str) -> Result<AlertRule> {
        let pos = self
            .rules
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| AlertError::NotFound(id.to_string()))?;
        let rule = self.rules.remove(pos);
        self.cooldowns.remove(id);
        tracing::info!(rule_id = %id, "Alert rule removed");
        Ok(rule)
    }

    /// Merge `patch` into an existing rule. Cooldown state is left alone,
    /// so a changed cooldown applies from the existing `last_fired_at`.
    pub fn update_rule(&mut self, id: &str, patch: AlertRulePatch) -> Result<()> {
        let rule = self
            .rules
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AlertError::NotFound(id.to_string()))?;
        let merged = rule.merged(&patch);
        merged.validate()?;
        *rule = merged;
        tracing::info!(rule_id = %id, "Alert rule updated");
        Ok(())
    }

    /// Replace all rules with a new set, discarding every cooldown.
    pub fn replace_rules(&mut self, rules: Vec<AlertRule>) -> Result<()> {
        check_rule_set(&rules)?;
        self.rules = rules;
        self.cooldowns.clear();
        Ok(())
    }

    /// Allow the rule to fire on its next breach regardless of its window.
    pub fn clear_cooldown(&mut self, id: &str) -> Result<()> {
        if self.get_rule(id).is_none() {
            return Err(AlertError::NotFound(id.to_string()));
        }
        if let Some(state) = self.cooldowns.get_mut(id) {
            state.clear();
        }
        tracing::debug!(rule_id = %id, "Cooldown cleared");
        Ok(())
    }

    pub fn evaluate(&mut self, metrics: &MetricValues, now: DateTime<Utc>) -> Vec<TriggeredAlert> {
        let mut alerts = Vec::new();

        for rule in &self.rules {
            if !rule.enabled {
                continue;
            }

            // Absent data is not evidence of a breach.
            let Some(&value) = metrics.get(&rule.metric) else {
                continue;
            };

            let state = self
                .cooldowns
                .entry(rule.id.clone())
                .or_insert_with(|| CooldownState::new(rule.id.clone()));

            if state.in_cooldown(rule.cooldown(), now) {
                if rule.matches(value) {
                    tracing::debug!(
                        rule_id = %rule.id,
                        metric = %rule.metric,
                        value,
                        "Alert suppressed (cooldown)"
                    );
                }
                continue;
            }

            if !rule.matches(value) {
                continue;
            }

            state.record_firing(now);
            tracing::info!(
                rule_id = %rule.id,
                metric = %rule.metric,
                value,
                threshold = rule.threshold,
                priority = %rule.priority,
                "Alert fired ({} threshold)",
                rule.condition.describe()
            );
            alerts.push(rule.trigger(value, now));
        }

        alerts
    }

    /// Evaluate using the clock's current time.
    pub fn evaluate_with(&mut self, metrics: &MetricValues, clock: &dyn Clock) -> Vec<TriggeredAlert> {
        self.evaluate(metrics, clock.now())
    }

    /// Cooldown view of every registered rule at `now`. Does not mutate.
    pub fn cooldown_status(&self, now: DateTime<Utc>) -> BTreeMap<String, CooldownStatus> {
        self.rules
            .iter()
            .map(|rule| {
                let status = match self.cooldowns.get(&rule.id) {
                    Some(state) => state.status(rule.cooldown(), now),
                    None => CooldownStatus::compute(None, 0, rule.cooldown(), now),
                };
                (rule.id.clone(), status)
            })
            .collect()
    }
}

impl Default for AlertEngine {
    fn default() -> Self {
        Self::empty()
    }
}

fn check_rule_set(rules: &[AlertRule]) -> Result<()> {
    let mut seen = std::collections::HashSet::with_capacity(rules.len());
    for rule in rules {
        if !seen.insert(rule.id.as_str()) {
            return Err(AlertError::DuplicateRule(rule.id.clone()));
        }
        rule.validate()?;
    }
    Ok(())
}
