use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Per-rule firing history owned by the engine.
///
/// A rule is in cooldown iff it has fired and less than its cooldown window
/// has elapsed since. Leaving cooldown needs no bookkeeping: later checks
/// simply observe that enough time has passed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooldownState {
    pub rule_id: String,
    pub last_fired_at: Option<DateTime<Utc>>,
    pub fire_count: u64,
}

impl CooldownState {
    pub fn new(rule_id: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.into(),
            last_fired_at: None,
            fire_count: 0,
        }
    }

    pub fn in_cooldown(&self, cooldown: Duration, now: DateTime<Utc>) -> bool {
        self.last_fired_at
            .is_some_and(|last| now - last < cooldown)
    }

    pub fn record_firing(&mut self, now: DateTime<Utc>) {
        self.last_fired_at = Some(now);
        self.fire_count += 1;
    }

    pub fn clear(&mut self) {
        self.last_fired_at = None;
    }

    pub fn status(&self, cooldown: Duration, now: DateTime<Utc>) -> CooldownStatus {
        CooldownStatus::compute(self.last_fired_at, self.fire_count, cooldown, now)
    }
}

/// Read-only view of a rule's cooldown at a given instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CooldownStatus {
    pub in_cooldown: bool,
    /// Fractional minutes until the rule may fire again, never negative.
    pub remaining_minutes: f64,
    /// Earliest instant the rule may fire again. Equals `now` for rules
    /// that never fired.
    pub next_allowed_at: DateTime<Utc>,
    pub last_fired_at: Option<DateTime<Utc>>,
    pub fire_count: u64,
}

impl CooldownStatus {
    pub fn compute(
        last_fired_at: Option<DateTime<Utc>>,
        fire_count: u64,
        cooldown: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        let Some(last) = last_fired_at else {
            return Self {
                in_cooldown: false,
                remaining_minutes: 0.0,
                next_allowed_at: now,
                last_fired_at: None,
                fire_count,
            };
        };

        let next_allowed_at = last
            .checked_add_signed(cooldown)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let remaining = next_allowed_at - now;
        let remaining_minutes = (remaining.num_milliseconds() as f64 / 60_000.0).max(0.0);

        Self {
            in_cooldown: now - last < cooldown,
            remaining_minutes,
            next_allowed_at,
            last_fired_at: Some(last),
            fire_count,
        }
    }
}
