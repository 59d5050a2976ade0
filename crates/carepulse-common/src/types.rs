use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Point-in-time metric values keyed by metric name.
pub type MetricValues = HashMap<String, f64>;

/// A snapshot delivered by a metrics source.
///
/// `timestamp` is optional so feeds that do not stamp their data can defer
/// to the consumer's clock.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricSnapshot {
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metrics: MetricValues,
}

impl MetricSnapshot {
    pub fn new(metrics: MetricValues) -> Self {
        Self {
            timestamp: None,
            metrics,
        }
    }

    pub fn at(timestamp: DateTime<Utc>, metrics: MetricValues) -> Self {
        Self {
            timestamp: Some(timestamp),
            metrics,
        }
    }
}

/// Alert priority, ordered from lowest to highest.
///
/// Priority is carried from the rule into the triggered alert for display
/// and routing; it never influences whether a rule fires.
///
/// # Examples
///
/// ```
/// use carepulse_common::types::Priority;
///
/// let p: Priority = "high".parse().unwrap();
/// assert_eq!(p, Priority::High);
/// assert_eq!(p.to_string(), "HIGH");
/// assert!(Priority::Critical > Priority::Low);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Low => write!(f, "LOW"),
            Priority::Medium => write!(f, "MEDIUM"),
            Priority::High => write!(f, "HIGH"),
            Priority::Critical => write!(f, "CRITICAL"),
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "LOW" => Ok(Priority::Low),
            "MEDIUM" => Ok(Priority::Medium),
            "HIGH" => Ok(Priority::High),
            "CRITICAL" => Ok(Priority::Critical),
            _ => Err(format!("unknown priority: {s}")),
        }
    }
}

/// Comparator applied to a metric value against a rule threshold.
///
/// Comparisons are strict and use plain floating-point ordering, so a
/// value equal to the threshold never satisfies either condition.
///
/// # Examples
///
/// ```
/// use carepulse_common::types::Condition;
///
/// let c: Condition = "gt".parse().unwrap();
/// assert_eq!(c, Condition::GreaterThan);
/// assert!(c.check(52.0, 45.0));
/// assert!(!c.check(45.0, 45.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    GreaterThan,
    LessThan,
}

impl std::str::FromStr for Condition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "greater_than" | "gt" => Ok(Self::GreaterThan),
            "less_than" | "lt" => Ok(Self::LessThan),
            _ => Err(format!("unknown condition: {s}")),
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GreaterThan => write!(f, "greater_than"),
            Self::LessThan => write!(f, "less_than"),
        }
    }
}

impl Condition {
    pub fn check(&self, value: f64, threshold: f64) -> bool {
        match self {
            Self::GreaterThan => value > threshold,
            Self::LessThan => value < threshold,
        }
    }

    /// Short phrase describing the breach direction, e.g. for log lines.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::GreaterThan => "above",
            Self::LessThan => "below",
        }
    }
}

/// A rule firing, produced by the alert engine and handed to sinks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggeredAlert {
    pub rule_id: String,
    pub metric: String,
    pub condition: Condition,
    pub current_value: f64,
    pub threshold: f64,
    pub priority: Priority,
    /// Rendered rule message, placeholders already substituted.
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Format a metric value for human-readable messages.
///
/// Whole numbers print without a fractional part; everything else is
/// rounded to one decimal place.
///
/// # Examples
///
/// ```
/// use carepulse_common::types::format_value;
///
/// assert_eq!(format_value(52.0), "52");
/// assert_eq!(format_value(87.25), "87.2");
/// ```
pub fn format_value(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}
