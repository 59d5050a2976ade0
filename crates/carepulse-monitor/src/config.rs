use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Default `tracing` directive; `RUST_LOG` directives are applied on top.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// Load the built-in hospital rule set when `rules` is empty.
    #[serde(default = "default_seed_default_rules")]
    pub seed_default_rules: bool,
    #[serde(default)]
    pub sink: SinkKind,
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// One JSON object per alert on stdout.
    Stdout,
    /// Structured `tracing` events.
    #[default]
    Log,
}

/// A rule as written in the config file. Enum-valued fields stay strings
/// here so one bad entry can be reported and skipped instead of failing
/// the whole file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub metric: String,
    pub condition: String,
    pub threshold: f64,
    #[serde(default = "default_priority")]
    pub priority: String,
    #[serde(default = "default_cooldown_minutes")]
    pub cooldown_minutes: u64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_message")]
    pub message: String,
}

/// Wrapper used when writing a standalone rules file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesFile {
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

fn default_log_filter() -> String {
    "carepulse=info".to_string()
}

fn default_seed_default_rules() -> bool {
    true
}

fn default_priority() -> String {
    "MEDIUM".to_string()
}

fn default_cooldown_minutes() -> u64 {
    15
}

fn default_enabled() -> bool {
    true
}

fn default_message() -> String {
    "{metric} is {value} (threshold {threshold})".to_string()
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            seed_default_rules: default_seed_default_rules(),
            sink: SinkKind::default(),
            rules: Vec::new(),
        }
    }
}

impl MonitorConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file '{}'", path.display()))
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }
}
