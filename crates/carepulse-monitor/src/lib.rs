//! Host side of the alert core: loads rule configuration, reads metric
//! snapshots from a JSON-lines feed, runs them through the
//! [`carepulse_alert::AlertEngine`] and hands triggered alerts to a sink.

pub mod config;
pub mod feed;
pub mod monitor;
pub mod rule_builder;
pub mod rule_seed;
pub mod sink;
