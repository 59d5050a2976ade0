//! Alert rule engine for hospital operations metrics.
//!
//! The engine evaluates threshold rules against point-in-time metric
//! snapshots and tracks a per-rule cooldown so a firing rule stays quiet
//! for its configured window. It performs no I/O: callers feed it metric
//! values plus the current time and dispatch the returned alerts
//! themselves.

pub mod clock;
pub mod cooldown;
pub mod engine;
pub mod error;
pub mod rule;

#[cfg(test)]
mod tests;

pub use engine::AlertEngine;
pub use error::AlertError;
pub use rule::{AlertRule, AlertRulePatch};
