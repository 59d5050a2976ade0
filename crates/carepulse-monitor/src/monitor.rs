use crate::feed::parse_snapshot_line;
use crate::sink::AlertSink;
use carepulse_alert::clock::Clock;
use carepulse_alert::AlertEngine;
use carepulse_common::types::{MetricSnapshot, TriggeredAlert};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::signal;

/// Counters reported when the feed ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorStats {
    pub snapshots: u64,
    pub skipped_lines: u64,
    pub alerts: u64,
    pub dispatch_failures: u64,
}

/// Owns the engine and serializes every evaluation through `&mut self`.
pub struct Monitor {
    engine: AlertEngine,
    sink: Box<dyn AlertSink>,
    clock: Arc<dyn Clock>,
    stats: MonitorStats,
}

impl Monitor {
    pub fn new(engine: AlertEngine, sink: Box<dyn AlertSink>, clock: Arc<dyn Clock>) -> Self {
        Self {
            engine,
            sink,
            clock,
            stats: MonitorStats::default(),
        }
    }

    pub fn engine(&self) -> &AlertEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut AlertEngine {
        &mut self.engine
    }

    pub fn stats(&self) -> MonitorStats {
        self.stats
    }

    /// Evaluate one snapshot and dispatch whatever fired. Snapshots without
    /// a timestamp are evaluated at the clock's current time.
    pub fn process_snapshot(&mut self, snapshot: &MetricSnapshot) -> Vec<TriggeredAlert> {
        let now = snapshot.timestamp.unwrap_or_else(|| self.clock.now());
        self.stats.snapshots += 1;

        let alerts = self.engine.evaluate(&snapshot.metrics, now);
        for alert in &alerts {
            self.stats.alerts += 1;
            if let Err(e) = self.sink.dispatch(alert) {
                self.stats.dispatch_failures += 1;
                tracing::warn!(
                    sink = self.sink.name(),
                    rule_id = %alert.rule_id,
                    error = %e,
                    "Failed to dispatch alert"
                );
            }
        }
        alerts
    }

    /// Parse and process one feed line. Malformed lines are logged and
    /// counted, never fatal.
    pub fn process_line(&mut self, line: &str) -> Vec<TriggeredAlert> {
        match parse_snapshot_line(line) {
            Ok(Some(snapshot)) => self.process_snapshot(&snapshot),
            Ok(None) => Vec::new(),
            Err(e) => {
                self.stats.skipped_lines += 1;
                tracing::warn!(error = %format!("{e:#}"), "Skipping malformed snapshot line");
                Vec::new()
            }
        }
    }

    /// Decode and process one raw feed line. Lines that are not valid UTF-8
    /// are counted as skipped, like any other malformed line.
    pub fn process_line_bytes(&mut self, raw: &[u8]) -> Vec<TriggeredAlert> {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        match std::str::from_utf8(raw) {
            Ok(line) => self.process_line(line),
            Err(e) => {
                self.stats.skipped_lines += 1;
                tracing::warn!(error = %e, "Skipping snapshot line with invalid UTF-8");
                Vec::new()
            }
        }
    }

    /// Consume the feed until EOF or Ctrl-C. Only reader I/O errors are fatal.
    pub async fn run<R>(&mut self, reader: R) -> anyhow::Result<MonitorStats>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut segments = reader.split(b'\n');

        loop {
            tokio::select! {
                segment = segments.next_segment() => {
                    match segment? {
                        Some(raw) => {
                            self.process_line_bytes(&raw);
                        }
                        None => {
                            tracing::info!("Snapshot feed closed");
                            break;
                        }
                    }
                }
                _ = signal::ctrl_c() => {
                    tracing::info!("Shutting down gracefully");
                    break;
                }
            }
        }

        Ok(self.stats)
    }

    /// Log the cooldown state of every rule at the clock's current time.
    pub fn log_cooldown_summary(&self) {
        let now = self.clock.now();
        for (rule_id, status) in self.engine.cooldown_status(now) {
            if status.in_cooldown {
                tracing::info!(
                    rule_id = %rule_id,
                    remaining_minutes = status.remaining_minutes,
                    next_allowed_at = %status.next_allowed_at,
                    fire_count = status.fire_count,
                    "Rule in cooldown"
                );
            } else {
                tracing::debug!(rule_id = %rule_id, fire_count = status.fire_count, "Rule ready");
            }
        }
    }
}
