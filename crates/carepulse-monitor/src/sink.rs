use crate::config::SinkKind;
use carepulse_common::types::{Priority, TriggeredAlert};
use std::io::Write;

/// Destination for alerts returned by the engine.
///
/// The engine never calls a sink itself; the monitor loop dispatches each
/// triggered alert after evaluation.
pub trait AlertSink: Send {
    /// Sink name used in log fields (e.g., `"stdout"`).
    fn name(&self) -> &str;

    fn dispatch(&mut self, alert: &TriggeredAlert) -> anyhow::Result<()>;
}

/// Writes each alert as a single JSON line.
pub struct StdoutSink<W: Write + Send> {
    out: W,
}

impl StdoutSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self {
            out: std::io::stdout(),
        }
    }
}

impl<W: Write + Send> StdoutSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> AlertSink for StdoutSink<W> {
    fn name(&self) -> &str {
        "stdout"
    }

    fn dispatch(&mut self, alert: &TriggeredAlert) -> anyhow::Result<()> {
        serde_json::to_writer(&mut self.out, alert)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}

/// Emits alerts as `tracing` events, escalating the level with priority.
#[derive(Debug, Default)]
pub struct LogSink;

impl AlertSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    fn dispatch(&mut self, alert: &TriggeredAlert) -> anyhow::Result<()> {
        match alert.priority {
            Priority::Critical | Priority::High => tracing::warn!(
                rule_id = %alert.rule_id,
                metric = %alert.metric,
                value = alert.current_value,
                threshold = alert.threshold,
                priority = %alert.priority,
                "{}",
                alert.message
            ),
            Priority::Medium | Priority::Low => tracing::info!(
                rule_id = %alert.rule_id,
                metric = %alert.metric,
                value = alert.current_value,
                threshold = alert.threshold,
                priority = %alert.priority,
                "{}",
                alert.message
            ),
        }
        Ok(())
    }
}

pub fn build_sink(kind: SinkKind) -> Box<dyn AlertSink> {
    match kind {
        SinkKind::Stdout => Box::new(StdoutSink::stdout()),
        SinkKind::Log => Box::new(LogSink),
    }
}
