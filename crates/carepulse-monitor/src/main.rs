use anyhow::{Context, Result};
use carepulse_alert::clock::SystemClock;
use carepulse_monitor::config::MonitorConfig;
use carepulse_monitor::monitor::Monitor;
use carepulse_monitor::rule_builder;
use carepulse_monitor::rule_seed;
use carepulse_monitor::sink::build_sink;
use std::path::Path;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_PATH: &str = "config/monitor.toml";

#[allow(clippy::print_stderr)]
fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  carepulse-monitor [config.toml] [snapshots.jsonl]   Evaluate snapshots (stdin when no file given)");
    eprintln!("  carepulse-monitor print-default-rules             Print the built-in rule set as TOML");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        Some("print-default-rules") => {
            print!("{}", rule_seed::default_rules_toml()?);
            Ok(())
        }
        Some("--help" | "-h") => {
            print_usage();
            Ok(())
        }
        _ => run_monitor(args.get(1).map(String::as_str), args.get(2).map(String::as_str)).await,
    }
}

fn load_config(path: Option<&str>) -> Result<MonitorConfig> {
    match path {
        Some(path) => MonitorConfig::load(path),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => MonitorConfig::load(DEFAULT_CONFIG_PATH),
        None => Ok(MonitorConfig::default()),
    }
}

async fn run_monitor(config_path: Option<&str>, feed_path: Option<&str>) -> Result<()> {
    let config = load_config(config_path)?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(config.log_filter.parse()?))
        .init();

    let engine = rule_builder::build_engine(&config)?;
    let mut monitor = Monitor::new(engine, build_sink(config.sink), Arc::new(SystemClock));

    tracing::info!(
        sink = ?config.sink,
        feed = feed_path.unwrap_or("stdin"),
        "carepulse-monitor starting"
    );

    let result = match feed_path {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open snapshot feed '{path}'"))?;
            monitor.run(BufReader::new(file)).await
        }
        None => monitor.run(BufReader::new(tokio::io::stdin())).await,
    };

    // Report state gathered so far even when the reader failed mid-feed
    monitor.log_cooldown_summary();
    let stats = result.context("Snapshot feed read failed")?;
    tracing::info!(
        snapshots = stats.snapshots,
        alerts = stats.alerts,
        skipped_lines = stats.skipped_lines,
        dispatch_failures = stats.dispatch_failures,
        "carepulse-monitor finished"
    );

    Ok(())
}
