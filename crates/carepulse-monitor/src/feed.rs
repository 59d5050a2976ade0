use anyhow::Context;
use carepulse_common::types::MetricSnapshot;

/// Parse one line of the JSON-lines snapshot feed.
///
/// Blank lines and lines starting with `#` yield `Ok(None)`. Each other line
/// must be an object of the form
/// `{"timestamp": "2024-03-01T08:00:00Z", "metrics": {"avgWaitTime": 52}}`,
/// where `timestamp` may be omitted.
///
/// # Examples
///
/// ```
/// use carepulse_monitor::feed::parse_snapshot_line;
///
/// let snap = parse_snapshot_line(r#"{"metrics":{"bedUtilization":91.5}}"#)
///     .unwrap()
///     .unwrap();
/// assert_eq!(snap.metrics["bedUtilization"], 91.5);
/// assert!(parse_snapshot_line("   ").unwrap().is_none());
/// ```
pub fn parse_snapshot_line(line: &str) -> anyhow::Result<Option<MetricSnapshot>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    let snapshot: MetricSnapshot =
        serde_json::from_str(trimmed).context("invalid metric snapshot")?;
    Ok(Some(snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn parses_timestamped_snapshot() {
        let snap = parse_snapshot_line(
            r#"{"timestamp":"2024-03-01T08:10:00Z","metrics":{"avgWaitTime":60,"staffOnDuty":22}}"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(
            snap.timestamp,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 8, 10, 0).unwrap())
        );
        assert_eq!(snap.metrics.len(), 2);
    }

    #[test]
    fn skips_comments() {
        assert!(parse_snapshot_line("# morning shift").unwrap().is_none());
    }

    #[test]
    fn rejects_non_numeric_values() {
        let err = parse_snapshot_line(r#"{"metrics":{"avgWaitTime":"slow"}}"#).unwrap_err();
        assert!(err.to_string().contains("invalid metric snapshot"));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_snapshot_line("not json").is_err());
    }
}
