use crate::clock::{Clock, ManualClock};
use crate::engine::AlertEngine;
use crate::error::AlertError;
use crate::rule::{AlertRule, AlertRulePatch};
use carepulse_common::types::{Condition, MetricValues, Priority};
use chrono::{DateTime, Duration, TimeZone, Utc};

fn t(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap() + Duration::minutes(minutes)
}

fn metrics(pairs: &[(&str, f64)]) -> MetricValues {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn wait_time_rule() -> AlertRule {
    AlertRule::new("r1", "avgWaitTime", Condition::GreaterThan, 45.0)
        .with_priority(Priority::High)
        .with_cooldown_minutes(30)
        .with_message("Average wait time is {value} min (limit {threshold})")
}

#[test]
fn wait_time_rule_fires_then_cools_down() {
    let mut engine = AlertEngine::new(vec![wait_time_rule()]).unwrap();

    let first = engine.evaluate(&metrics(&[("avgWaitTime", 52.0)]), t(0));
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].rule_id, "r1");
    assert_eq!(first[0].current_value, 52.0);
    assert_eq!(first[0].threshold, 45.0);
    assert_eq!(first[0].priority, Priority::High);
    assert_eq!(first[0].timestamp, t(0));
    assert_eq!(first[0].message, "Average wait time is 52 min (limit 45)");

    // Still breaching, but inside the 30 minute window
    assert!(engine
        .evaluate(&metrics(&[("avgWaitTime", 60.0)]), t(10))
        .is_empty());

    let again = engine.evaluate(&metrics(&[("avgWaitTime", 60.0)]), t(31));
    assert_eq!(again.len(), 1);
    assert_eq!(again[0].current_value, 60.0);
}

#[test]
fn cooldown_suppresses_every_instant_inside_window() {
    let mut engine = AlertEngine::new(vec![wait_time_rule()]).unwrap();
    assert_eq!(
        engine
            .evaluate(&metrics(&[("avgWaitTime", 50.0)]), t(0))
            .len(),
        1
    );

    for minute in 0..30 {
        let fired = engine.evaluate(&metrics(&[("avgWaitTime", 99.0)]), t(minute));
        assert!(fired.is_empty(), "fired at minute {minute}");
    }
}

#[test]
fn cooldown_releases_exactly_at_window_end() {
    let mut engine = AlertEngine::new(vec![wait_time_rule()]).unwrap();
    engine.evaluate(&metrics(&[("avgWaitTime", 50.0)]), t(0));

    let edge = Utc.with_ymd_and_hms(2024, 3, 1, 8, 29, 59).unwrap();
    assert!(engine
        .evaluate(&metrics(&[("avgWaitTime", 50.0)]), edge)
        .is_empty());
    assert_eq!(
        engine
            .evaluate(&metrics(&[("avgWaitTime", 50.0)]), t(30))
            .len(),
        1
    );
}

#[test]
fn disabled_rule_never_fires() {
    let rule = AlertRule::new("r2", "bedUtilization", Condition::GreaterThan, 90.0)
        .with_cooldown_minutes(60)
        .with_enabled(false);
    let mut engine = AlertEngine::new(vec![rule]).unwrap();

    for (i, v) in [91.0, 99.0, 1e9].into_iter().enumerate() {
        assert!(engine
            .evaluate(&metrics(&[("bedUtilization", v)]), t(i as i64 * 120))
            .is_empty());
    }
    assert!(engine.cooldown_state("r2").is_none());
}

#[test]
fn missing_metric_is_skipped() {
    let rule = AlertRule::new("r3", "staffOnDuty", Condition::LessThan, 25.0)
        .with_cooldown_minutes(120);
    let mut engine = AlertEngine::new(vec![rule]).unwrap();

    assert!(engine
        .evaluate(&metrics(&[("otherMetric", 1.0)]), t(0))
        .is_empty());
    assert!(engine.evaluate(&MetricValues::new(), t(1)).is_empty());
    assert!(engine.cooldown_state("r3").is_none());

    // Data arriving later is evaluated normally
    assert_eq!(
        engine
            .evaluate(&metrics(&[("staffOnDuty", 20.0)]), t(2))
            .len(),
        1
    );
}

#[test]
fn equality_never_fires() {
    let mut engine = AlertEngine::new(vec![
        AlertRule::new("gt", "m", Condition::GreaterThan, 10.0),
        AlertRule::new("lt", "m", Condition::LessThan, 10.0),
    ])
    .unwrap();

    assert!(engine.evaluate(&metrics(&[("m", 10.0)]), t(0)).is_empty());

    let above = engine.evaluate(&metrics(&[("m", 10.5)]), t(1));
    assert_eq!(above.len(), 1);
    assert_eq!(above[0].rule_id, "gt");

    let below = engine.evaluate(&metrics(&[("m", 9.5)]), t(2));
    assert_eq!(below.len(), 1);
    assert_eq!(below[0].rule_id, "lt");
}

#[test]
fn rules_on_same_metric_are_independent() {
    let mut engine = AlertEngine::new(vec![
        AlertRule::new("beds-warn", "bedUtilization", Condition::GreaterThan, 85.0)
            .with_cooldown_minutes(60),
        AlertRule::new("beds-crit", "bedUtilization", Condition::GreaterThan, 95.0)
            .with_priority(Priority::Critical)
            .with_cooldown_minutes(10),
    ])
    .unwrap();

    let fired = engine.evaluate(&metrics(&[("bedUtilization", 96.0)]), t(0));
    let ids: Vec<&str> = fired.iter().map(|a| a.rule_id.as_str()).collect();
    assert_eq!(ids, vec!["beds-warn", "beds-crit"]);

    // Only the shorter cooldown has elapsed
    let fired = engine.evaluate(&metrics(&[("bedUtilization", 96.0)]), t(15));
    let ids: Vec<&str> = fired.iter().map(|a| a.rule_id.as_str()).collect();
    assert_eq!(ids, vec!["beds-crit"]);
}

#[test]
fn zero_cooldown_fires_every_evaluation() {
    let mut engine =
        AlertEngine::new(vec![AlertRule::new("r", "m", Condition::GreaterThan, 0.0)]).unwrap();
    for _ in 0..3 {
        assert_eq!(engine.evaluate(&metrics(&[("m", 1.0)]), t(0)).len(), 1);
    }
    assert_eq!(engine.cooldown_state("r").unwrap().fire_count, 3);
}

#[test]
fn evaluation_follows_registration_order() {
    let mut engine = AlertEngine::empty();
    for id in ["z", "a", "m"] {
        engine
            .add_rule(AlertRule::new(id, "m", Condition::GreaterThan, 0.0))
            .unwrap();
    }
    let ids: Vec<String> = engine
        .evaluate(&metrics(&[("m", 1.0)]), t(0))
        .into_iter()
        .map(|a| a.rule_id)
        .collect();
    assert_eq!(ids, vec!["z", "a", "m"]);
}

#[test]
fn add_rule_rejects_duplicate_id() {
    let mut engine = AlertEngine::new(vec![wait_time_rule()]).unwrap();
    let dup = AlertRule::new("r1", "bedUtilization", Condition::GreaterThan, 1.0);

    let err = engine.add_rule(dup).unwrap_err();
    assert_eq!(err, AlertError::DuplicateRule("r1".into()));
    assert_eq!(engine.rules().len(), 1);
    assert_eq!(engine.get_rule("r1").unwrap().metric, "avgWaitTime");
}

#[test]
fn new_rejects_duplicates_and_non_finite_thresholds() {
    assert!(matches!(
        AlertEngine::new(vec![wait_time_rule(), wait_time_rule()]),
        Err(AlertError::DuplicateRule(_))
    ));
    assert!(matches!(
        AlertEngine::new(vec![AlertRule::new("nan", "m", Condition::LessThan, f64::NAN)]),
        Err(AlertError::InvalidRule { .. })
    ));

    let mut engine = AlertEngine::empty();
    let err = engine
        .add_rule(AlertRule::new("inf", "m", Condition::GreaterThan, f64::INFINITY))
        .unwrap_err();
    assert!(matches!(err, AlertError::InvalidRule { ref id, .. } if id == "inf"));
    assert!(engine.rules().is_empty());
}

#[test]
fn remove_rule_drops_cooldown_state() {
    let mut engine = AlertEngine::new(vec![wait_time_rule()]).unwrap();
    engine.evaluate(&metrics(&[("avgWaitTime", 50.0)]), t(0));
    assert!(engine.cooldown_state("r1").is_some());

    let removed = engine.remove_rule("r1").unwrap();
    assert_eq!(removed.id, "r1");
    assert!(engine.cooldown_state("r1").is_none());
    assert_eq!(
        engine.remove_rule("r1"),
        Err(AlertError::NotFound("r1".into()))
    );

    // Re-adding starts from a clean slate
    engine.add_rule(wait_time_rule()).unwrap();
    assert_eq!(
        engine
            .evaluate(&metrics(&[("avgWaitTime", 50.0)]), t(1))
            .len(),
        1
    );
}

#[test]
fn update_rule_merges_fields() {
    let mut engine = AlertEngine::new(vec![wait_time_rule()]).unwrap();
    engine
        .update_rule(
            "r1",
            AlertRulePatch {
                threshold: Some(60.0),
                priority: Some(Priority::Critical),
                ..Default::default()
            },
        )
        .unwrap();

    let rule = engine.get_rule("r1").unwrap();
    assert_eq!(rule.threshold, 60.0);
    assert_eq!(rule.priority, Priority::Critical);
    assert_eq!(rule.cooldown_minutes, 30);
    assert_eq!(rule.metric, "avgWaitTime");

    assert!(engine
        .evaluate(&metrics(&[("avgWaitTime", 55.0)]), t(0))
        .is_empty());
}

#[test]
fn update_rule_unknown_id_is_not_found() {
    let mut engine = AlertEngine::empty();
    assert_eq!(
        engine.update_rule("ghost", AlertRulePatch::default()),
        Err(AlertError::NotFound("ghost".into()))
    );
}

#[test]
fn update_rule_rejects_invalid_merge_and_keeps_original() {
    let mut engine = AlertEngine::new(vec![wait_time_rule()]).unwrap();
    let err = engine
        .update_rule(
            "r1",
            AlertRulePatch {
                threshold: Some(f64::NAN),
                enabled: Some(false),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, AlertError::InvalidRule { .. }));

    let rule = engine.get_rule("r1").unwrap();
    assert_eq!(rule.threshold, 45.0);
    assert!(rule.enabled);
}

#[test]
fn shortening_cooldown_applies_to_existing_firing() {
    let mut engine = AlertEngine::new(vec![wait_time_rule()]).unwrap();
    engine.evaluate(&metrics(&[("avgWaitTime", 50.0)]), t(0));

    engine
        .update_rule(
            "r1",
            AlertRulePatch {
                cooldown_minutes: Some(5),
                ..Default::default()
            },
        )
        .unwrap();

    assert!(engine
        .evaluate(&metrics(&[("avgWaitTime", 50.0)]), t(4))
        .is_empty());
    assert_eq!(
        engine
            .evaluate(&metrics(&[("avgWaitTime", 50.0)]), t(5))
            .len(),
        1
    );
}

#[test]
fn lengthening_cooldown_does_not_clear_existing_firing() {
    let mut engine = AlertEngine::new(vec![wait_time_rule()]).unwrap();
    engine.evaluate(&metrics(&[("avgWaitTime", 50.0)]), t(0));

    engine
        .update_rule(
            "r1",
            AlertRulePatch {
                cooldown_minutes: Some(90),
                ..Default::default()
            },
        )
        .unwrap();

    assert!(engine
        .evaluate(&metrics(&[("avgWaitTime", 50.0)]), t(45))
        .is_empty());
    let status = engine.cooldown_status(t(45));
    assert!(status["r1"].in_cooldown);
    assert!((status["r1"].remaining_minutes - 45.0).abs() < 1e-9);
}

#[test]
fn clear_cooldown_allows_immediate_refire() {
    let mut engine = AlertEngine::new(vec![wait_time_rule()]).unwrap();
    assert_eq!(
        engine
            .evaluate(&metrics(&[("avgWaitTime", 52.0)]), t(0))
            .len(),
        1
    );

    engine.clear_cooldown("r1").unwrap();
    assert_eq!(
        engine
            .evaluate(&metrics(&[("avgWaitTime", 52.0)]), t(1))
            .len(),
        1
    );
    assert_eq!(engine.cooldown_state("r1").unwrap().fire_count, 2);

    assert_eq!(
        engine.clear_cooldown("nope"),
        Err(AlertError::NotFound("nope".into()))
    );
}

#[test]
fn cooldown_status_reports_every_rule() {
    let mut engine = AlertEngine::new(vec![
        wait_time_rule(),
        AlertRule::new("r3", "staffOnDuty", Condition::LessThan, 25.0).with_cooldown_minutes(120),
    ])
    .unwrap();
    engine.evaluate(&metrics(&[("avgWaitTime", 52.0)]), t(0));

    let status = engine.cooldown_status(t(10));
    assert_eq!(status.len(), 2);

    let r1 = &status["r1"];
    assert!(r1.in_cooldown);
    assert!((r1.remaining_minutes - 20.0).abs() < 1e-9);
    assert_eq!(r1.next_allowed_at, t(30));
    assert_eq!(r1.last_fired_at, Some(t(0)));
    assert_eq!(r1.fire_count, 1);

    let r3 = &status["r3"];
    assert!(!r3.in_cooldown);
    assert_eq!(r3.remaining_minutes, 0.0);
    assert_eq!(r3.next_allowed_at, t(10));
}

#[test]
fn cooldown_status_is_a_pure_read() {
    let mut engine = AlertEngine::new(vec![wait_time_rule()]).unwrap();
    engine.evaluate(&metrics(&[("avgWaitTime", 52.0)]), t(0));

    let first = engine.cooldown_status(t(12));
    for _ in 0..5 {
        assert_eq!(engine.cooldown_status(t(12)), first);
    }
    // Reading status far in the future does not release the rule early
    let _ = engine.cooldown_status(t(500));
    assert!(engine
        .evaluate(&metrics(&[("avgWaitTime", 52.0)]), t(12))
        .is_empty());
}

#[test]
fn replace_rules_resets_cooldowns() {
    let mut engine = AlertEngine::new(vec![wait_time_rule()]).unwrap();
    engine.evaluate(&metrics(&[("avgWaitTime", 52.0)]), t(0));

    engine.replace_rules(vec![wait_time_rule()]).unwrap();
    assert!(engine.cooldown_state("r1").is_none());
    assert_eq!(
        engine
            .evaluate(&metrics(&[("avgWaitTime", 52.0)]), t(1))
            .len(),
        1
    );

    assert!(engine
        .replace_rules(vec![wait_time_rule(), wait_time_rule()])
        .is_err());
    assert_eq!(engine.rules().len(), 1);
}

#[test]
fn evaluate_with_manual_clock() {
    let clock = ManualClock::new(t(0));
    let mut engine = AlertEngine::new(vec![wait_time_rule()]).unwrap();
    let snapshot = metrics(&[("avgWaitTime", 70.0)]);

    assert_eq!(engine.evaluate_with(&snapshot, &clock).len(), 1);
    clock.advance(Duration::minutes(29));
    assert!(engine.evaluate_with(&snapshot, &clock).is_empty());
    clock.advance(Duration::minutes(1));
    let fired = engine.evaluate_with(&snapshot, &clock);
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].timestamp, clock.now());
}

#[test]
fn message_template_substitutes_placeholders() {
    let rule = AlertRule::new("beds", "bedUtilization", Condition::GreaterThan, 90.0)
        .with_priority(Priority::Critical)
        .with_message("[{priority}] {rule_id}: {metric} at {value}% > {threshold}% {unknown}");
    assert_eq!(
        rule.render_message(93.46),
        "[CRITICAL] beds: bedUtilization at 93.5% > 90% {unknown}"
    );
}

#[test]
fn triggered_alert_serializes_with_snake_case_fields() {
    let mut engine = AlertEngine::new(vec![wait_time_rule()]).unwrap();
    let alert = engine
        .evaluate(&metrics(&[("avgWaitTime", 52.0)]), t(0))
        .remove(0);
    let json = serde_json::to_value(&alert).unwrap();
    assert_eq!(json["rule_id"], "r1");
    assert_eq!(json["condition"], "greater_than");
    assert_eq!(json["priority"], "HIGH");
    assert_eq!(json["current_value"], 52.0);
}

#[test]
fn substituted_fields_are_not_expanded_again() {
    let rule = AlertRule::new("{priority}", "ward{value}", Condition::GreaterThan, 1.0)
        .with_priority(Priority::Low)
        .with_message("{rule_id} {metric} = {value} {threshold");
    assert_eq!(rule.render_message(2.0), "{priority} ward{value} = 2 {threshold");
}

#[test]
fn message_template_handles_stray_braces() {
    let rule = AlertRule::new("r", "m", Condition::GreaterThan, 1.0)
        .with_message("{{value}} {} {metric}");
    assert_eq!(rule.render_message(3.0), "{3} {} m");
}

#[test]
fn empty_patch_leaves_rule_unchanged() {
    let patch = AlertRulePatch::default();
    assert!(patch.is_empty());
    assert!(!AlertRulePatch {
        enabled: Some(false),
        ..Default::default()
    }
    .is_empty());

    let mut engine = AlertEngine::new(vec![wait_time_rule()]).unwrap();
    engine.update_rule("r1", patch).unwrap();
    assert_eq!(engine.get_rule("r1"), Some(&wait_time_rule()));
}

#[test]
fn manual_clock_set_moves_backwards_and_forwards() {
    let clock = ManualClock::new(t(0));
    let mut engine = AlertEngine::new(vec![wait_time_rule()]).unwrap();
    let snapshot = metrics(&[("avgWaitTime", 70.0)]);

    clock.set(t(60));
    assert_eq!(engine.evaluate_with(&snapshot, &clock).len(), 1);

    // Rewinding keeps the rule suppressed
    clock.set(t(45));
    assert!(engine.evaluate_with(&snapshot, &clock).is_empty());

    clock.set(t(90));
    assert_eq!(clock.now(), t(90));
    assert_eq!(engine.evaluate_with(&snapshot, &clock).len(), 1);
}
