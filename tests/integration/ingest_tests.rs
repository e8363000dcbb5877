//! Integration tests: telemetry ingest → classifier → cooldown → outbox.

use std::sync::Arc;

use chrono::TimeDelta;
use feederhub::app::ports::StoreError;
use feederhub::classifier::AlertCategory;
use feederhub::config::SystemConfig;
use feederhub::cooldown::CooldownLedger;
use feederhub::error::{Error, ValidationError};
use feederhub::notify::{NotificationJob, OUTBOX_DEPTH};
use feederhub::telemetry::TelemetryReading;

use super::mock_ports::{BrokenSampleStore, Harness, reading, t0};

#[test]
fn normal_reading_is_stored_and_broadcast_without_alerts() {
    let h = Harness::new();
    let report = h.service.ingest(&reading(27.0, 4.0)).unwrap();

    assert_eq!(report.sample.id, 1);
    assert_eq!(report.sample.received_at, t0());
    assert!(report.alerts.is_empty());
    assert_eq!(h.sink.count("sensor-update"), 1);
    assert_eq!(h.deliver(), 0);
    assert_eq!(h.service.current().unwrap(), Some(report.sample));
}

#[test]
fn current_is_none_before_first_sample() {
    let h = Harness::new();
    assert_eq!(h.service.current().unwrap(), None);
}

#[test]
fn repeated_alerts_inside_cooldown_notify_once() {
    let h = Harness::new();

    let first = h.service.ingest(&reading(25.0, 14.0)).unwrap();
    assert!(first.notified.contains(AlertCategory::FeedDepleted));
    assert_eq!(h.deliver(), 1);

    h.clock.advance(TimeDelta::minutes(2));
    let second = h.service.ingest(&reading(25.0, 14.5)).unwrap();
    assert!(second.notified.is_empty());
    assert!(second.suppressed.contains(AlertCategory::FeedDepleted));
    assert_eq!(h.deliver(), 0);

    h.clock.set(t0() + TimeDelta::minutes(5) + TimeDelta::seconds(1));
    let third = h.service.ingest(&reading(25.0, 15.0)).unwrap();
    assert!(third.notified.contains(AlertCategory::FeedDepleted));
    assert_eq!(h.deliver(), 1);

    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|m| m.contains("FEED ALMOST EMPTY")));
}

#[test]
fn combined_alert_silences_individual_categories() {
    let h = Harness::new();

    let report = h.service.ingest(&reading(35.0, 14.0)).unwrap();
    assert_eq!(report.alerts.len(), 1);
    assert!(report.alerts.contains(AlertCategory::Combined));
    assert_eq!(h.deliver(), 1);
    assert!(h.notifier.sent()[0].contains("CRITICAL"));

    h.clock.advance(TimeDelta::minutes(1));
    h.service.ingest(&reading(35.0, 5.0)).unwrap();
    h.service.ingest(&reading(25.0, 14.0)).unwrap();
    assert_eq!(h.deliver(), 0);

    h.clock.set(t0() + TimeDelta::minutes(5) + TimeDelta::seconds(1));
    let report = h.service.ingest(&reading(18.0, 5.0)).unwrap();
    assert!(report.notified.contains(AlertCategory::TemperatureAbnormal));
    assert_eq!(h.deliver(), 1);
    assert!(h.notifier.sent()[1].contains("too cold"));
}

#[test]
fn pending_combined_alert_silences_individual_categories() {
    let h = Harness::new();

    let first = h.service.ingest(&reading(35.0, 14.0)).unwrap();
    assert!(first.notified.contains(AlertCategory::Combined));

    // Combined job still queued when the next samples arrive.
    h.clock.advance(TimeDelta::seconds(10));
    let hot = h.service.ingest(&reading(35.0, 5.0)).unwrap();
    assert!(hot.notified.is_empty());
    assert!(hot.suppressed.contains(AlertCategory::TemperatureAbnormal));
    let empty = h.service.ingest(&reading(25.0, 14.0)).unwrap();
    assert!(empty.notified.is_empty());
    assert!(empty.suppressed.contains(AlertCategory::FeedDepleted));

    assert_eq!(h.deliver(), 1);
    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("CRITICAL"));
}

#[test]
fn failed_combined_dispatch_frees_individual_categories() {
    let h = Harness::new();
    h.notifier.fail(true);
    h.service.ingest(&reading(35.0, 14.0)).unwrap();
    assert_eq!(h.deliver(), 0);

    h.notifier.fail(false);
    h.clock.advance(TimeDelta::seconds(10));
    let report = h.service.ingest(&reading(35.0, 5.0)).unwrap();
    assert!(report.notified.contains(AlertCategory::TemperatureAbnormal));
    assert_eq!(h.deliver(), 1);
}

#[test]
fn failed_dispatch_leaves_ledger_untouched() {
    let h = Harness::new();
    h.notifier.fail(true);

    h.service.ingest(&reading(33.0, 5.0)).unwrap();
    assert_eq!(h.deliver(), 0);
    assert_eq!(
        h.state.cooldown.last_fired(AlertCategory::TemperatureAbnormal),
        None
    );

    // Next qualifying observation retries.
    h.notifier.fail(false);
    h.clock.advance(TimeDelta::seconds(30));
    let report = h.service.ingest(&reading(33.0, 5.0)).unwrap();
    assert!(report.notified.contains(AlertCategory::TemperatureAbnormal));
    assert_eq!(h.deliver(), 1);
}

#[test]
fn alert_in_flight_is_not_queued_twice() {
    let h = Harness::new();
    h.service.ingest(&reading(25.0, 14.0)).unwrap();
    // Not yet delivered: the second sample must not queue another job.
    let second = h.service.ingest(&reading(25.0, 14.0)).unwrap();
    assert!(second.suppressed.contains(AlertCategory::FeedDepleted));
    assert_eq!(h.deliver(), 1);
}

#[test]
fn full_outbox_releases_reservation() {
    let h = Harness::new();

    // Fill the outbox with jobs minted from spare ledgers.
    let spares: Vec<CooldownLedger> = (0..OUTBOX_DEPTH)
        .map(|_| CooldownLedger::new(TimeDelta::minutes(5)))
        .collect();
    for ledger in &spares {
        let permit = ledger.try_reserve(AlertCategory::Combined, t0()).unwrap();
        h.outbox
            .try_send(NotificationJob {
                permit,
                text: "filler".into(),
            })
            .unwrap();
    }

    let report = h.service.ingest(&reading(25.0, 14.0)).unwrap();
    assert!(report.notified.is_empty());
    assert!(report.suppressed.contains(AlertCategory::FeedDepleted));
    assert!(h.state.cooldown.should_fire(AlertCategory::FeedDepleted, t0()));
}

#[test]
fn persistence_failure_surfaces_and_suppresses_side_effects() {
    let h = Harness::with(SystemConfig::default(), Arc::new(BrokenSampleStore));

    let err = h.service.ingest(&reading(35.0, 14.0)).unwrap_err();
    assert_eq!(err, Error::Persistence(StoreError::Io));
    assert_eq!(err.status(), 500);
    assert!(h.sink.events().is_empty());
    assert_eq!(h.deliver(), 0);
    assert!(h.state.cooldown.should_fire(AlertCategory::Combined, t0()));
}

#[test]
fn invalid_reading_mutates_nothing() {
    let h = Harness::new();

    let missing = TelemetryReading {
        temperature: None,
        ..reading(25.0, 5.0)
    };
    assert_eq!(
        h.service.ingest(&missing).unwrap_err(),
        Error::Validation(ValidationError::MissingField("temperature"))
    );

    let bad_time = TelemetryReading::new(25.0, 5.0, "7:00");
    assert_eq!(
        h.service.ingest(&bad_time).unwrap_err(),
        Error::Validation(ValidationError::BadTimeFormat)
    );

    let nan = reading(f64::NAN, 14.0);
    assert!(matches!(
        h.service.ingest(&nan),
        Err(Error::Validation(ValidationError::NotFinite(_)))
    ));

    assert_eq!(h.service.current().unwrap(), None);
    assert!(h.sink.events().is_empty());
}

#[test]
fn concurrent_qualifying_samples_queue_one_notification() {
    let h = Arc::new(Harness::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let h = Arc::clone(&h);
            std::thread::spawn(move || h.service.ingest(&reading(35.0, 20.0)).unwrap())
        })
        .collect();
    let queued = handles
        .into_iter()
        .map(|t| t.join().unwrap())
        .filter(|r| r.notified.contains(AlertCategory::Combined))
        .count();

    assert_eq!(queued, 1);
    assert_eq!(h.deliver(), 1);
    assert_eq!(h.sink.count("sensor-update"), 8);
}

#[test]
fn recent_window_is_bounded_and_newest_first() {
    let h = Harness::new();
    h.service.ingest(&reading(25.0, 5.0)).unwrap();
    h.clock.advance(TimeDelta::minutes(90));
    h.service.ingest(&reading(26.0, 5.0)).unwrap();
    h.clock.advance(TimeDelta::minutes(10));
    h.service.ingest(&reading(27.0, 5.0)).unwrap();

    let last_hour: Vec<u64> = h.service.recent(None).unwrap().iter().map(|s| s.id).collect();
    assert_eq!(last_hour, vec![3, 2]);
    assert_eq!(h.service.recent(Some(2)).unwrap().len(), 3);

    for hours in [0, 169] {
        assert_eq!(
            h.service.recent(Some(hours)).unwrap_err(),
            Error::Validation(ValidationError::OutOfRange("hours"))
        );
    }
}
