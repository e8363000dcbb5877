//! Integration tests: schedule evaluation, manual feeds, execution history.

use chrono::TimeDelta;
use feederhub::app::events::HubEvent;
use feederhub::app::ports::ScheduleStore;
use feederhub::scheduler::{FeedSource, TickOutcome};

use super::mock_ports::{Harness, hm, t0};

fn at_0730(h: &Harness) {
    h.clock.set(t0() + TimeDelta::minutes(30));
}

#[test]
fn scheduled_minute_fires_once() {
    let h = Harness::new();
    h.schedule.add(hm("07:30")).unwrap();
    at_0730(&h);

    assert!(matches!(h.service.evaluate_tick(), TickOutcome::Fired(_)));
    h.clock.advance(TimeDelta::seconds(40));
    assert!(matches!(
        h.service.evaluate_tick(),
        TickOutcome::Suppressed { .. }
    ));

    let commands = h.sink.commands();
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].source, FeedSource::Auto);
    assert!(!commands[0].buzzer_hint);
    assert_eq!(h.sink.count("feed-fired"), 1);
    assert_eq!(h.service.history().len(), 1);
}

#[test]
fn unscheduled_minute_does_nothing() {
    let h = Harness::new();
    h.schedule.add(hm("07:30")).unwrap();
    assert_eq!(h.service.evaluate_tick(), TickOutcome::NoMatch);
    assert!(h.sink.commands().is_empty());
    assert!(h.service.history().is_empty());
}

#[test]
fn manual_feed_blocks_imminent_schedule() {
    let h = Harness::new();
    h.schedule.add(hm("07:30")).unwrap();
    h.clock.set(t0() + TimeDelta::minutes(29) + TimeDelta::seconds(30));

    let manual = h.service.fire_manual();
    assert_eq!(manual.source, FeedSource::Manual);

    at_0730(&h);
    assert!(matches!(
        h.service.evaluate_tick(),
        TickOutcome::Suppressed { .. }
    ));
    assert_eq!(h.sink.commands().len(), 1);
    assert_eq!(h.state.feeding.last_fed_at(), Some(manual.at));
}

#[test]
fn manual_feed_asks_for_buzzer_and_is_broadcast() {
    let h = Harness::new();
    let record = h.service.fire_manual();

    assert!(h.sink.commands()[0].buzzer_hint);
    assert_eq!(h.sink.events(), vec![HubEvent::FeedFired(record.clone())]);
    assert_eq!(h.service.history(), vec![record]);
}

#[test]
fn consecutive_schedules_fire_after_window() {
    let h = Harness::new();
    for t in ["07:30", "07:32"] {
        h.schedule.add(hm(t)).unwrap();
    }
    at_0730(&h);
    assert!(matches!(h.service.evaluate_tick(), TickOutcome::Fired(_)));
    h.clock.advance(TimeDelta::minutes(2));
    assert!(matches!(h.service.evaluate_tick(), TickOutcome::Fired(_)));

    let history = h.service.history();
    let minutes: Vec<String> = history.iter().map(|r| r.time_of_day.to_string()).collect();
    assert_eq!(minutes, vec!["07:30", "07:32"]);
}

#[test]
fn prune_drops_records_past_retention() {
    let h = Harness::new();
    h.service.fire_manual();
    h.clock.advance(TimeDelta::hours(12));
    h.service.fire_manual();

    assert_eq!(h.service.prune_history(), 0);
    h.clock.advance(TimeDelta::hours(12) + TimeDelta::seconds(1));
    assert_eq!(h.service.prune_history(), 1);
    assert_eq!(h.service.history().len(), 1);
}
