//! Integration tests: schedule administration through the service.

use feederhub::app::events::HubEvent;
use feederhub::app::ports::ScheduleStore;
use feederhub::error::{Error, ValidationError};

use super::mock_ports::{Harness, hm};

#[test]
fn add_then_list_returns_time() {
    let h = Harness::new();
    assert_eq!(h.service.add_schedule("18:00").unwrap(), hm("18:00"));
    h.service.add_schedule("07:30").unwrap();
    assert_eq!(
        h.service.list_schedules().unwrap(),
        vec![hm("07:30"), hm("18:00")]
    );
}

#[test]
fn duplicate_add_is_rejected() {
    let h = Harness::new();
    h.service.add_schedule("07:30").unwrap();
    let err = h.service.add_schedule("07:30").unwrap_err();
    assert_eq!(err, Error::DuplicateEntry(hm("07:30")));
    assert_eq!(err.status(), 400);
    assert_eq!(h.schedule.list_times().unwrap().len(), 1);
}

#[test]
fn removing_missing_time_is_not_found_and_changes_nothing() {
    let h = Harness::new();
    h.service.add_schedule("07:30").unwrap();
    let err = h.service.remove_schedule("09:15").unwrap_err();
    assert_eq!(err, Error::NotFound(hm("09:15")));
    assert_eq!(err.status(), 404);
    assert_eq!(h.service.list_schedules().unwrap(), vec![hm("07:30")]);
}

#[test]
fn malformed_times_are_validation_errors() {
    let h = Harness::new();
    for bad in ["7:30", "07-30", "0730", "ab:cd", ""] {
        assert_eq!(
            h.service.add_schedule(bad).unwrap_err(),
            Error::Validation(ValidationError::BadTimeFormat),
            "{bad:?}"
        );
    }
    for out_of_range in ["24:00", "12:60"] {
        assert_eq!(
            h.service.add_schedule(out_of_range).unwrap_err(),
            Error::Validation(ValidationError::TimeOutOfRange)
        );
    }
    assert!(h.service.list_schedules().unwrap().is_empty());
    assert!(h.sink.events().is_empty());
}

#[test]
fn changes_are_broadcast_with_full_list() {
    let h = Harness::new();
    h.service.add_schedule("07:30").unwrap();
    h.service.add_schedule("17:00").unwrap();
    h.service.remove_schedule("07:30").unwrap();

    assert_eq!(
        h.sink.events().last(),
        Some(&HubEvent::ScheduleChanged(vec![hm("17:00")]))
    );
    assert_eq!(h.sink.count("schedule-changed"), 3);
}
