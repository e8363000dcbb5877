//! Application service — the hexagonal core.
//!
//! [`AppService`] owns the classifier and a handle to the shared
//! [`HubState`]. It exposes a transport-agnostic API. All I/O flows through
//! port traits held in [`Adapters`], so the whole service can be exercised
//! with in-memory mocks.
//!
//! ```text
//!  TelemetryReading ──▶ ┌─────────────────────────────┐ ──▶ BroadcastSink
//!                       │         AppService          │
//!     ScheduleStore ◀──▶│ Classifier · Cooldown · Feed│ ──▶ FeedActuator
//!       SampleStore ◀──▶└──────────────┬──────────────┘
//!                                      ▼
//!                                   Outbox ──▶ NotificationDispatcher
//! ```

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use embassy_sync::channel::TrySendError;
use log::{debug, error, info, warn};

use crate::classifier::{AlertClassifier, AlertSet};
use crate::config::SystemConfig;
use crate::error::{Error, Result, ValidationError};
use crate::notify::{NotificationJob, Outbox, format_alert};
use crate::scheduler::{FeedRecord, TickOutcome};
use crate::telemetry::{TelemetryReading, TelemetrySample, TimeOfDay};

use super::commands::{AppCommand, AppReply, IngestReport};
use super::events::HubEvent;
use super::ports::{
    BroadcastSink, Clock, FeedActuator, FeedDelegate, SampleStore, ScheduleStore, StoreError,
};
use super::state::HubState;

/// Longest window `recent` accepts, in hours.
pub const MAX_RECENT_HOURS: u32 = 168;

/// Driven adapters the service talks to.
#[derive(Clone)]
pub struct Adapters {
    pub clock: Arc<dyn Clock>,
    pub schedule: Arc<dyn ScheduleStore>,
    pub samples: Arc<dyn SampleStore>,
    pub broadcast: Arc<dyn BroadcastSink>,
    pub actuator: Arc<dyn FeedActuator>,
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    config: SystemConfig,
    classifier: AlertClassifier,
    state: Arc<HubState>,
    outbox: Arc<Outbox>,
    adapters: Adapters,
}

impl AppService {
    pub fn new(
        config: SystemConfig,
        state: Arc<HubState>,
        outbox: Arc<Outbox>,
        adapters: Adapters,
    ) -> Self {
        Self {
            classifier: AlertClassifier::new(&config),
            config,
            state,
            outbox,
            adapters,
        }
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn state(&self) -> &Arc<HubState> {
        &self.state
    }

    pub fn clock(&self) -> &dyn Clock {
        self.adapters.clock.as_ref()
    }

    // ── Telemetry ingest ──────────────────────────────────────

    /// Validate, persist, broadcast and classify one reading.
    ///
    /// Notifications are only queued here; delivery happens on the
    /// dispatcher task and never fails the ingest.
    pub fn ingest(&self, reading: &TelemetryReading) -> Result<IngestReport> {
        let valid = reading.validate().inspect_err(|e| {
            warn!("Ingest: rejected reading: {}", e);
        })?;

        let now = self.adapters.clock.now();
        let sample = self.adapters.samples.append(valid, now).map_err(|e| {
            error!("Ingest: failed to persist sample: {}", e);
            Error::Persistence(e)
        })?;
        info!(
            "Ingest: #{} T={:.1}°C feed={:.1}cm at {}",
            sample.id, sample.temperature_c, sample.feed_distance_cm, sample.observed_at
        );

        self.adapters
            .broadcast
            .publish(&HubEvent::SensorUpdate(sample.clone()));

        let alerts = self
            .classifier
            .classify(sample.temperature_c, sample.feed_distance_cm);
        let (notified, suppressed) = self.raise_alerts(&sample, alerts, now);

        Ok(IngestReport {
            sample,
            alerts,
            notified,
            suppressed,
        })
    }

    /// Reserve and enqueue a notification for every active category.
    fn raise_alerts(
        &self,
        sample: &TelemetrySample,
        alerts: AlertSet,
        now: DateTime<Utc>,
    ) -> (AlertSet, AlertSet) {
        let mut notified = AlertSet::EMPTY;
        let mut suppressed = AlertSet::EMPTY;

        for category in alerts.iter() {
            let Some(permit) = self.state.cooldown.try_reserve(category, now) else {
                match self.state.cooldown.remaining(category, now) {
                    Some(left) => info!(
                        "Alert: {} skipped, cooldown {} min left",
                        category,
                        ceil_minutes(left)
                    ),
                    None => debug!("Alert: {} skipped, dispatch in flight", category),
                }
                suppressed.insert(category);
                continue;
            };

            let text = format_alert(category, sample, &self.classifier);
            match self.outbox.try_send(NotificationJob { permit, text }) {
                Ok(()) => {
                    debug!("Alert: {} queued", category);
                    notified.insert(category);
                }
                Err(TrySendError::Full(job)) => {
                    warn!("Alert: outbox full, {} dropped", category);
                    self.state.cooldown.release(job.permit);
                    suppressed.insert(category);
                }
            }
        }

        (notified, suppressed)
    }

    /// Latest sample, `None` before the first ingest.
    pub fn current(&self) -> Result<Option<TelemetrySample>> {
        Ok(self.adapters.samples.latest()?)
    }

    /// Samples from the last `hours` hours, newest first.
    pub fn recent(&self, hours: Option<u32>) -> Result<Vec<TelemetrySample>> {
        let hours = hours.unwrap_or(self.config.recent_default_hours);
        if !(1..=MAX_RECENT_HOURS).contains(&hours) {
            return Err(ValidationError::OutOfRange("hours").into());
        }
        let since = self.adapters.clock.now() - TimeDelta::hours(i64::from(hours));
        Ok(self.adapters.samples.query_recent(since)?)
    }

    // ── Feeding ───────────────────────────────────────────────

    /// One scheduled evaluation at the clock's current time.
    pub fn evaluate_tick(&self) -> TickOutcome {
        let now = self.adapters.clock.now();
        let time_of_day = self.adapters.clock.time_of_day(now);
        self.state
            .feeding
            .evaluate_tick(now, time_of_day, self.adapters.schedule.as_ref(), self)
    }

    /// Operator-requested feed. Always fires.
    pub fn fire_manual(&self) -> FeedRecord {
        let now = self.adapters.clock.now();
        let time_of_day = self.adapters.clock.time_of_day(now);
        self.state.feeding.fire_manual(now, time_of_day, self)
    }

    /// Feed executions still in the history, oldest first.
    pub fn history(&self) -> Vec<FeedRecord> {
        self.state.history().snapshot()
    }

    /// Drop history records older than the retention window.
    pub fn prune_history(&self) -> usize {
        let cutoff = self.adapters.clock.now() - self.config.history_retention();
        let removed = self.state.history().prune_older_than(cutoff);
        if removed > 0 {
            debug!("History: pruned {} record(s)", removed);
        }
        removed
    }

    // ── Schedule administration ───────────────────────────────

    pub fn list_schedules(&self) -> Result<Vec<TimeOfDay>> {
        Ok(self.adapters.schedule.list_times()?)
    }

    pub fn add_schedule(&self, time: &str) -> Result<TimeOfDay> {
        let time: TimeOfDay = time.parse()?;
        self.adapters.schedule.add(time).map_err(|e| match e {
            StoreError::Duplicate => Error::DuplicateEntry(time),
            other => Error::Persistence(other),
        })?;
        info!("Schedule: added {}", time);
        self.publish_schedule();
        Ok(time)
    }

    pub fn remove_schedule(&self, time: &str) -> Result<TimeOfDay> {
        let time: TimeOfDay = time.parse()?;
        self.adapters.schedule.remove(time).map_err(|e| match e {
            StoreError::NotFound => Error::NotFound(time),
            other => Error::Persistence(other),
        })?;
        info!("Schedule: removed {}", time);
        self.publish_schedule();
        Ok(time)
    }

    fn publish_schedule(&self) {
        match self.adapters.schedule.list_times() {
            Ok(times) => self
                .adapters
                .broadcast
                .publish(&HubEvent::ScheduleChanged(times)),
            Err(e) => warn!("Schedule: changed but could not be re-read: {}", e),
        }
    }

    // ── Command dispatch ──────────────────────────────────────

    /// Process an inbound command.
    pub fn handle_command(&self, cmd: AppCommand) -> Result<AppReply> {
        match cmd {
            AppCommand::Current => self.current().map(AppReply::Current),
            AppCommand::Ingest(reading) => self.ingest(&reading).map(AppReply::Ingested),
            AppCommand::Recent { hours } => self.recent(hours).map(AppReply::Samples),
            AppCommand::Feed => Ok(AppReply::Fed(self.fire_manual())),
            AppCommand::ScheduleAdd { time } => {
                self.add_schedule(&time).map(AppReply::ScheduleAdded)
            }
            AppCommand::ScheduleList => self.list_schedules().map(AppReply::Schedule),
            AppCommand::ScheduleRemove { time } => {
                self.remove_schedule(&time).map(AppReply::ScheduleRemoved)
            }
            AppCommand::History => Ok(AppReply::History(self.history())),
        }
    }
}

impl FeedDelegate for AppService {
    fn on_feed(&self, record: &FeedRecord) {
        self.adapters.actuator.publish(&record.command());
        self.adapters
            .broadcast
            .publish(&HubEvent::FeedFired(record.clone()));
        self.state.history().push(record.clone());
    }
}

fn ceil_minutes(delta: TimeDelta) -> i64 {
    (delta.num_seconds() + 59) / 60
}
