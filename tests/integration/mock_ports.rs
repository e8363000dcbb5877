//! Mock adapters for integration tests.
//!
//! Records every broadcast and actuator call so tests can assert on the
//! full history without a real device, socket or chat bot.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use feederhub::adapters::memory::{MemorySampleStore, MemoryScheduleStore};
use feederhub::app::events::HubEvent;
use feederhub::app::ports::{
    BroadcastSink, Clock, FeedActuator, NotificationChannel, NotifyError, SampleStore,
    StoreError,
};
use feederhub::app::service::{Adapters, AppService};
use feederhub::app::state::HubState;
use feederhub::config::SystemConfig;
use feederhub::notify::{NotificationDispatcher, Outbox};
use feederhub::scheduler::FeedCommand;
use feederhub::telemetry::{TelemetryReading, TelemetrySample, TimeOfDay, ValidReading};

// ── Clock ─────────────────────────────────────────────────────

/// Clock that only moves when told to. Local time is UTC.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

#[allow(dead_code)]
impl ManualClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }

    pub fn advance(&self, by: TimeDelta) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }

    fn time_of_day(&self, at: DateTime<Utc>) -> TimeOfDay {
        TimeOfDay::from_timelike(&at)
    }
}

// ── Broadcast + actuator ──────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Mutex<Vec<HubEvent>>,
    pub commands: Mutex<Vec<FeedCommand>>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn events(&self) -> Vec<HubEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn commands(&self) -> Vec<FeedCommand> {
        self.commands.lock().unwrap().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.name() == name)
            .count()
    }
}

impl BroadcastSink for RecordingSink {
    fn publish(&self, event: &HubEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

impl FeedActuator for RecordingSink {
    fn publish(&self, command: &FeedCommand) {
        self.commands.lock().unwrap().push(*command);
    }
}

// ── Sample store that always fails ────────────────────────────

pub struct BrokenSampleStore;

impl SampleStore for BrokenSampleStore {
    fn append(
        &self,
        _reading: ValidReading,
        _received_at: DateTime<Utc>,
    ) -> Result<TelemetrySample, StoreError> {
        Err(StoreError::Io)
    }

    fn query_recent(&self, _since: DateTime<Utc>) -> Result<Vec<TelemetrySample>, StoreError> {
        Err(StoreError::Io)
    }

    fn latest(&self) -> Result<Option<TelemetrySample>, StoreError> {
        Err(StoreError::Io)
    }
}

// ── Notification channel ──────────────────────────────────────

/// Records sent texts; can be switched to fail.
#[derive(Clone, Default)]
pub struct ScriptedNotifier {
    pub sent: Arc<Mutex<Vec<String>>>,
    pub failing: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl ScriptedNotifier {
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail(&self, on: bool) {
        self.failing.store(on, Ordering::SeqCst);
    }
}

impl NotificationChannel for ScriptedNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError::Transport);
        }
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

// ── Harness ───────────────────────────────────────────────────

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 7, 0, 0).unwrap()
}

pub fn reading(temperature: f64, feed_distance_cm: f64) -> TelemetryReading {
    TelemetryReading::new(temperature, feed_distance_cm, "07:00")
}

pub fn hm(s: &str) -> TimeOfDay {
    s.parse().unwrap()
}

/// A fully wired service over mock adapters.
pub struct Harness {
    pub service: AppService,
    pub clock: Arc<ManualClock>,
    pub sink: Arc<RecordingSink>,
    pub schedule: Arc<MemoryScheduleStore>,
    pub state: Arc<HubState>,
    pub outbox: Arc<Outbox>,
    pub notifier: ScriptedNotifier,
    pub dispatcher: NotificationDispatcher<ScriptedNotifier>,
}

#[allow(dead_code)]
impl Harness {
    pub fn new() -> Self {
        Self::with(SystemConfig::default(), Arc::new(MemorySampleStore::new()))
    }

    pub fn with(config: SystemConfig, samples: Arc<dyn SampleStore>) -> Self {
        let clock = Arc::new(ManualClock::at(t0()));
        let sink = Arc::new(RecordingSink::default());
        let schedule = Arc::new(MemoryScheduleStore::new());
        let state = Arc::new(HubState::new(&config));
        let outbox = Arc::new(Outbox::new());
        let notifier = ScriptedNotifier::default();
        let dispatcher = NotificationDispatcher::new(
            notifier.clone(),
            Arc::clone(&state),
            Arc::clone(&outbox),
            config.dispatch_timeout(),
        );
        let service = AppService::new(
            config,
            Arc::clone(&state),
            Arc::clone(&outbox),
            Adapters {
                clock: clock.clone(),
                schedule: schedule.clone(),
                samples,
                broadcast: sink.clone(),
                actuator: sink.clone(),
            },
        );
        Self {
            service,
            clock,
            sink,
            schedule,
            state,
            outbox,
            notifier,
            dispatcher,
        }
    }

    /// Run the dispatcher over everything queued.
    pub fn deliver(&self) -> usize {
        futures_lite::future::block_on(self.dispatcher.drain())
    }
}
