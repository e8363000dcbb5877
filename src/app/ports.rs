//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (clock, stores, broadcast, actuation, notification)
//! implement these traits. The [`AppService`](super::service::AppService)
//! holds them as shared trait objects, so the domain core never touches a
//! database, socket or HTTP client directly.
//!
//! ## Threading
//!
//! Ingest handlers and the runtime thread call into the same service
//! concurrently. Every port used by the service is therefore `Send + Sync`
//! and takes `&self`; implementations own their interior locking.

use core::fmt;
use core::future::Future;

use chrono::{DateTime, Utc};

use crate::scheduler::{FeedCommand, FeedRecord};
use crate::telemetry::{TelemetrySample, TimeOfDay, ValidReading};

use super::events::HubEvent;

// ───────────────────────────────────────────────────────────────
// Clock port (driven adapter: wall clock → domain)
// ───────────────────────────────────────────────────────────────

pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;

    /// `at` expressed as the installation's local `HH:MM`.
    fn time_of_day(&self, at: DateTime<Utc>) -> TimeOfDay;
}

// ───────────────────────────────────────────────────────────────
// Schedule store (driven adapter: domain ↔ persisted schedule)
// ───────────────────────────────────────────────────────────────

/// Set of daily feed times. Uniqueness is the store's invariant.
pub trait ScheduleStore: Send + Sync {
    /// All times, ascending.
    fn list_times(&self) -> Result<Vec<TimeOfDay>, StoreError>;

    /// Register a time. [`StoreError::Duplicate`] if already present.
    fn add(&self, time: TimeOfDay) -> Result<(), StoreError>;

    /// Unregister a time. [`StoreError::NotFound`] if absent.
    fn remove(&self, time: TimeOfDay) -> Result<(), StoreError>;

    fn contains(&self, time: TimeOfDay) -> Result<bool, StoreError> {
        Ok(self.list_times()?.contains(&time))
    }
}

// ───────────────────────────────────────────────────────────────
// Sample store (driven adapter: domain ↔ telemetry log)
// ───────────────────────────────────────────────────────────────

/// Append-only telemetry log.
pub trait SampleStore: Send + Sync {
    /// Persist a validated reading; the store assigns id and `received_at`.
    fn append(
        &self,
        reading: ValidReading,
        received_at: DateTime<Utc>,
    ) -> Result<TelemetrySample, StoreError>;

    /// Samples received at or after `since`, newest first.
    fn query_recent(&self, since: DateTime<Utc>) -> Result<Vec<TelemetrySample>, StoreError>;

    /// Most recent sample, if any.
    fn latest(&self) -> Result<Option<TelemetrySample>, StoreError>;
}

// ───────────────────────────────────────────────────────────────
// Broadcast sink (driven adapter: domain → live viewers)
// ───────────────────────────────────────────────────────────────

/// Fire-and-forget push to live subscribers. No acknowledgement.
pub trait BroadcastSink: Send + Sync {
    fn publish(&self, event: &HubEvent);
}

// ───────────────────────────────────────────────────────────────
// Feed actuation (driven adapter: domain → feeder device)
// ───────────────────────────────────────────────────────────────

/// Sends the feed command toward the physical device. Actuation is not
/// confirmed back to the core.
pub trait FeedActuator: Send + Sync {
    fn publish(&self, command: &FeedCommand);
}

// ───────────────────────────────────────────────────────────────
// Notification channel (driven adapter: domain → operator)
// ───────────────────────────────────────────────────────────────

/// Outbound alert transport (chat bot, e-mail, …).
///
/// The dispatcher runs sends on the runtime executor and races them against
/// a timer, so implementations must yield rather than block the thread.
pub trait NotificationChannel {
    fn send(&self, text: &str) -> impl Future<Output = Result<(), NotifyError>>;
}

// ───────────────────────────────────────────────────────────────
// Feed delegate (decouples the evaluator from its side effects)
// ───────────────────────────────────────────────────────────────

/// Callback the [`FeedingTrigger`](crate::scheduler::FeedingTrigger)
/// invokes after a feed has passed the dedup gate.
pub trait FeedDelegate {
    fn on_feed(&self, record: &FeedRecord);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ScheduleStore`] and [`SampleStore`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// Key already present.
    Duplicate,
    /// Requested key does not exist.
    NotFound,
    /// Stored data failed to decode.
    Corrupted,
    /// Generic I/O error from the backend.
    Io,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duplicate => write!(f, "duplicate entry"),
            Self::NotFound => write!(f, "entry not found"),
            Self::Corrupted => write!(f, "stored data corrupted"),
            Self::Io => write!(f, "I/O error"),
        }
    }
}

/// Errors from [`NotificationChannel::send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyError {
    /// Channel credentials or target are not configured.
    NotConfigured,
    /// The remote end refused the message.
    Rejected,
    /// Network or transport failure.
    Transport,
    /// The attempt exceeded the dispatcher's timeout.
    TimedOut,
}

impl fmt::Display for NotifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConfigured => write!(f, "channel not configured"),
            Self::Rejected => write!(f, "message rejected"),
            Self::Transport => write!(f, "transport failure"),
            Self::TimedOut => write!(f, "timed out"),
        }
    }
}
