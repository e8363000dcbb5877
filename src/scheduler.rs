//! Feeding trigger evaluator.
//!
//! Two trigger sources share one dedup gate. The evaluator notifies a
//! [`FeedDelegate`] when a feed fires; the service implements the delegate
//! to drive the actuator, the broadcast sink and the execution history.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Trigger Sources                          │
//! │                                                              │
//! │   ┌──────────────────┐            ┌──────────────────┐       │
//! │   │ Periodic tick    │            │ Manual command   │       │
//! │   │ (HH:MM matches   │            │ (operator / RPC) │       │
//! │   │  a schedule)     │            │                  │       │
//! │   └────────┬─────────┘            └────────┬─────────┘       │
//! │            │                               │                 │
//! │            ▼                               ▼                 │
//! │   ┌────────────────────────────────────────────────────┐     │
//! │   │          last_fed gate (shared 60 s window)        │     │
//! │   └───────────────────────┬────────────────────────────┘     │
//! │                           ▼                                  │
//! │                     FeedDelegate                             │
//! │          actuator · broadcast · execution history            │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! State machine: `Idle → Fired` on either source; `Fired → Idle` once the
//! dedup window has elapsed. A scheduled match inside the window is skipped
//! silently. A manual fire is never skipped, but it restarts the window.

use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::{FeedDelegate, ScheduleStore};
use crate::telemetry::TimeOfDay;

// ═══════════════════════════════════════════════════════════════
//  Feed command types
// ═══════════════════════════════════════════════════════════════

/// What caused a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedSource {
    /// A schedule entry matched the current minute.
    Auto,
    /// An operator asked for it.
    Manual,
}

/// Payload published on the feed actuation channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeedCommand {
    pub source: FeedSource,
    /// Ask the device to sound its buzzer while dispensing.
    pub buzzer_hint: bool,
}

impl FeedCommand {
    pub const fn for_source(source: FeedSource) -> Self {
        Self {
            source,
            buzzer_hint: matches!(source, FeedSource::Manual),
        }
    }
}

/// One feed execution, as kept in the history and broadcast to viewers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedRecord {
    pub at: DateTime<Utc>,
    pub time_of_day: TimeOfDay,
    pub source: FeedSource,
}

impl FeedRecord {
    pub fn command(&self) -> FeedCommand {
        FeedCommand::for_source(self.source)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Evaluator
// ═══════════════════════════════════════════════════════════════

/// Gate state at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    Idle,
    Fired { at: DateTime<Utc> },
}

/// Result of one [`FeedingTrigger::evaluate_tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// A schedule matched and the feed fired.
    Fired(FeedRecord),
    /// No schedule entry for this minute.
    NoMatch,
    /// Matched, but a feed already fired inside the dedup window.
    Suppressed { since_last: TimeDelta },
    /// Another evaluation is still running.
    Busy,
    /// The schedule store could not be read.
    StoreUnavailable,
}

/// Clears the in-progress flag when an evaluation ends, however it ends.
struct EvalGuard<'a>(&'a AtomicBool);

impl<'a> EvalGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for EvalGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Scheduled + manual feed trigger with a shared dedup timestamp.
#[derive(Debug)]
pub struct FeedingTrigger {
    dedup_window: TimeDelta,
    last_fed: Mutex<Option<DateTime<Utc>>>,
    evaluating: AtomicBool,
}

impl FeedingTrigger {
    pub fn new(dedup_window: TimeDelta) -> Self {
        Self {
            dedup_window,
            last_fed: Mutex::new(None),
            evaluating: AtomicBool::new(false),
        }
    }

    /// Time of the most recent feed from either source.
    pub fn last_fed_at(&self) -> Option<DateTime<Utc>> {
        *self.last_fed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self, now: DateTime<Utc>) -> FeedState {
        match self.last_fed_at() {
            Some(at) if now - at <= self.dedup_window => FeedState::Fired { at },
            _ => FeedState::Idle,
        }
    }

    /// Run one scheduled evaluation.
    ///
    /// `time_of_day` is `now` expressed in the installation's local wall
    /// time; the caller owns the timezone decision.
    pub fn evaluate_tick(
        &self,
        now: DateTime<Utc>,
        time_of_day: TimeOfDay,
        schedule: &dyn ScheduleStore,
        delegate: &dyn FeedDelegate,
    ) -> TickOutcome {
        let Some(_guard) = EvalGuard::acquire(&self.evaluating) else {
            debug!("Feeding: evaluation already in progress, tick skipped");
            return TickOutcome::Busy;
        };

        let matched = match schedule.contains(time_of_day) {
            Ok(m) => m,
            Err(e) => {
                warn!("Feeding: schedule read failed at {}: {}", time_of_day, e);
                return TickOutcome::StoreUnavailable;
            }
        };
        if !matched {
            return TickOutcome::NoMatch;
        }

        {
            let mut last = self.last_fed.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(at) = *last {
                let since_last = now - at;
                if since_last <= self.dedup_window {
                    debug!(
                        "Feeding: {} matched but last feed was {}s ago, skipped",
                        time_of_day,
                        since_last.num_seconds()
                    );
                    return TickOutcome::Suppressed { since_last };
                }
            }
            *last = Some(now);
        }

        let record = FeedRecord {
            at: now,
            time_of_day,
            source: FeedSource::Auto,
        };
        info!("Feeding: scheduled feed fired ({})", time_of_day);
        delegate.on_feed(&record);
        TickOutcome::Fired(record)
    }

    /// Fire immediately, bypassing the schedule and the dedup check.
    pub fn fire_manual(
        &self,
        now: DateTime<Utc>,
        time_of_day: TimeOfDay,
        delegate: &dyn FeedDelegate,
    ) -> FeedRecord {
        *self.last_fed.lock().unwrap_or_else(PoisonError::into_inner) = Some(now);

        let record = FeedRecord {
            at: now,
            time_of_day,
            source: FeedSource::Manual,
        };
        info!("Feeding: manual feed fired ({})", time_of_day);
        delegate.on_feed(&record);
        record
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
