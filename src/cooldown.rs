//! Alert cooldown ledger.
//!
//! One slot per [`AlertCategory`], each behind its own mutex. A slot holds
//! the last successful notification time and an *in flight* flag.
//! Individual slots also carry a *held* flag, set while a `Combined`
//! dispatch is pending, which blocks them like their own in-flight flag.
//!
//! ## Reservation lifecycle
//!
//! 1. Ingest calls [`CooldownLedger::try_reserve`]. If the window has
//!    elapsed and nothing is in flight, the slot is marked in flight and a
//!    [`CooldownPermit`] is returned. Check and mark happen under one lock.
//!    Reserving `Combined` then holds both individual slots.
//! 2. The dispatcher sends the notification.
//! 3. Success → [`CooldownLedger::mark_fired`]: timestamp updated, flag
//!    cleared. A `Combined` fire also stamps both individual slots and
//!    drops the hold.
//! 4. Failure → [`CooldownLedger::release`]: flags cleared, timestamps left
//!    alone, so the next qualifying sample may notify again.
//!
//! Locks are never nested; multi-slot operations take the slots one after
//! another.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, TimeDelta, Utc};
use log::debug;

use crate::classifier::AlertCategory;

const INDIVIDUAL: [AlertCategory; 2] = [AlertCategory::TemperatureAbnormal, AlertCategory::FeedDepleted];

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    last_fired: Option<DateTime<Utc>>,
    in_flight: bool,
    held_by_combined: bool,
}

impl Slot {
    fn busy(&self) -> bool {
        self.in_flight || self.held_by_combined
    }

    fn window_elapsed(&self, now: DateTime<Utc>, window: TimeDelta) -> bool {
        self.last_fired.is_none_or(|at| now - at > window)
    }
}

/// Proof that a category was reserved for one dispatch attempt.
///
/// Hand it back through [`CooldownLedger::mark_fired`] or
/// [`CooldownLedger::release`].
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a permit must be completed or released, or the category stays blocked"]
pub struct CooldownPermit {
    category: AlertCategory,
    reserved_at: DateTime<Utc>,
}

impl CooldownPermit {
    pub fn category(&self) -> AlertCategory {
        self.category
    }

    pub fn reserved_at(&self) -> DateTime<Utc> {
        self.reserved_at
    }
}

/// Per-category notification gate.
#[derive(Debug)]
pub struct CooldownLedger {
    window: TimeDelta,
    slots: [Mutex<Slot>; 3],
}

impl CooldownLedger {
    pub fn new(window: TimeDelta) -> Self {
        Self {
            window,
            slots: Default::default(),
        }
    }

    pub fn window(&self) -> TimeDelta {
        self.window
    }

    fn slot(&self, category: AlertCategory) -> MutexGuard<'_, Slot> {
        // A panic while holding a slot cannot leave it half-written: every
        // critical section is a plain field assignment.
        self.slots[category.index()]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a notification for `category` would be allowed at `now`.
    pub fn should_fire(&self, category: AlertCategory, now: DateTime<Utc>) -> bool {
        let slot = self.slot(category);
        !slot.busy() && slot.window_elapsed(now, self.window)
    }

    /// Atomically check the window and mark the category in flight.
    ///
    /// A `Combined` reservation also holds both individual categories until
    /// it is completed or released.
    pub fn try_reserve(&self, category: AlertCategory, now: DateTime<Utc>) -> Option<CooldownPermit> {
        {
            let mut slot = self.slot(category);
            if slot.busy() || !slot.window_elapsed(now, self.window) {
                return None;
            }
            slot.in_flight = true;
        }
        if category == AlertCategory::Combined {
            for sub in INDIVIDUAL {
                self.slot(sub).held_by_combined = true;
            }
        }
        Some(CooldownPermit {
            category,
            reserved_at: now,
        })
    }

    /// Record a successful notification.
    pub fn mark_fired(&self, permit: CooldownPermit, now: DateTime<Utc>) {
        {
            let mut slot = self.slot(permit.category);
            slot.last_fired = Some(now);
            slot.in_flight = false;
        }
        if permit.category == AlertCategory::Combined {
            for sub in INDIVIDUAL {
                let mut slot = self.slot(sub);
                slot.last_fired = Some(now);
                slot.held_by_combined = false;
            }
        }
        debug!("Cooldown: {} stamped at {}", permit.category, now);
    }

    /// Abandon a reservation without touching the timestamp.
    pub fn release(&self, permit: CooldownPermit) {
        self.slot(permit.category).in_flight = false;
        if permit.category == AlertCategory::Combined {
            for sub in INDIVIDUAL {
                self.slot(sub).held_by_combined = false;
            }
        }
        debug!("Cooldown: {} released", permit.category);
    }

    /// Last successful notification, if any.
    pub fn last_fired(&self, category: AlertCategory) -> Option<DateTime<Utc>> {
        self.slot(category).last_fired
    }

    /// Time left before `category` may fire again. `None` if it may fire now.
    pub fn remaining(&self, category: AlertCategory, now: DateTime<Utc>) -> Option<TimeDelta> {
        let slot = self.slot(category);
        let at = slot.last_fired?;
        let left = self.window - (now - at);
        (left > TimeDelta::zero()).then_some(left)
    }
}
