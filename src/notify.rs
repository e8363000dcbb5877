//! Operator notifications.
//!
//! Ingest never talks to the notification channel directly. It reserves
//! the category in the [`CooldownLedger`](crate::cooldown::CooldownLedger),
//! formats the message and drops a [`NotificationJob`] into the bounded
//! [`Outbox`]. The [`NotificationDispatcher`] drains the outbox on the
//! runtime thread, bounds every send with a timer and settles the
//! reservation with the outcome.
//!
//! ```text
//!  ingest ──try_send──▶ Outbox (N jobs) ──receive──▶ Dispatcher ──▶ channel
//!                                                       │
//!                                   mark_fired / release ◀┘
//! ```

use core::fmt::Write;
use core::time::Duration;
use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{info, warn};

use crate::app::ports::{NotificationChannel, NotifyError};
use crate::app::state::HubState;
use crate::classifier::{AlertCategory, AlertClassifier};
use crate::cooldown::CooldownPermit;
use crate::telemetry::TelemetrySample;

/// Jobs the outbox holds before ingest starts shedding alerts.
pub const OUTBOX_DEPTH: usize = 8;

/// One pending notification.
#[derive(Debug)]
pub struct NotificationJob {
    pub permit: CooldownPermit,
    pub text: String,
}

impl NotificationJob {
    pub fn category(&self) -> AlertCategory {
        self.permit.category()
    }
}

/// Bounded queue between ingest and the dispatcher.
pub type Outbox = Channel<CriticalSectionRawMutex, NotificationJob, OUTBOX_DEPTH>;

// ───────────────────────────────────────────────────────────────
// Message formatting
// ───────────────────────────────────────────────────────────────

/// Render the Markdown alert text for `category`.
pub fn format_alert(
    category: AlertCategory,
    sample: &TelemetrySample,
    classifier: &AlertClassifier,
) -> String {
    let temp_hint = if classifier.too_cold(sample.temperature_c) {
        "Water is too cold."
    } else {
        "Water is too hot."
    };

    let mut text = String::new();
    // Writing into a String cannot fail.
    let _ = match category {
        AlertCategory::TemperatureAbnormal => write!(
            text,
            "*ABNORMAL WATER TEMPERATURE*\n\
             Temperature: {:.1} °C\n\
             Observed at: {}\n\
             {}",
            sample.temperature_c, sample.observed_at, temp_hint
        ),
        AlertCategory::FeedDepleted => write!(
            text,
            "*FEED ALMOST EMPTY*\n\
             Sensor distance: {:.1} cm\n\
             Observed at: {}\n\
             Please refill the feeder.",
            sample.feed_distance_cm, sample.observed_at
        ),
        AlertCategory::Combined => write!(
            text,
            "*CRITICAL*\n\
             Temperature: {:.1} °C\n\
             Sensor distance: {:.1} cm\n\
             Observed at: {}\n\
             {} Please refill the feeder.",
            sample.temperature_c, sample.feed_distance_cm, sample.observed_at, temp_hint
        ),
    };
    text
}

// ───────────────────────────────────────────────────────────────
// Dispatcher
// ───────────────────────────────────────────────────────────────

/// Drains the outbox into a [`NotificationChannel`].
pub struct NotificationDispatcher<C> {
    channel: C,
    state: Arc<HubState>,
    outbox: Arc<Outbox>,
    timeout: Duration,
}

impl<C: NotificationChannel> NotificationDispatcher<C> {
    pub fn new(channel: C, state: Arc<HubState>, outbox: Arc<Outbox>, timeout: Duration) -> Self {
        Self {
            channel,
            state,
            outbox,
            timeout,
        }
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Send one job and settle its cooldown reservation.
    ///
    /// The ledger is stamped with the time the alert was reserved, not the
    /// time delivery finished.
    pub async fn dispatch(&self, job: NotificationJob) -> Result<(), NotifyError> {
        let NotificationJob { permit, text } = job;
        let category = permit.category();

        let sent = futures_lite::future::or(self.channel.send(&text), async {
            async_io_mini::Timer::after(self.timeout).await;
            Err(NotifyError::TimedOut)
        })
        .await;

        match sent {
            Ok(()) => {
                let at = permit.reserved_at();
                self.state.cooldown.mark_fired(permit, at);
                info!("Alert: {} notification sent", category);
                Ok(())
            }
            Err(e) => {
                self.state.cooldown.release(permit);
                warn!("Alert: {} notification failed: {}", category, e);
                Err(e)
            }
        }
    }

    /// Dispatch loop for the runtime thread. Never returns.
    pub async fn run(&self) {
        loop {
            let job = self.outbox.receive().await;
            // Failures are logged and settled inside dispatch.
            let _ = self.dispatch(job).await;
        }
    }

    /// Dispatch everything currently queued. Returns how many were sent
    /// successfully.
    pub async fn drain(&self) -> usize {
        let mut sent = 0;
        while let Ok(job) = self.outbox.try_receive() {
            if self.dispatch(job).await.is_ok() {
                sent += 1;
            }
        }
        sent
    }

    /// Release every queued reservation without sending.
    pub fn abandon_pending(&self) -> usize {
        let mut dropped = 0;
        while let Ok(job) = self.outbox.try_receive() {
            self.state.cooldown.release(job.permit);
            dropped += 1;
        }
        if dropped > 0 {
            warn!("Alert: {} queued notification(s) abandoned", dropped);
        }
        dropped
    }
}
