//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) publishes these through
//! the [`BroadcastSink`](super::ports::BroadcastSink) port. Adapters on the
//! other side decide what to do with them — log them, write them to a
//! socket, push them to a dashboard.

use serde::Serialize;

use crate::scheduler::FeedRecord;
use crate::telemetry::{TelemetrySample, TimeOfDay};

/// Structured events pushed to live viewers.
///
/// Serialises as `{"event": "<name>", "payload": …}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum HubEvent {
    /// A telemetry sample was recorded.
    SensorUpdate(TelemetrySample),

    /// A feed command was sent to the device.
    FeedFired(FeedRecord),

    /// The feeding schedule was modified (carries the full new list).
    ScheduleChanged(Vec<TimeOfDay>),
}

impl HubEvent {
    /// Wire name of the event.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SensorUpdate(_) => "sensor-update",
            Self::FeedFired(_) => "feed-fired",
            Self::ScheduleChanged(_) => "schedule-changed",
        }
    }
}
