//! Inbound commands to the application service, and their replies.
//!
//! These represent actions requested by the outside world (dashboard,
//! feeder device, operator tooling) that the
//! [`AppService`](super::service::AppService) interprets and acts upon.
//! On the wire a command is a JSON object tagged by `op`.

use serde::{Deserialize, Serialize};

use crate::classifier::AlertSet;
use crate::scheduler::FeedRecord;
use crate::telemetry::{TelemetryReading, TelemetrySample, TimeOfDay};

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum AppCommand {
    /// Latest recorded sample.
    Current,

    /// Record a telemetry reading from the feeder.
    Ingest(TelemetryReading),

    /// Samples from the last `hours` hours, newest first.
    Recent {
        #[serde(default, alias = "jam")]
        hours: Option<u32>,
    },

    /// Dispense feed now.
    Feed,

    /// Register a daily feed time.
    ScheduleAdd {
        #[serde(alias = "jadwal")]
        time: String,
    },

    /// List daily feed times.
    ScheduleList,

    /// Unregister a daily feed time.
    ScheduleRemove {
        #[serde(alias = "jadwal")]
        time: String,
    },

    /// Recent feed executions, oldest first.
    History,
}

/// Summary of one ingest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestReport {
    pub sample: TelemetrySample,
    /// Categories the sample triggered.
    pub alerts: AlertSet,
    /// Categories handed to the notification outbox.
    pub notified: AlertSet,
    /// Categories held back by cooldown or a full outbox.
    pub suppressed: AlertSet,
}

/// Successful command results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AppReply {
    Current(Option<TelemetrySample>),
    Ingested(IngestReport),
    Samples(Vec<TelemetrySample>),
    Fed(FeedRecord),
    ScheduleAdded(TimeOfDay),
    Schedule(Vec<TimeOfDay>),
    ScheduleRemoved(TimeOfDay),
    History(Vec<FeedRecord>),
}

impl AppReply {
    /// HTTP-style status for a successful reply.
    pub const fn status(&self) -> u16 {
        match self {
            Self::Ingested(_) => 201,
            _ => 200,
        }
    }
}
