//! Wall-clock adapter.
//!
//! Implements [`Clock`] on top of `chrono`. Schedule matching uses the
//! installation's local time: either the host zone or a fixed UTC offset
//! from configuration.

use chrono::{DateTime, FixedOffset, Local, Utc};
use log::warn;

use crate::app::ports::Clock;
use crate::config::SystemConfig;
use crate::telemetry::TimeOfDay;

/// Host clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock {
    offset: Option<FixedOffset>,
}

impl SystemClock {
    /// Local time of the host.
    pub fn local() -> Self {
        Self { offset: None }
    }

    /// Local time at a fixed offset east of UTC. `None` if out of range.
    pub fn with_offset_minutes(minutes: i32) -> Option<Self> {
        FixedOffset::east_opt(minutes.checked_mul(60)?).map(|o| Self { offset: Some(o) })
    }

    pub fn from_config(config: &SystemConfig) -> Self {
        match config.utc_offset_minutes {
            None => Self::local(),
            Some(minutes) => Self::with_offset_minutes(minutes).unwrap_or_else(|| {
                warn!("Clock: offset {} min out of range, using host zone", minutes);
                Self::local()
            }),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn time_of_day(&self, at: DateTime<Utc>) -> TimeOfDay {
        match self.offset {
            Some(offset) => TimeOfDay::from_timelike(&at.with_timezone(&offset)),
            None => TimeOfDay::from_timelike(&at.with_timezone(&Local)),
        }
    }
}
