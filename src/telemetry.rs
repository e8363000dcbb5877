//! Telemetry types: the feeder's wire reading, the stored sample, and the
//! `HH:MM` time-of-day used by both samples and schedules.
//!
//! The feeder firmware posts `{ "suhu": 27.5, "pakan_cm": 4.2, "waktu": "07:30" }`.
//! Those field names are accepted as aliases.

use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

// ───────────────────────────────────────────────────────────────
// TimeOfDay
// ───────────────────────────────────────────────────────────────

/// A day-recurring wall-clock minute, rendered as zero-padded `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    /// Build from components. `None` if out of range.
    pub const fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self { hour, minute })
        } else {
            None
        }
    }

    pub const fn hour(self) -> u8 {
        self.hour
    }

    pub const fn minute(self) -> u8 {
        self.minute
    }

    /// Truncate any chrono time value to its minute.
    pub fn from_timelike(t: &impl Timelike) -> Self {
        Self {
            hour: t.hour() as u8,
            minute: t.minute() as u8,
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = ValidationError;

    /// Strict `HH:MM`: exactly five bytes, two digits on each side.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let b = s.as_bytes();
        if b.len() != 5 || b[2] != b':' {
            return Err(ValidationError::BadTimeFormat);
        }
        let digit = |c: u8| {
            if c.is_ascii_digit() {
                Ok(c - b'0')
            } else {
                Err(ValidationError::BadTimeFormat)
            }
        };
        let hour = digit(b[0])? * 10 + digit(b[1])?;
        let minute = digit(b[3])? * 10 + digit(b[4])?;
        Self::new(hour, minute).ok_or(ValidationError::TimeOutOfRange)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ───────────────────────────────────────────────────────────────
// Inbound reading
// ───────────────────────────────────────────────────────────────

/// Unvalidated telemetry as received from the device.
///
/// Every field is optional on the wire so that a missing field surfaces as
/// a [`ValidationError`] rather than a generic decode failure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TelemetryReading {
    #[serde(default, alias = "suhu")]
    pub temperature: Option<f64>,
    #[serde(default, alias = "pakan_cm")]
    pub feed_distance_cm: Option<f64>,
    #[serde(default, alias = "waktu")]
    pub observed_at: Option<String>,
}

impl TelemetryReading {
    pub fn new(temperature: f64, feed_distance_cm: f64, observed_at: &str) -> Self {
        Self {
            temperature: Some(temperature),
            feed_distance_cm: Some(feed_distance_cm),
            observed_at: Some(observed_at.to_string()),
        }
    }

    /// Check presence and shape of every field.
    pub fn validate(&self) -> Result<ValidReading, ValidationError> {
        let temperature_c = self
            .temperature
            .ok_or(ValidationError::MissingField("temperature"))?;
        if !temperature_c.is_finite() {
            return Err(ValidationError::NotFinite("temperature"));
        }

        let feed_distance_cm = self
            .feed_distance_cm
            .ok_or(ValidationError::MissingField("feed_distance_cm"))?;
        if !feed_distance_cm.is_finite() {
            return Err(ValidationError::NotFinite("feed_distance_cm"));
        }

        let observed_at = match self.observed_at.as_deref() {
            None | Some("") => return Err(ValidationError::MissingField("observed_at")),
            Some(raw) => raw.parse::<TimeOfDay>()?,
        };

        Ok(ValidReading {
            temperature_c,
            feed_distance_cm,
            observed_at,
        })
    }
}

/// A reading that passed validation but has not been stored yet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidReading {
    pub temperature_c: f64,
    pub feed_distance_cm: f64,
    pub observed_at: TimeOfDay,
}

// ───────────────────────────────────────────────────────────────
// Stored sample
// ───────────────────────────────────────────────────────────────

/// A recorded sample. Immutable once the sample store has assigned its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    pub id: u64,
    pub temperature_c: f64,
    pub feed_distance_cm: f64,
    pub observed_at: TimeOfDay,
    pub received_at: DateTime<Utc>,
}
