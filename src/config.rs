//! System configuration parameters
//!
//! All tunable parameters for the feeder hub. Defaults reproduce the
//! deployed behaviour; a JSON file can override any subset of fields.

use core::fmt;
use core::time::Duration;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Alert thresholds ---
    /// Water temperature below this is abnormal (Celsius, exclusive)
    pub temperature_min_c: f64,
    /// Water temperature above this is abnormal (Celsius, exclusive)
    pub temperature_max_c: f64,
    /// Sensor-to-feed distance above this means the hopper is nearly empty (cm)
    pub feed_depleted_distance_cm: f64,

    // --- Deduplication ---
    /// Minimum gap between two notifications of one alert category (seconds)
    pub alert_cooldown_secs: u32,
    /// Minimum gap between two feed commands, manual or scheduled (seconds)
    pub feed_dedup_window_secs: u32,

    // --- Timing ---
    /// Schedule evaluation period (milliseconds)
    pub evaluator_interval_ms: u32,
    /// Execution-history pruning period (milliseconds)
    pub history_prune_interval_ms: u32,
    /// Feed records older than this are pruned (seconds)
    pub history_retention_secs: u32,
    /// Upper bound on a single outbound notification attempt (milliseconds)
    pub dispatch_timeout_ms: u32,

    // --- Command surface ---
    /// Window for `recent` queries when the caller gives none (hours)
    pub recent_default_hours: u32,
    /// Inbound frame rate (frames per second)
    pub rate_limit_per_sec: u64,
    /// Inbound frame burst capacity
    pub rate_limit_burst: u64,

    // --- Installation ---
    /// Fixed UTC offset for schedule matching; `None` uses the host's local zone
    pub utc_offset_minutes: Option<i32>,
    /// JSON file holding the schedule; `None` keeps schedules in memory only
    pub schedule_path: Option<String>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Thresholds
            temperature_min_c: 20.0,
            temperature_max_c: 32.0,
            feed_depleted_distance_cm: 13.5, // 2 cm = full, ~13 cm = empty

            // Deduplication
            alert_cooldown_secs: 300,
            feed_dedup_window_secs: 60,

            // Timing
            evaluator_interval_ms: 60_000,         // 1/min
            history_prune_interval_ms: 3_600_000, // 1/h
            history_retention_secs: 86_400,       // 24 h
            dispatch_timeout_ms: 10_000,

            // Command surface
            recent_default_hours: 1,
            rate_limit_per_sec: 20,
            rate_limit_burst: 40,

            // Installation
            utc_offset_minutes: None,
            schedule_path: None,
        }
    }
}

impl SystemConfig {
    pub fn alert_cooldown(&self) -> TimeDelta {
        TimeDelta::seconds(i64::from(self.alert_cooldown_secs))
    }

    pub fn feed_dedup_window(&self) -> TimeDelta {
        TimeDelta::seconds(i64::from(self.feed_dedup_window_secs))
    }

    pub fn history_retention(&self) -> TimeDelta {
        TimeDelta::seconds(i64::from(self.history_retention_secs))
    }

    pub fn evaluator_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.evaluator_interval_ms))
    }

    pub fn history_prune_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.history_prune_interval_ms))
    }

    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.dispatch_timeout_ms))
    }

    /// Range-check every field. Invalid values are rejected, not clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.temperature_min_c.is_finite() || !self.temperature_max_c.is_finite() {
            return Err(ConfigError::ValidationFailed(
                "temperature thresholds must be finite",
            ));
        }
        if self.temperature_min_c >= self.temperature_max_c {
            return Err(ConfigError::ValidationFailed(
                "temperature_min_c must be < temperature_max_c",
            ));
        }
        if !(0.5..=500.0).contains(&self.feed_depleted_distance_cm) {
            return Err(ConfigError::ValidationFailed(
                "feed_depleted_distance_cm must be 0.5–500.0",
            ));
        }
        if !(1..=86_400).contains(&self.alert_cooldown_secs) {
            return Err(ConfigError::ValidationFailed(
                "alert_cooldown_secs must be 1–86400",
            ));
        }
        if !(1..=3600).contains(&self.feed_dedup_window_secs) {
            return Err(ConfigError::ValidationFailed(
                "feed_dedup_window_secs must be 1–3600",
            ));
        }
        if !(10..=600_000).contains(&self.evaluator_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "evaluator_interval_ms must be 10–600000",
            ));
        }
        if self.history_prune_interval_ms < 10 {
            return Err(ConfigError::ValidationFailed(
                "history_prune_interval_ms must be >= 10",
            ));
        }
        if self.history_retention_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "history_retention_secs must be > 0",
            ));
        }
        if !(10..=120_000).contains(&self.dispatch_timeout_ms) {
            return Err(ConfigError::ValidationFailed(
                "dispatch_timeout_ms must be 10–120000",
            ));
        }
        if !(1..=168).contains(&self.recent_default_hours) {
            return Err(ConfigError::ValidationFailed(
                "recent_default_hours must be 1–168",
            ));
        }
        if self.rate_limit_per_sec == 0 || self.rate_limit_burst == 0 {
            return Err(ConfigError::ValidationFailed(
                "rate limit must allow at least one frame",
            ));
        }
        if let Some(off) = self.utc_offset_minutes {
            if !(-14 * 60..=14 * 60).contains(&off) {
                return Err(ConfigError::ValidationFailed(
                    "utc_offset_minutes must be within ±14 h",
                ));
            }
        }
        Ok(())
    }

    /// Parse a (possibly partial) JSON document and validate it.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(text).map_err(|_| ConfigError::Corrupted)?;
        cfg.validate()?;
        Ok(cfg)
    }
}

/// Errors from loading or validating [`SystemConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Document failed to parse.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
