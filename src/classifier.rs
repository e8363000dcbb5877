//! Alert classifier.
//!
//! Maps one telemetry reading to the alert categories it triggers. The
//! result is a small bitmask, the same shape the fault flags take in the
//! rest of the system.
//!
//! ## Category rules
//!
//! 1. Temperature outside `[min, max]` → `TemperatureAbnormal`.
//! 2. Feed distance above the depletion threshold → `FeedDepleted`.
//! 3. Both at once → `Combined` **only**. The individual bits are cleared so
//!    a reader never receives three alerts for one sample.
//!
//! The classifier is pure: no clock, no history, no I/O.

use core::fmt;

use serde::Serialize;

use crate::config::SystemConfig;

// ───────────────────────────────────────────────────────────────
// AlertCategory
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum AlertCategory {
    /// Water temperature outside the normal band.
    TemperatureAbnormal = 0b0000_0001,
    /// Feed hopper nearly empty.
    FeedDepleted = 0b0000_0010,
    /// Both of the above; takes priority over either one alone.
    Combined = 0b0000_0100,
}

impl AlertCategory {
    pub const ALL: [Self; 3] = [Self::TemperatureAbnormal, Self::FeedDepleted, Self::Combined];

    /// Return the bitmask for this category.
    pub const fn mask(self) -> u8 {
        self as u8
    }

    /// Dense index, for per-category tables.
    pub const fn index(self) -> usize {
        match self {
            Self::TemperatureAbnormal => 0,
            Self::FeedDepleted => 1,
            Self::Combined => 2,
        }
    }
}

impl fmt::Display for AlertCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TemperatureAbnormal => write!(f, "temperature abnormal"),
            Self::FeedDepleted => write!(f, "feed depleted"),
            Self::Combined => write!(f, "temperature + feed critical"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// AlertSet
// ───────────────────────────────────────────────────────────────

/// Set of active categories, backed by a `u8` mask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertSet(u8);

impl AlertSet {
    pub const EMPTY: Self = Self(0);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, category: AlertCategory) -> bool {
        self.0 & category.mask() != 0
    }

    pub fn insert(&mut self, category: AlertCategory) {
        self.0 |= category.mask();
    }

    pub fn remove(&mut self, category: AlertCategory) {
        self.0 &= !category.mask();
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = AlertCategory> {
        AlertCategory::ALL.into_iter().filter(move |c| self.contains(*c))
    }
}

impl FromIterator<AlertCategory> for AlertSet {
    fn from_iter<I: IntoIterator<Item = AlertCategory>>(iter: I) -> Self {
        let mut set = Self::EMPTY;
        for c in iter {
            set.insert(c);
        }
        set
    }
}

impl Serialize for AlertSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

// ───────────────────────────────────────────────────────────────
// Classifier
// ───────────────────────────────────────────────────────────────

/// Threshold-based classifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertClassifier {
    temp_min_c: f64,
    temp_max_c: f64,
    depleted_cm: f64,
}

impl AlertClassifier {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            temp_min_c: config.temperature_min_c,
            temp_max_c: config.temperature_max_c,
            depleted_cm: config.feed_depleted_distance_cm,
        }
    }

    pub fn temperature_abnormal(&self, temperature_c: f64) -> bool {
        temperature_c < self.temp_min_c || temperature_c > self.temp_max_c
    }

    pub fn feed_depleted(&self, feed_distance_cm: f64) -> bool {
        feed_distance_cm > self.depleted_cm
    }

    /// Whether a temperature is on the cold side of the band.
    pub fn too_cold(&self, temperature_c: f64) -> bool {
        temperature_c < self.temp_min_c
    }

    /// Classify one reading.
    pub fn classify(&self, temperature_c: f64, feed_distance_cm: f64) -> AlertSet {
        let mut set = AlertSet::EMPTY;
        if self.temperature_abnormal(temperature_c) {
            set.insert(AlertCategory::TemperatureAbnormal);
        }
        if self.feed_depleted(feed_distance_cm) {
            set.insert(AlertCategory::FeedDepleted);
        }

        if set.contains(AlertCategory::TemperatureAbnormal)
            && set.contains(AlertCategory::FeedDepleted)
        {
            AlertSet::EMPTY.with(AlertCategory::Combined)
        } else {
            set
        }
    }
}

impl Default for AlertClassifier {
    fn default() -> Self {
        Self::new(&SystemConfig::default())
    }
}

impl AlertSet {
    /// Builder-style insert.
    pub fn with(mut self, category: AlertCategory) -> Self {
        self.insert(category);
        self
    }
}
