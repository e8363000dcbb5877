//! In-memory stores.
//!
//! Used by the host runner when no schedule file is configured, and by
//! tests. Contents are lost on restart.

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use crate::app::ports::{SampleStore, ScheduleStore, StoreError};
use crate::telemetry::{TelemetrySample, TimeOfDay, ValidReading};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

// ───────────────────────────────────────────────────────────────
// Schedule
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryScheduleStore {
    times: Mutex<BTreeSet<TimeOfDay>>,
}

impl MemoryScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_times(times: impl IntoIterator<Item = TimeOfDay>) -> Self {
        Self {
            times: Mutex::new(times.into_iter().collect()),
        }
    }
}

impl ScheduleStore for MemoryScheduleStore {
    fn list_times(&self) -> Result<Vec<TimeOfDay>, StoreError> {
        Ok(lock(&self.times).iter().copied().collect())
    }

    fn add(&self, time: TimeOfDay) -> Result<(), StoreError> {
        if lock(&self.times).insert(time) {
            Ok(())
        } else {
            Err(StoreError::Duplicate)
        }
    }

    fn remove(&self, time: TimeOfDay) -> Result<(), StoreError> {
        if lock(&self.times).remove(&time) {
            Ok(())
        } else {
            Err(StoreError::NotFound)
        }
    }

    fn contains(&self, time: TimeOfDay) -> Result<bool, StoreError> {
        Ok(lock(&self.times).contains(&time))
    }
}

// ───────────────────────────────────────────────────────────────
// Samples
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct SampleLog {
    samples: Vec<TelemetrySample>,
    next_id: u64,
}

/// Append-only sample log. Ids start at 1.
#[derive(Debug, Default)]
pub struct MemorySampleStore {
    log: Mutex<SampleLog>,
}

impl MemorySampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        lock(&self.log).samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SampleStore for MemorySampleStore {
    fn append(
        &self,
        reading: ValidReading,
        received_at: DateTime<Utc>,
    ) -> Result<TelemetrySample, StoreError> {
        let mut log = lock(&self.log);
        log.next_id += 1;
        let sample = TelemetrySample {
            id: log.next_id,
            temperature_c: reading.temperature_c,
            feed_distance_cm: reading.feed_distance_cm,
            observed_at: reading.observed_at,
            received_at,
        };
        log.samples.push(sample.clone());
        Ok(sample)
    }

    fn query_recent(&self, since: DateTime<Utc>) -> Result<Vec<TelemetrySample>, StoreError> {
        Ok(lock(&self.log)
            .samples
            .iter()
            .rev()
            .filter(|s| s.received_at >= since)
            .cloned()
            .collect())
    }

    fn latest(&self) -> Result<Option<TelemetrySample>, StoreError> {
        Ok(lock(&self.log).samples.last().cloned())
    }
}
