//! JSON-file schedule store.
//!
//! The schedule is a JSON array of `"HH:MM"` strings. The whole set is kept
//! in memory and rewritten on every change: the new document goes to a
//! sibling temp file first and is then renamed over the existing file, so a
//! crash mid-write leaves the previous schedule intact.

use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{error, info};

use crate::app::ports::{ScheduleStore, StoreError};
use crate::telemetry::TimeOfDay;

#[derive(Debug)]
pub struct FileScheduleStore {
    path: PathBuf,
    times: Mutex<BTreeSet<TimeOfDay>>,
}

impl FileScheduleStore {
    /// Load the schedule at `path`. A missing file is an empty schedule.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let times = match fs::read_to_string(&path) {
            Ok(text) => {
                let list: Vec<TimeOfDay> = serde_json::from_str(&text).map_err(|e| {
                    error!("Schedule: {} is corrupted: {}", path.display(), e);
                    StoreError::Corrupted
                })?;
                list.into_iter().collect()
            }
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeSet::new(),
            Err(e) => {
                error!("Schedule: cannot read {}: {}", path.display(), e);
                return Err(StoreError::Io);
            }
        };
        info!(
            "Schedule: loaded {} time(s) from {}",
            times.len(),
            path.display()
        );
        Ok(Self {
            path,
            times: Mutex::new(times),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn times(&self) -> MutexGuard<'_, BTreeSet<TimeOfDay>> {
        self.times.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, times: &BTreeSet<TimeOfDay>) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(times).map_err(|_| StoreError::Corrupted)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)
            .and_then(|()| fs::rename(&tmp, &self.path))
            .map_err(|e| {
                error!("Schedule: write to {} failed: {}", self.path.display(), e);
                StoreError::Io
            })
    }

    /// Apply `change` to a copy; commit it only if the file write succeeds.
    fn update(
        &self,
        change: impl FnOnce(&mut BTreeSet<TimeOfDay>) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        let mut times = self.times();
        let mut next = times.clone();
        change(&mut next)?;
        self.persist(&next)?;
        *times = next;
        Ok(())
    }
}

impl ScheduleStore for FileScheduleStore {
    fn list_times(&self) -> Result<Vec<TimeOfDay>, StoreError> {
        Ok(self.times().iter().copied().collect())
    }

    fn add(&self, time: TimeOfDay) -> Result<(), StoreError> {
        self.update(|set| {
            if set.insert(time) {
                Ok(())
            } else {
                Err(StoreError::Duplicate)
            }
        })
    }

    fn remove(&self, time: TimeOfDay) -> Result<(), StoreError> {
        self.update(|set| {
            if set.remove(&time) {
                Ok(())
            } else {
                Err(StoreError::NotFound)
            }
        })
    }

    fn contains(&self, time: TimeOfDay) -> Result<bool, StoreError> {
        Ok(self.times().contains(&time))
    }
}
