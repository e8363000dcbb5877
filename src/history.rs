//! Feed execution history.
//!
//! A fixed-capacity ring of the most recent [`FeedRecord`]s. When full, the
//! oldest record is evicted on push; a periodic prune additionally drops
//! records older than the retention window. Racing fires may push out of
//! time order, so pruning checks every record.

use chrono::{DateTime, Utc};
use heapless::Deque;

use crate::scheduler::FeedRecord;

/// Records kept in memory.
pub const HISTORY_CAPACITY: usize = 64;

#[derive(Debug)]
pub struct ExecutionHistory<const N: usize = HISTORY_CAPACITY> {
    records: Deque<FeedRecord, N>,
    total: u64,
}

impl<const N: usize> Default for ExecutionHistory<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ExecutionHistory<N> {
    pub const fn new() -> Self {
        Self {
            records: Deque::new(),
            total: 0,
        }
    }

    /// Append a record, evicting the oldest when full.
    pub fn push(&mut self, record: FeedRecord) {
        if self.records.is_full() {
            self.records.pop_front();
        }
        // Room was made above.
        let _ = self.records.push_back(record);
        self.total += 1;
    }

    /// Drop every record older than `cutoff`. Returns how many were removed.
    pub fn prune_older_than(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.records.len();
        for _ in 0..before {
            let Some(record) = self.records.pop_front() else {
                break;
            };
            if record.at >= cutoff {
                // Slot just freed by pop_front.
                let _ = self.records.push_back(record);
            }
        }
        before - self.records.len()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Records ever pushed, including evicted ones.
    pub fn total_recorded(&self) -> u64 {
        self.total
    }

    pub fn latest(&self) -> Option<&FeedRecord> {
        self.records.back()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &FeedRecord> {
        self.records.iter()
    }

    pub fn snapshot(&self) -> Vec<FeedRecord> {
        self.records.iter().cloned().collect()
    }
}
