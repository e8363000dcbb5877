//! Process-local hub state.
//!
//! Everything the core mutates lives here: the alert cooldown ledger, the
//! feeding trigger's dedup timestamp and the execution history. The state
//! is built once at startup and shared by `Arc` between the ingest path and
//! the runtime tasks. Nothing in it is persisted; a restart starts clean.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::config::SystemConfig;
use crate::cooldown::CooldownLedger;
use crate::history::ExecutionHistory;
use crate::scheduler::FeedingTrigger;

#[derive(Debug)]
pub struct HubState {
    pub cooldown: CooldownLedger,
    pub feeding: FeedingTrigger,
    history: Mutex<ExecutionHistory>,
}

impl HubState {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            cooldown: CooldownLedger::new(config.alert_cooldown()),
            feeding: FeedingTrigger::new(config.feed_dedup_window()),
            history: Mutex::new(ExecutionHistory::new()),
        }
    }

    /// Lock the execution history. Held only for single push/prune/copy
    /// operations; never while another hub lock is held.
    pub fn history(&self) -> MutexGuard<'_, ExecutionHistory> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
