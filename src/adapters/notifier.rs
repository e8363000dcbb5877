//! Log-backed notification channel.
//!
//! Stands in for an external chat transport: every alert becomes a
//! `warn!` record, so it lands wherever `RUST_LOG` output goes.

use log::warn;

use crate::app::ports::{NotificationChannel, NotifyError};

#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl NotificationChannel for LogNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        warn!("NOTIFY | {}", text.replace('\n', " | "));
        Ok(())
    }
}
