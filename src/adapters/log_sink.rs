//! Log-based and JSON-line sink adapters.
//!
//! [`LogSink`] implements [`BroadcastSink`] and [`FeedActuator`] by writing
//! one structured log line per event. [`JsonLineSink`] writes the same
//! events as JSON lines to any writer (stdout for the host runner, a pipe
//! toward a bridge process, a buffer in tests).

use std::io::Write;
use std::sync::{Mutex, PoisonError};

use log::{info, warn};
use serde::Serialize;

use crate::app::events::HubEvent;
use crate::app::ports::{BroadcastSink, FeedActuator};
use crate::scheduler::FeedCommand;

/// Adapter that logs every [`HubEvent`] and feed command.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl LogSink {
    pub fn new() -> Self {
        Self
    }
}

impl BroadcastSink for LogSink {
    fn publish(&self, event: &HubEvent) {
        match event {
            HubEvent::SensorUpdate(s) => {
                info!(
                    "SENSOR | #{} | T={:.1}\u{00b0}C | feed={:.1}cm | at={}",
                    s.id, s.temperature_c, s.feed_distance_cm, s.observed_at
                );
            }
            HubEvent::FeedFired(r) => {
                info!("FEED | source={:?} | at={}", r.source, r.time_of_day);
            }
            HubEvent::ScheduleChanged(times) => {
                let list: Vec<String> = times.iter().map(ToString::to_string).collect();
                info!("SCHEDULE | [{}]", list.join(", "));
            }
        }
    }
}

impl FeedActuator for LogSink {
    fn publish(&self, command: &FeedCommand) {
        info!(
            "ACTUATE | feed source={:?} buzzer={}",
            command.source, command.buzzer_hint
        );
    }
}

// ───────────────────────────────────────────────────────────────
// JSON lines
// ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct CommandLine<'a> {
    event: &'static str,
    payload: &'a FeedCommand,
}

/// Writes one JSON document per line.
#[derive(Debug)]
pub struct JsonLineSink<W> {
    out: Mutex<W>,
}

impl<W: Write> JsonLineSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    /// Serialise first, then emit the whole line with one `write_all`.
    fn write_line(&self, value: &impl Serialize) {
        let mut line = match serde_json::to_vec(value) {
            Ok(l) => l,
            Err(e) => {
                warn!("JsonLineSink: encoding failed: {}", e);
                return;
            }
        };
        line.push(b'\n');
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = out.write_all(&line).and_then(|()| out.flush()) {
            warn!("JsonLineSink: write failed: {}", e);
        }
    }
}

impl<W: Write + Send> BroadcastSink for JsonLineSink<W> {
    fn publish(&self, event: &HubEvent) {
        self.write_line(event);
    }
}

impl<W: Write + Send> FeedActuator for JsonLineSink<W> {
    fn publish(&self, command: &FeedCommand) {
        self.write_line(&CommandLine {
            event: "feed-command",
            payload: command,
        });
    }
}
