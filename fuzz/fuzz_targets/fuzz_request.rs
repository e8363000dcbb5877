//! Fuzz target: request decoding
//!
//! Any line a client sends must either decode into an `AppCommand` or be
//! rejected with an error. Never a panic.
//!
//! cargo fuzz run fuzz_request

#![no_main]

use feederhub::app::commands::AppCommand;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(AppCommand::Ingest(reading)) = serde_json::from_slice::<AppCommand>(data) {
        let _ = reading.validate();
    }
});
