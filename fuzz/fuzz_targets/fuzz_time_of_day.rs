//! Fuzz target: `TimeOfDay::from_str`
//!
//! Whatever parses must print back to exactly the input.
//!
//! cargo fuzz run fuzz_time_of_day

#![no_main]

use feederhub::telemetry::TimeOfDay;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    if let Ok(t) = text.parse::<TimeOfDay>() {
        assert!(t.hour() < 24 && t.minute() < 60);
        assert_eq!(t.to_string(), text);
    }
});
