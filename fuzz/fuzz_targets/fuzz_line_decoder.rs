//! Fuzz target: `LineDecoder::feed`
//!
//! Drives arbitrary byte sequences into the streaming line decoder, split
//! at a fuzzer-chosen point, and asserts that it never panics and never
//! yields an empty, oversized or newline-bearing line.
//!
//! cargo fuzz run fuzz_line_decoder

#![no_main]

use feederhub::rpc::codec::{LineDecoder, MAX_LINE_SIZE};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&cut, rest)) = data.split_first() else {
        return;
    };
    let cut = usize::from(cut).min(rest.len());

    let mut decoder = LineDecoder::new();
    let check = |line: &[u8]| {
        assert!(!line.is_empty());
        assert!(line.len() <= MAX_LINE_SIZE);
        assert!(!line.contains(&b'\n'));
    };
    decoder.feed(&rest[..cut], check);
    decoder.feed(&rest[cut..], check);
    assert!(decoder.pending() <= MAX_LINE_SIZE);

    // After a reset the decoder must accept bytes cleanly again.
    decoder.reset();
    decoder.feed(rest, check);
});
