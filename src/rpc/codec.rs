//! Newline-delimited frame codec.
//!
//! Wire format:
//! ```text
//! ┌──────────────────────────┬────┐
//! │ JSON document (N B)      │ \n │
//! └──────────────────────────┴────┘
//! ```
//!
//! The decoder accumulates incoming bytes and yields complete lines. This
//! handles partial reads: a single read may return part of a line, or
//! several lines concatenated. A trailing `\r` is stripped. Lines longer
//! than [`MAX_LINE_SIZE`] are discarded up to the next newline.

/// Maximum line payload size (protects against memory exhaustion).
pub const MAX_LINE_SIZE: usize = 4096;

/// Decoder state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    /// Copying payload bytes.
    Collecting { collected: usize },
    /// Current line overflowed; skipping to the next newline.
    Discarding,
}

/// Streaming line decoder.
pub struct LineDecoder {
    state: DecoderState,
    // One spare byte for the `\r` of a full-size CRLF line.
    buf: Box<[u8; MAX_LINE_SIZE + 1]>,
    overflows: u32,
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl LineDecoder {
    pub fn new() -> Self {
        Self {
            state: DecoderState::Collecting { collected: 0 },
            buf: Box::new([0; MAX_LINE_SIZE + 1]),
            overflows: 0,
        }
    }

    /// Feed bytes into the decoder, calling `on_line` for every complete,
    /// non-empty line.
    pub fn feed(&mut self, data: &[u8], mut on_line: impl FnMut(&[u8])) {
        for &byte in data {
            match (&mut self.state, byte) {
                (DecoderState::Discarding, b'\n') => {
                    self.state = DecoderState::Collecting { collected: 0 };
                }
                (DecoderState::Discarding, _) => {}
                (DecoderState::Collecting { collected }, b'\n') => {
                    let mut len = *collected;
                    if len > 0 && self.buf[len - 1] == b'\r' {
                        len -= 1;
                    }
                    self.state = DecoderState::Collecting { collected: 0 };
                    if len > 0 {
                        on_line(&self.buf[..len]);
                    }
                }
                (DecoderState::Collecting { collected }, _) => {
                    let full = *collected > MAX_LINE_SIZE
                        || (*collected == MAX_LINE_SIZE && byte != b'\r');
                    if full {
                        self.overflows += 1;
                        self.state = DecoderState::Discarding;
                    } else {
                        self.buf[*collected] = byte;
                        *collected += 1;
                    }
                }
            }
        }
    }

    /// Lines dropped for exceeding [`MAX_LINE_SIZE`].
    pub fn overflows(&self) -> u32 {
        self.overflows
    }

    /// Bytes buffered toward the next line.
    pub fn pending(&self) -> usize {
        match self.state {
            DecoderState::Collecting { collected } => collected,
            DecoderState::Discarding => 0,
        }
    }

    /// Drop any partial line.
    pub fn reset(&mut self) {
        self.state = DecoderState::Collecting { collected: 0 };
    }
}

/// Append `payload` and the terminating newline to `out`.
///
/// Returns `None` (leaving `out` untouched) if the payload is too large or
/// contains a newline of its own.
pub fn encode_line(payload: &[u8], out: &mut Vec<u8>) -> Option<usize> {
    if payload.len() > MAX_LINE_SIZE || payload.contains(&b'\n') {
        return None;
    }
    out.extend_from_slice(payload);
    out.push(b'\n');
    Some(payload.len() + 1)
}
