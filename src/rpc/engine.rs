//! RPC engine — dispatches incoming JSON requests to the AppService.
//!
//! **Transport-decoupled**: the engine does not own a transport. Callers
//! feed raw bytes via [`RpcEngine::feed_bytes`] (or a complete line via
//! [`RpcEngine::dispatch`]) and receive serialized response lines.
//!
//! All requests pass through a two-gate pipeline:
//!
//! 1. **Rate limiting** — token-bucket rejects bursts (via `burster`).
//! 2. **Decode** — the line must be a JSON object with a known `op`.
//!
//! Request:  `{"id": 7, "op": "schedule_add", "time": "07:30"}`
//! Response: `{"id": 7, "ok": true, "status": 200, "data": "07:30"}`

use core::time::Duration;

use burster::Limiter;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::app::commands::{AppCommand, AppReply};
use crate::app::service::AppService;
use crate::config::SystemConfig;
use crate::error::Error;

use super::codec::LineDecoder;

/// Status for frames rejected by the rate limiter.
pub const STATUS_RATE_LIMITED: u16 = 429;
/// Status for lines that are not a valid request.
pub const STATUS_BAD_REQUEST: u16 = 400;

#[derive(Debug, Serialize)]
struct ErrorBody {
    kind: &'static str,
    message: String,
}

#[derive(Debug, Serialize)]
struct Response {
    id: u64,
    ok: bool,
    status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<AppReply>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorBody>,
}

impl Response {
    fn success(id: u64, reply: AppReply) -> Self {
        Self {
            id,
            ok: true,
            status: reply.status(),
            data: Some(reply),
            error: None,
        }
    }

    fn failure(id: u64, status: u16, kind: &'static str, message: String) -> Self {
        Self {
            id,
            ok: false,
            status,
            data: None,
            error: Some(ErrorBody { kind, message }),
        }
    }

    fn from_error(id: u64, e: &Error) -> Self {
        Self::failure(id, e.status(), e.kind(), e.to_string())
    }

    fn to_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            warn!("RPC: response encoding failed: {}", e);
            format!(
                r#"{{"id":{},"ok":false,"status":500,"error":{{"kind":"internal","message":"encoding failed"}}}}"#,
                self.id
            )
        })
    }
}

/// Transport-decoupled RPC engine for one client stream.
pub struct RpcEngine {
    decoder: LineDecoder,
    rate_limiter: burster::TokenBucket<fn() -> Duration>,
    handled: u64,
    rejected: u64,
}

impl RpcEngine {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            decoder: LineDecoder::new(),
            rate_limiter: burster::TokenBucket::new_with_time_provider(
                config.rate_limit_per_sec,
                config.rate_limit_burst,
                platform_now as fn() -> Duration,
            ),
            handled: 0,
            rejected: 0,
        }
    }

    /// Requests answered successfully so far.
    pub fn handled(&self) -> u64 {
        self.handled
    }

    /// Requests answered with an error (including rate-limited ones).
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    /// Feed raw bytes from the client and dispatch every complete line.
    /// Returns one response line per request, in order.
    pub fn feed_bytes(&mut self, data: &[u8], app: &AppService) -> Vec<String> {
        let mut lines = Vec::new();
        // The decoder borrows its own buffer while yielding; collect first.
        self.decoder.feed(data, |l| lines.push(l.to_vec()));
        lines.iter().map(|l| self.dispatch(l, app)).collect()
    }

    /// Dispatch one complete request line. Returns the response line
    /// (without the trailing newline).
    pub fn dispatch(&mut self, line: &[u8], app: &AppService) -> String {
        let response = self.dispatch_inner(line, app);
        if response.ok {
            self.handled += 1;
        } else {
            self.rejected += 1;
        }
        response.to_line()
    }

    fn dispatch_inner(&mut self, line: &[u8], app: &AppService) -> Response {
        let parsed: Result<Value, _> = serde_json::from_slice(line);
        let id = parsed
            .as_ref()
            .ok()
            .and_then(|v| v.get("id"))
            .and_then(Value::as_u64)
            .unwrap_or(0);

        if self.rate_limiter.try_consume(1).is_err() {
            warn!("RPC: rate limit exceeded (request {})", id);
            return Response::failure(
                id,
                STATUS_RATE_LIMITED,
                "rate_limited",
                "rate limit exceeded".into(),
            );
        }

        let value = match parsed {
            Ok(v) => v,
            Err(e) => {
                warn!("RPC: malformed request: {}", e);
                return Response::failure(
                    id,
                    STATUS_BAD_REQUEST,
                    "bad_request",
                    format!("malformed JSON: {}", e),
                );
            }
        };

        let command = match AppCommand::deserialize(value) {
            Ok(c) => c,
            Err(e) => {
                warn!("RPC: unrecognised request {}: {}", id, e);
                return Response::failure(id, STATUS_BAD_REQUEST, "bad_request", e.to_string());
            }
        };
        debug!("RPC: request {} -> {:?}", id, command);

        match app.handle_command(command) {
            Ok(reply) => Response::success(id, reply),
            Err(e) => Response::from_error(id, &e),
        }
    }
}

// ── Platform time for rate limiter ───────────────────────────

fn platform_now() -> Duration {
    use std::time::Instant;
    static START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();
    START.get_or_init(Instant::now).elapsed()
}
