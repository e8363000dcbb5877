//! Transport-agnostic command surface.
//!
//! Line-delimited JSON requests in, line-delimited JSON responses out.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                      RPC Stack                             │
//! │                                                            │
//! │  ┌──────────┐   ┌──────────┐   ┌───────────────────────┐   │
//! │  │  Reader  │──▶│  Codec   │──▶│  Engine (dispatcher)  │   │
//! │  │ (stdin…) │   │ (lines)  │   │  → AppService         │   │
//! │  └──────────┘   └──────────┘   └───────────┬───────────┘   │
//! │       ▲                                    │               │
//! │       │              ┌─────────────────────┘               │
//! │       │              ▼                                     │
//! │  ┌──────────┐   response line                              │
//! │  │  Writer  │◀── { id, ok, status, data | error }          │
//! │  └──────────┘                                              │
//! └────────────────────────────────────────────────────────────┘
//! ```

pub mod codec;
pub mod engine;
