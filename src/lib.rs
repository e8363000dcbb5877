//! Feeder hub library.
//!
//! Telemetry ingest, alert classification with per-category cooldown, and
//! the scheduled/manual feeding trigger for a single remote fish feeder.
//! Exposes every module for integration testing; the `feederhub` binary
//! wires the shipped adapters together.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod classifier;
pub mod config;
pub mod cooldown;
pub mod error;
pub mod history;
pub mod notify;
pub mod rpc;
pub mod runtime;
pub mod scheduler;
pub mod telemetry;
