//! Application core — domain logic behind port traits.
//!
//! This module contains the business rules for the feeder hub: telemetry
//! ingest, alert classification and cooldown, and the feeding trigger.
//! All interaction with storage, viewers, the device and the operator
//! happens through **port traits** defined in [`ports`], keeping this layer
//! fully testable without a database or network.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
pub mod state;
