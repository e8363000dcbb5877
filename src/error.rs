//! Unified error types for the feeder hub.
//!
//! A single `Error` enum that every operation funnels into, so the command
//! surface can map failures to a status uniformly. Variants are `Copy`;
//! port-level errors ([`StoreError`], [`NotifyError`]) convert via `From`.

use core::fmt;

use crate::app::ports::{NotifyError, StoreError};
use crate::telemetry::TimeOfDay;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Request rejected before any state was touched.
    Validation(ValidationError),
    /// Schedule time already registered.
    DuplicateEntry(TimeOfDay),
    /// Schedule time to delete is not registered.
    NotFound(TimeOfDay),
    /// The sample or schedule store failed. The sample is lost.
    Persistence(StoreError),
    /// Outbound notification failed. Logged by the dispatcher, never
    /// returned from ingest.
    NotificationDispatch(NotifyError),
}

impl Error {
    /// HTTP-style status the command surface reports for this error.
    pub const fn status(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::DuplicateEntry(_) => 400,
            Self::NotFound(_) => 404,
            Self::Persistence(_) => 500,
            Self::NotificationDispatch(_) => 502,
        }
    }

    /// Stable machine-readable tag.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::DuplicateEntry(_) => "duplicate_entry",
            Self::NotFound(_) => "not_found",
            Self::Persistence(_) => "persistence",
            Self::NotificationDispatch(_) => "notification_dispatch",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(e) => write!(f, "validation: {e}"),
            Self::DuplicateEntry(t) => write!(f, "schedule {t} already exists"),
            Self::NotFound(t) => write!(f, "schedule {t} not found"),
            Self::Persistence(e) => write!(f, "persistence: {e}"),
            Self::NotificationDispatch(e) => write!(f, "notification: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Validation errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was absent or empty.
    MissingField(&'static str),
    /// A numeric field was NaN or infinite.
    NotFinite(&'static str),
    /// Time string is not `HH:MM`.
    BadTimeFormat,
    /// `HH:MM` shape but hour > 23 or minute > 59.
    TimeOutOfRange,
    /// A query parameter is outside its accepted range.
    OutOfRange(&'static str),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField(name) => write!(f, "missing field `{name}`"),
            Self::NotFinite(name) => write!(f, "field `{name}` must be a finite number"),
            Self::BadTimeFormat => write!(f, "time must be formatted HH:MM"),
            Self::TimeOutOfRange => write!(f, "time must be between 00:00 and 23:59"),
            Self::OutOfRange(what) => write!(f, "{what} out of range"),
        }
    }
}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Self::Persistence(e)
    }
}

impl From<NotifyError> for Error {
    fn from(e: NotifyError) -> Self {
        Self::NotificationDispatch(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
