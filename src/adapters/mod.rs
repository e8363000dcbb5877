//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to               |
//! |----------------|--------------------|---------------------------|
//! | `clock`        | Clock              | Host clock (chrono)       |
//! | `file_store`   | ScheduleStore      | JSON file on disk         |
//! | `log_sink`     | BroadcastSink      | `log` records / JSON lines|
//! |                | FeedActuator       |                           |
//! | `memory`       | ScheduleStore      | In-process collections    |
//! |                | SampleStore        |                           |
//! | `notifier`     | NotificationChannel| `log` warning records     |

pub mod clock;
pub mod file_store;
pub mod log_sink;
pub mod memory;
pub mod notifier;
