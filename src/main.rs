//! Feeder hub — host runner.
//!
//! Wires the shipped adapters around the application core and speaks
//! line-delimited JSON: requests on stdin, responses and live events on
//! stdout, logs on stderr.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SystemClock   FileScheduleStore / MemoryScheduleStore         │
//! │  (Clock)       (ScheduleStore)                                 │
//! │  MemorySampleStore   JsonLineSink(stdout)     LogNotifier      │
//! │  (SampleStore)       (Broadcast + Actuator)   (Notification)   │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Classifier · Cooldown · FeedingTrigger · History      │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Runtime thread: evaluate · prune · dispatch   RpcEngine(stdin)│
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `feederhub [config.json]` (or `FEEDERHUB_CONFIG=config.json`).
//! Closing stdin shuts the hub down.

use std::io::{self, ErrorKind, Read, Write};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use log::info;

use feederhub::adapters::clock::SystemClock;
use feederhub::adapters::file_store::FileScheduleStore;
use feederhub::adapters::log_sink::JsonLineSink;
use feederhub::adapters::memory::{MemorySampleStore, MemoryScheduleStore};
use feederhub::adapters::notifier::LogNotifier;
use feederhub::app::ports::ScheduleStore;
use feederhub::app::service::{Adapters, AppService};
use feederhub::app::state::HubState;
use feederhub::config::SystemConfig;
use feederhub::notify::{NotificationDispatcher, Outbox};
use feederhub::rpc::codec::encode_line;
use feederhub::rpc::engine::RpcEngine;
use feederhub::runtime;

const READ_BUF_SIZE: usize = 1024;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("feederhub v{}", env!("CARGO_PKG_VERSION"));

    // ── 1. Configuration ──────────────────────────────────────
    let config = load_config()?;

    // ── 2. Adapters ───────────────────────────────────────────
    let schedule: Arc<dyn ScheduleStore> = match &config.schedule_path {
        Some(path) => Arc::new(
            FileScheduleStore::open(path).map_err(|e| anyhow!("schedule file {}: {}", path, e))?,
        ),
        None => {
            info!("Schedule: in-memory only");
            Arc::new(MemoryScheduleStore::new())
        }
    };
    let events = Arc::new(JsonLineSink::new(io::stdout()));
    let adapters = Adapters {
        clock: Arc::new(SystemClock::from_config(&config)),
        schedule,
        samples: Arc::new(MemorySampleStore::new()),
        broadcast: events.clone(),
        actuator: events,
    };

    // ── 3. Core + runtime ─────────────────────────────────────
    let state = Arc::new(HubState::new(&config));
    let outbox = Arc::new(Outbox::new());
    let service = Arc::new(AppService::new(
        config.clone(),
        Arc::clone(&state),
        Arc::clone(&outbox),
        adapters,
    ));
    let dispatcher =
        NotificationDispatcher::new(LogNotifier::new(), state, outbox, config.dispatch_timeout());
    let rt = runtime::spawn(Arc::clone(&service), dispatcher).context("spawning runtime thread")?;

    // ── 4. Command loop ───────────────────────────────────────
    info!("System ready. Reading requests from stdin.");
    let mut engine = RpcEngine::new(&config);
    let mut input = io::stdin().lock();
    let mut buf = [0u8; READ_BUF_SIZE];
    let mut out = Vec::new();

    loop {
        let n = match input.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e).context("reading stdin"),
        };
        for response in engine.feed_bytes(&buf[..n], &service) {
            out.clear();
            if encode_line(response.as_bytes(), &mut out).is_some() {
                io::stdout().write_all(&out).context("writing response")?;
            }
        }
    }

    info!(
        "stdin closed ({} handled, {} rejected), shutting down",
        engine.handled(),
        engine.rejected()
    );
    rt.shutdown();
    Ok(())
}

/// Config from argv[1], else `FEEDERHUB_CONFIG`, else defaults.
fn load_config() -> Result<SystemConfig> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("FEEDERHUB_CONFIG").ok());

    let Some(path) = path else {
        info!("Config: defaults");
        return Ok(SystemConfig::default());
    };

    let text =
        std::fs::read_to_string(&path).with_context(|| format!("reading config {}", path))?;
    let config =
        SystemConfig::from_json(&text).with_context(|| format!("parsing config {}", path))?;
    info!("Config loaded from {}", path);
    Ok(config)
}
