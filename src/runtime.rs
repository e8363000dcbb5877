//! Background runtime — reactor-driven periodic tasks.
//!
//! Runs in a dedicated thread using `edge-executor` for cooperative
//! multi-task scheduling and `async-io-mini` for reactor-driven timers (no
//! busy-spinning). Three concurrent futures:
//!
//! 1. **Evaluate** — schedule evaluation every `evaluator_interval_ms`
//! 2. **Prune** — execution-history pruning every `history_prune_interval_ms`
//! 3. **Dispatch** — truly async via `Outbox::receive().await`
//!    (wakes as soon as ingest queues a notification)
//!
//! ```text
//!  ┌────────────────────────────────────────────────────────────┐
//!  │  Runtime Thread                                            │
//!  │  ┌──────────────────────────────────────────────────────┐  │
//!  │  │  futures_lite::block_on(executor.run(stop.wait()))   │  │
//!  │  │  ┌──────────────────────────────────────────────────┐│  │
//!  │  │  │  edge_executor::LocalExecutor                    ││  │
//!  │  │  │                                                  ││  │
//!  │  │  │  ┌──────────┐  ┌──────────┐  ┌───────────────┐  ││  │
//!  │  │  │  │ Evaluate │  │  Prune   │  │ Dispatch      │  ││  │
//!  │  │  │  │ 60 s ⏱   │  │  1 h ⏱   │  │ wake-on-send  │  ││  │
//!  │  │  │  └──────────┘  └──────────┘  └───────────────┘  ││  │
//!  │  │  └──────────────────────────────────────────────────┘│  │
//!  │  └──────────────────────────────────────────────────────┘  │
//!  └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Periodic loops keep a fixed deadline grid. A tick that finishes after
//! the next deadline skips the missed ticks instead of running them back to
//! back, so evaluations never overlap or pile up.

use core::time::Duration;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
// Links the std time driver that `async_io_mini::Timer` runs on.
use embassy_time as _;
use log::{debug, info, warn};

use crate::app::ports::NotificationChannel;
use crate::app::service::AppService;
use crate::notify::NotificationDispatcher;
use crate::scheduler::TickOutcome;

type StopSignal = Signal<CriticalSectionRawMutex, ()>;

// ── Deadline grid ────────────────────────────────────────────

/// Fixed-period deadline tracker.
#[derive(Debug, Clone, Copy)]
struct Ticker {
    period: Duration,
    next: Instant,
}

impl Ticker {
    fn new(period: Duration, start: Instant) -> Self {
        Self {
            period,
            next: start + period,
        }
    }

    /// Advance past `now`. Returns the number of deadlines skipped.
    fn advance(&mut self, now: Instant) -> u32 {
        self.next += self.period;
        let mut skipped = 0;
        while self.next <= now {
            self.next += self.period;
            skipped += 1;
        }
        skipped
    }

    async fn wait(&self) {
        let delay = self.next.saturating_duration_since(Instant::now());
        async_io_mini::Timer::after(delay).await;
    }
}

// ── Tasks ────────────────────────────────────────────────────

async fn evaluate_loop(service: Arc<AppService>, period: Duration) {
    let mut ticker = Ticker::new(period, Instant::now());
    loop {
        ticker.wait().await;
        match service.evaluate_tick() {
            TickOutcome::Fired(record) => debug!("Runtime: tick fired at {}", record.time_of_day),
            TickOutcome::Busy => warn!("Runtime: previous evaluation still running"),
            _ => {}
        }
        let skipped = ticker.advance(Instant::now());
        if skipped > 0 {
            warn!("Runtime: evaluation overran, {} tick(s) skipped", skipped);
        }
    }
}

async fn prune_loop(service: Arc<AppService>, period: Duration) {
    let mut ticker = Ticker::new(period, Instant::now());
    loop {
        ticker.wait().await;
        service.prune_history();
        ticker.advance(Instant::now());
    }
}

fn run_loop<C: NotificationChannel>(
    service: Arc<AppService>,
    dispatcher: NotificationDispatcher<C>,
    stop: Arc<StopSignal>,
) {
    let executor: edge_executor::LocalExecutor<'_, 4> = edge_executor::LocalExecutor::new();

    let config = service.config().clone();
    executor
        .spawn(evaluate_loop(Arc::clone(&service), config.evaluator_interval()))
        .detach();
    executor
        .spawn(prune_loop(Arc::clone(&service), config.history_prune_interval()))
        .detach();
    executor.spawn(dispatcher.run()).detach();

    info!(
        "Runtime started (evaluate every {:?}, prune every {:?})",
        config.evaluator_interval(),
        config.history_prune_interval()
    );

    futures_lite::future::block_on(executor.run(stop.wait()));

    // Tasks borrow the dispatcher; drop them before touching it again.
    drop(executor);
    dispatcher.abandon_pending();
    info!("Runtime stopped");
}

// ── Handle ───────────────────────────────────────────────────

/// Owns the runtime thread. Dropping the handle stops it.
pub struct RuntimeHandle {
    stop: Arc<StopSignal>,
    thread: Option<JoinHandle<()>>,
}

impl RuntimeHandle {
    /// Signal the tasks to stop and wait for the thread to exit.
    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        self.stop.signal(());
        if thread.join().is_err() {
            warn!("Runtime: thread panicked");
        }
    }
}

impl Drop for RuntimeHandle {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

/// Spawn the runtime thread.
///
/// Takes ownership of the dispatcher; the service is shared with the
/// caller, which keeps using it for ingest and commands.
pub fn spawn<C>(
    service: Arc<AppService>,
    dispatcher: NotificationDispatcher<C>,
) -> std::io::Result<RuntimeHandle>
where
    C: NotificationChannel + Send + 'static,
{
    let stop = Arc::new(StopSignal::new());
    let thread_stop = Arc::clone(&stop);
    let thread = std::thread::Builder::new()
        .name("feederhub-rt".into())
        .spawn(move || run_loop(service, dispatcher, thread_stop))?;

    Ok(RuntimeHandle {
        stop,
        thread: Some(thread),
    })
}
