//! [`FeedController`] – drives a [`LiveOpsSimulator`] on a Tokio interval.
//!
//! The controller owns the tick timer.  Snapshot listeners registered with
//! [`FeedController::on_update`] receive a [`FeedSnapshot`] after every
//! tick; a panicking listener is logged and skipped.
//!
//! Stopping aborts the timer task, so no tick can land after
//! [`FeedController::stop_live_feed`] returns.  Dropping the controller does
//! the same.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tablepulse_types::FeedSnapshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::simulator::LiveOpsSimulator;

/// Nominal feed cadence.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(3_000);

pub type SnapshotListener = Arc<dyn Fn(&FeedSnapshot) + Send + Sync>;

type Listeners = Arc<Mutex<Vec<SnapshotListener>>>;

pub struct FeedController {
    simulator: Arc<Mutex<LiveOpsSimulator>>,
    listeners: Listeners,
    tick_interval: Duration,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl FeedController {
    pub fn new(simulator: LiveOpsSimulator, tick_interval: Duration) -> Self {
        Self {
            simulator: Arc::new(Mutex::new(simulator)),
            listeners: Arc::new(Mutex::new(Vec::new())),
            tick_interval,
            timer: Mutex::new(None),
        }
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Start ticking.  Calling it again while active only resets the last
    /// update timestamp.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start_live_feed(&self) {
        lock(&self.simulator).start();

        let mut timer = lock(&self.timer);
        if timer.as_ref().is_some_and(|t| !t.is_finished()) {
            debug!("live feed already running");
            return;
        }
        *timer = Some(tokio::spawn(run_timer(
            Arc::clone(&self.simulator),
            Arc::clone(&self.listeners),
            self.tick_interval,
        )));
        info!(interval_ms = self.tick_interval.as_millis() as u64, "live feed started");
    }

    /// Stop ticking.  No-op when already stopped.
    pub fn stop_live_feed(&self) {
        if let Some(timer) = lock(&self.timer).take() {
            timer.abort();
            info!("live feed stopped");
        }
        lock(&self.simulator).stop();
    }

    pub fn is_active(&self) -> bool {
        lock(&self.simulator).is_running()
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        lock(&self.simulator).last_update()
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        lock(&self.simulator).snapshot()
    }

    /// Acknowledge the alert `id`; `false` when it does not exist.
    pub fn acknowledge_alert(&self, id: &str) -> bool {
        lock(&self.simulator).acknowledge_alert(id)
    }

    pub fn clear_acknowledged_alerts(&self) -> usize {
        lock(&self.simulator).clear_acknowledged_alerts()
    }

    /// Register `listener` for the snapshot produced by every tick.
    pub fn on_update(&self, listener: SnapshotListener) {
        lock(&self.listeners).push(listener);
    }

    /// Run one tick immediately, outside the timer.
    ///
    /// Returns `false` without notifying anyone while the feed is stopped.
    pub fn tick_now(&self) -> bool {
        tick_and_notify(&self.simulator, &self.listeners)
    }
}

impl Drop for FeedController {
    fn drop(&mut self) {
        if let Some(timer) = lock(&self.timer).take() {
            timer.abort();
        }
    }
}

async fn run_timer(
    simulator: Arc<Mutex<LiveOpsSimulator>>,
    listeners: Listeners,
    period: Duration,
) {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    // A late tick is followed by a full period rather than a burst.
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        tick_and_notify(&simulator, &listeners);
    }
}

fn tick_and_notify(
    simulator: &Mutex<LiveOpsSimulator>,
    listeners: &Mutex<Vec<SnapshotListener>>,
) -> bool {
    let snapshot = {
        let mut sim = lock(simulator);
        if !sim.tick() {
            return false;
        }
        sim.snapshot()
    };
    let listeners: Vec<SnapshotListener> = lock(listeners).clone();
    for listener in &listeners {
        if catch_unwind(AssertUnwindSafe(|| listener(&snapshot))).is_err() {
            error!("snapshot listener panicked");
        }
    }
    true
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
