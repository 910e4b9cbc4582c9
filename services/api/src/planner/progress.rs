//! services/api/src/planner/progress.rs
//!
//! A simulated progress percentage shown while a generation request is in flight.
//!
//! The value climbs on a fixed tick along a decelerating curve that approaches,
//! but never reaches, 95. Only `complete` moves it to 100.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

/// The simulated value never reaches this on its own.
pub const PROGRESS_CEILING: f64 = 95.0;
pub const PROGRESS_COMPLETE: f64 = 100.0;
pub const PROGRESS_TICK: Duration = Duration::from_millis(100);

const MIN_STEP: f64 = 0.1;
const STEP_FRACTION: f64 = 0.05;

/// One tick of the curve: advance by 5% of the remaining distance to the
/// ceiling, but at least 0.1. A step that would reach the ceiling is not taken.
pub fn next_progress(current: f64) -> f64 {
    if current >= PROGRESS_CEILING {
        return current;
    }
    let step = ((PROGRESS_CEILING - current) * STEP_FRACTION).max(MIN_STEP);
    let next = current + step;
    if next >= PROGRESS_CEILING {
        current
    } else {
        next
    }
}

pub struct ProgressSimulator {
    value: Arc<watch::Sender<f64>>,
    ticker: Mutex<Option<JoinHandle<()>>>,
    tick: Duration,
}

impl ProgressSimulator {
    pub fn new(tick: Duration) -> Self {
        let (sender, _) = watch::channel(0.0);
        Self {
            value: Arc::new(sender),
            ticker: Mutex::new(None),
            tick,
        }
    }

    pub fn value(&self) -> f64 {
        *self.value.borrow()
    }

    /// Resets to 0 and starts ticking, replacing any simulation already running.
    pub async fn start(&self) {
        let mut ticker = self.ticker.lock().await;
        if let Some(previous) = ticker.take() {
            previous.abort();
        }
        self.value.send_replace(0.0);

        let value = self.value.clone();
        let tick = self.tick;
        *ticker = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + tick, tick);
            loop {
                interval.tick().await;
                value.send_modify(|current| *current = next_progress(*current));
            }
        }));
    }

    /// Stops ticking and holds the current value. Stopping twice is a no-op.
    pub async fn stop(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
        }
    }

    /// Stops ticking and jumps to 100.
    pub async fn complete(&self) {
        self.stop().await;
        self.value.send_replace(PROGRESS_COMPLETE);
    }

    pub async fn is_running(&self) -> bool {
        self.ticker.lock().await.is_some()
    }
}

impl Default for ProgressSimulator {
    fn default() -> Self {
        Self::new(PROGRESS_TICK)
    }
}
