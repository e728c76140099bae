//! Shared polling clock.
//!
//! One [`Ticker`] drives every viewer that wants periodic reloads, so several
//! widgets on a page never start parallel timers. Viewers hold a
//! [`TickSubscription`]; dropping it (or calling
//! [`TickSubscription::unsubscribe`]) leaves the ticker.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, warn};

const CHANNEL_CAPACITY: usize = 16;

/// Periodic tick source with an explicit start/stop lifecycle.
///
/// Ticks are only emitted while the ticker is visible (the page is in the
/// foreground) and someone is subscribed. Must be started from inside a
/// tokio runtime.
pub struct Ticker {
    period: Duration,
    sender: broadcast::Sender<u64>,
    visible: Arc<AtomicBool>,
    sequence: Arc<AtomicU64>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            period,
            sender,
            visible: Arc::new(AtomicBool::new(true)),
            sequence: Arc::new(AtomicU64::new(0)),
            task: Mutex::new(None),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Start emitting ticks. Calling `start` on a running ticker is a no-op.
    pub fn start(&self) {
        let mut task = self.lock_task();
        if task.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }

        let period = self.period;
        let sender = self.sender.clone();
        let visible = Arc::clone(&self.visible);
        let sequence = Arc::clone(&self.sequence);

        *task = Some(tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if !visible.load(Ordering::Relaxed) || sender.receiver_count() == 0 {
                    continue;
                }
                let seq = sequence.fetch_add(1, Ordering::Relaxed) + 1;
                if sender.send(seq).is_err() {
                    debug!(seq, "tick dropped, no subscribers");
                }
            }
        }));
        debug!(period_ms = period.as_millis() as u64, "ticker started");
    }

    /// Stop emitting ticks. Subscriptions stay valid and resume receiving
    /// after the next [`start`](Self::start).
    pub fn stop(&self) {
        if let Some(handle) = self.lock_task().take() {
            handle.abort();
            debug!("ticker stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.lock_task().as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Page visibility: hidden pages do not poll.
    pub fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::Relaxed);
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Relaxed)
    }

    pub fn subscribe(&self) -> TickSubscription {
        TickSubscription {
            inner: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    fn lock_task(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        // The guarded value is a plain handle; a poisoned lock is still usable.
        self.task.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// A viewer's handle on the shared ticker.
pub struct TickSubscription {
    inner: broadcast::Receiver<u64>,
}

impl TickSubscription {
    /// Wait for the next tick. Missed ticks are skipped; returns `None` once
    /// the ticker is gone.
    pub async fn next(&mut self) -> Option<u64> {
        loop {
            match self.inner.recv().await {
                Ok(seq) => return Some(seq),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "subscriber lagged behind ticker");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Leave the ticker explicitly (same as dropping the subscription).
    pub fn unsubscribe(self) {}
}
