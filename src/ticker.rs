use crate::monitor::ActivityMonitor;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Host wall clock in milliseconds since the Unix epoch.
pub fn now_msec() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// The cancellable 1-second recurring tick driving idle detection.
///
/// At most one tick task is live per account: spawning aborts any prior
/// handle first, and cancellation is a fire-and-forget abort. The loop also
/// exits on its own once the account leaves Running, so a missed cancel
/// cannot keep a tick source alive.
pub struct Ticker {
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Ticker {
    pub fn new() -> Self {
        Self {
            handle: Mutex::new(None),
        }
    }

    /// Begin the 1-second cadence against `monitor`. Requires a tokio runtime
    /// on the calling thread; without one there is no tick source and idle
    /// detection does not run (account transitions still work).
    pub(crate) fn spawn(&self, monitor: Arc<ActivityMonitor>) {
        let mut slot = match self.handle.lock() {
            Ok(slot) => slot,
            Err(e) => {
                warn!("[TICKER] Mutex poisoned: {}", e);
                return;
            }
        };
        if let Some(prev) = slot.take() {
            prev.abort();
        }
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(rt) => rt,
            Err(_) => {
                debug!("[TICKER] No tokio runtime, tick source not started");
                return;
            }
        };
        *slot = Some(runtime.spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            // Fixed-delay cadence; a stalled host must not burst-fire ticks.
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval.tick().await; // first tick completes immediately
            loop {
                interval.tick().await;
                let went_idle = monitor.on_tick(now_msec()).unwrap_or(false);
                monitor.redraw();
                if went_idle || !monitor.account().is_running().unwrap_or(false) {
                    debug!("[TICKER] Account left Running, tick source stopping");
                    break;
                }
            }
        }));
    }

    /// Non-blocking cancel of the pending tick task. Idempotent.
    pub fn cancel(&self) {
        if let Ok(mut slot) = self.handle.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }

    /// Whether a tick task is currently scheduled.
    pub fn is_active(&self) -> bool {
        self.handle
            .lock()
            .map(|slot| slot.as_ref().is_some_and(|h| !h.is_finished()))
            .unwrap_or(false)
    }
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel();
    }
}
