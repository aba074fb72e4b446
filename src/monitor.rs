use crate::engine::TimeAccount;
use crate::ticker::Ticker;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Called after every tick so the host can repaint. Best-effort: signals may
/// be coalesced or dropped without correctness impact.
pub type RedrawFn = Box<dyn Fn() + Send + Sync>;

/// Bridges raw input events and the 1-second tick into TimeAccount
/// transitions, and owns the tick source so at most one is ever live.
pub struct ActivityMonitor {
    account: Arc<TimeAccount>,
    last_activity_at_msec: Mutex<u64>,
    ticker: Ticker,
    on_redraw: RedrawFn,
}

impl ActivityMonitor {
    pub fn new(account: Arc<TimeAccount>, now_msec: u64, on_redraw: RedrawFn) -> Self {
        Self {
            account,
            last_activity_at_msec: Mutex::new(now_msec),
            ticker: Ticker::new(),
            on_redraw,
        }
    }

    pub fn account(&self) -> &Arc<TimeAccount> {
        &self.account
    }

    pub fn last_activity_at_msec(&self) -> Result<u64, String> {
        Ok(*self
            .last_activity_at_msec
            .lock()
            .map_err(|e| format!("Mutex poisoned: {}", e))?)
    }

    /// Raw user input (keystroke, mouse). Records the activity time and, if
    /// the account idled out, resumes it and restarts the tick.
    pub fn on_user_input(self: &Arc<Self>, now_msec: u64) -> Result<(), String> {
        {
            let mut last = self
                .last_activity_at_msec
                .lock()
                .map_err(|e| format!("Mutex poisoned: {}", e))?;
            *last = now_msec;
        }
        if self.account.is_idle()? {
            debug!("[MONITOR] Activity after idle, resuming");
            self.account.resume_from_activity(now_msec)?;
            self.ticker.spawn(Arc::clone(self));
        }
        Ok(())
    }

    /// One tick of the 1-second cadence while running. Returns whether the
    /// account went idle on this tick. The redraw signal is owned by the tick
    /// source (`ticker`), which fires it after every tick regardless of the
    /// outcome; a host driving `on_tick` directly must pair it with its own
    /// repaint.
    pub fn on_tick(&self, now_msec: u64) -> Result<bool, String> {
        if !self.account.is_running()? {
            return Ok(false);
        }
        let last = self.last_activity_at_msec()?;
        let threshold = self.account.idle_threshold_msec()?;
        if now_msec.saturating_sub(last) > threshold {
            debug!(
                "[MONITOR] Inactive for {}ms (threshold {}ms), marking idle",
                now_msec.saturating_sub(last),
                threshold
            );
            self.account.mark_idle(now_msec)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// User clicked the widget: stop if running, else start. Explicit user
    /// intent overrides idle detection, so this also leaves Idle. The click
    /// itself counts as activity, and the account transition is a single
    /// atomic toggle so a concurrent tick cannot swallow it.
    pub fn on_toggle(self: &Arc<Self>, now_msec: u64) -> Result<(), String> {
        {
            let mut last = self
                .last_activity_at_msec
                .lock()
                .map_err(|e| format!("Mutex poisoned: {}", e))?;
            *last = now_msec;
        }
        if self.account.toggle(now_msec)? {
            self.ticker.spawn(Arc::clone(self));
        } else {
            self.ticker.cancel();
        }
        Ok(())
    }

    /// Host teardown: final fold into the persisted record, then force
    /// Running/Idle -> Stopped and cancel the tick.
    pub fn dispose(&self, now_msec: u64) -> Result<crate::engine::PersistedState, String> {
        let persisted = self.account.to_persisted(now_msec)?;
        self.account.force_stop(now_msec)?;
        self.ticker.cancel();
        Ok(persisted)
    }

    pub(crate) fn redraw(&self) {
        (self.on_redraw)();
    }
}
