use crate::engine::{AccountInner, AccountState, DisplayState, Snapshot, TimeAccount};
use std::sync::MutexGuard;
use tracing::warn;

/// Whole seconds elapsed since `started_at_msec`, clamped at zero if the host
/// clock moved backward. The sub-second remainder stays implicit in
/// `started_at_msec` until the next fold.
fn running_for_sec(started_at_msec: u64, now_msec: u64) -> u64 {
    if now_msec < started_at_msec {
        warn!(
            "[TIMER] Clock skew detected: now ({}) < started_at ({}), clamping elapsed to 0",
            now_msec, started_at_msec
        );
        return 0;
    }
    (now_msec - started_at_msec) / 1000
}

impl TimeAccount {
    fn lock(&self) -> Result<MutexGuard<'_, AccountInner>, String> {
        self.inner.lock().map_err(|e| format!("Mutex poisoned: {}", e))
    }

    /// Transition: Stopped/Idle -> Running.
    /// No-op if already running. The caller is expected to begin the 1-second
    /// tick after a successful start (see `ticker`).
    pub fn start(&self, now_msec: u64) -> Result<(), String> {
        let mut inner = self.lock()?;
        match inner.state {
            AccountState::Stopped | AccountState::Idle => {
                inner.state = AccountState::Running {
                    started_at_msec: now_msec,
                };
                Ok(())
            }
            AccountState::Running { .. } => {
                warn!("[FSM] Invalid transition: Running -> Running (already running)");
                Ok(())
            }
        }
    }

    /// Transition: Running -> Stopped, folding the whole seconds of the
    /// current run into the total. No-op if not running. The caller cancels
    /// the periodic tick.
    pub fn stop(&self, now_msec: u64) -> Result<(), String> {
        let mut inner = self.lock()?;
        match inner.state {
            AccountState::Running { started_at_msec } => {
                let session_sec = running_for_sec(started_at_msec, now_msec);
                inner.total_time_sec = saturating_fold(inner.total_time_sec, session_sec);
                inner.state = AccountState::Stopped;
                Ok(())
            }
            AccountState::Stopped | AccountState::Idle => {
                warn!("[FSM] Invalid transition: stop() while not running (no-op)");
                Ok(())
            }
        }
    }

    /// Transition: Running -> Idle. Equivalent to `stop` plus the idle flag;
    /// only the inactivity check calls this. No-op if not running.
    pub fn mark_idle(&self, now_msec: u64) -> Result<(), String> {
        let mut inner = self.lock()?;
        match inner.state {
            AccountState::Running { started_at_msec } => {
                let session_sec = running_for_sec(started_at_msec, now_msec);
                inner.total_time_sec = saturating_fold(inner.total_time_sec, session_sec);
                inner.state = AccountState::Idle;
                Ok(())
            }
            AccountState::Stopped | AccountState::Idle => {
                warn!("[FSM] Invalid transition: mark_idle() while not running (no-op)");
                Ok(())
            }
        }
    }

    /// Toggle as a single transition: Running -> Stopped (folding), otherwise
    /// Stopped/Idle -> Running. One lock acquisition, so a concurrent tick
    /// cannot slip between the state check and the transition and swallow the
    /// user's click. Returns whether the account is running afterwards.
    pub fn toggle(&self, now_msec: u64) -> Result<bool, String> {
        let mut inner = self.lock()?;
        match inner.state {
            AccountState::Running { started_at_msec } => {
                let session_sec = running_for_sec(started_at_msec, now_msec);
                inner.total_time_sec = saturating_fold(inner.total_time_sec, session_sec);
                inner.state = AccountState::Stopped;
                Ok(false)
            }
            AccountState::Stopped | AccountState::Idle => {
                inner.state = AccountState::Running {
                    started_at_msec: now_msec,
                };
                Ok(true)
            }
        }
    }

    /// Host teardown: fold any in-flight run and land in Stopped from any
    /// state, including Idle (where `stop` is a no-op).
    pub(crate) fn force_stop(&self, now_msec: u64) -> Result<(), String> {
        let mut inner = self.lock()?;
        if let AccountState::Running { started_at_msec } = inner.state {
            let session_sec = running_for_sec(started_at_msec, now_msec);
            inner.total_time_sec = saturating_fold(inner.total_time_sec, session_sec);
        }
        inner.state = AccountState::Stopped;
        Ok(())
    }

    /// Transition: Idle -> Running, triggered by renewed user input.
    /// No-op in any other state.
    pub fn resume_from_activity(&self, now_msec: u64) -> Result<(), String> {
        let mut inner = self.lock()?;
        match inner.state {
            AccountState::Idle => {
                inner.state = AccountState::Running {
                    started_at_msec: now_msec,
                };
                Ok(())
            }
            AccountState::Stopped | AccountState::Running { .. } => {
                warn!("[FSM] Invalid transition: resume_from_activity() while not idle (no-op)");
                Ok(())
            }
        }
    }

    /// Current displayed total and state, for rendering.
    ///
    /// Performs the carry-forward normalization: completed whole seconds of an
    /// in-flight run are folded into the total and `started_at_msec` advances
    /// by the same amount, so fractional-second drift never accumulates. The
    /// displayed total is identical before and after the fold.
    pub fn snapshot(&self, now_msec: u64) -> Result<Snapshot, String> {
        let mut inner = self.lock()?;
        inner.carry_forward(now_msec);
        let state = match inner.state {
            AccountState::Stopped => DisplayState::Stopped,
            AccountState::Running { .. } => DisplayState::Running,
            AccountState::Idle => DisplayState::Idle,
        };
        Ok(Snapshot {
            state,
            total_time_sec: inner.total_time_sec,
        })
    }

    pub fn state(&self) -> Result<AccountState, String> {
        Ok(self.lock()?.state)
    }

    pub fn is_running(&self) -> Result<bool, String> {
        Ok(matches!(self.lock()?.state, AccountState::Running { .. }))
    }

    pub fn is_idle(&self) -> Result<bool, String> {
        Ok(matches!(self.lock()?.state, AccountState::Idle))
    }

    pub fn idle_threshold_msec(&self) -> Result<u64, String> {
        Ok(self.lock()?.idle_threshold_msec)
    }

    /// Reconfigure the idle threshold; values below 1 msec are clamped to 1.
    pub fn set_idle_threshold_msec(&self, msec: u64) -> Result<(), String> {
        let mut inner = self.lock()?;
        inner.idle_threshold_msec = msec.max(1);
        Ok(())
    }

    /// Zero the account and return to Stopped, discarding any in-flight run.
    /// The one operation allowed to decrease the displayed total.
    pub fn reset(&self) -> Result<(), String> {
        let mut inner = self.lock()?;
        inner.total_time_sec = 0;
        inner.state = AccountState::Stopped;
        Ok(())
    }
}

impl AccountInner {
    /// Fold completed whole seconds of an in-flight run into the total and
    /// advance the run start by the same amount. Transition-transparent.
    pub(crate) fn carry_forward(&mut self, now_msec: u64) {
        if let AccountState::Running { started_at_msec } = self.state {
            let session_sec = running_for_sec(started_at_msec, now_msec);
            if session_sec > 0 {
                self.total_time_sec = saturating_fold(self.total_time_sec, session_sec);
                self.state = AccountState::Running {
                    started_at_msec: started_at_msec + session_sec * 1000,
                };
            }
        }
    }
}

fn saturating_fold(total_sec: u64, session_sec: u64) -> u64 {
    match total_sec.checked_add(session_sec) {
        Some(new) => new,
        None => {
            warn!(
                "[TIMER] Accumulated seconds overflow prevented: {} + {} (saturated at u64::MAX)",
                total_sec, session_sec
            );
            u64::MAX
        }
    }
}
