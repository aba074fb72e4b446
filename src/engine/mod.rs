use serde::{Deserialize, Serialize};
use std::sync::Mutex;

mod core;
mod persist;

pub use persist::PersistedState;

/// Inactivity duration after which a running account auto-pauses, used for a
/// fresh account and whenever persisted data is missing or malformed.
pub const DEFAULT_IDLE_THRESHOLD_MSEC: u64 = 2 * 60 * 1000;

/// Time account - strict FSM.
/// All operations are atomic through one Mutex; every entry point (toggle,
/// input events, the periodic tick) funnels through it.
pub struct TimeAccount {
    pub(crate) inner: Mutex<AccountInner>,
}

#[derive(Debug)]
pub(crate) struct AccountInner {
    /// Seconds accumulated while not currently running.
    pub(crate) total_time_sec: u64,
    pub(crate) idle_threshold_msec: u64,
    /// FSM state - single source of truth. `started_at_msec` only exists
    /// inside `Running`, so a stopped account cannot carry a stale start.
    pub(crate) state: AccountState,
}

/// Account state - impossible combinations (running and idle at once) are
/// unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountState {
    /// Not counting; initial state.
    Stopped,
    /// Counting since `started_at_msec` (host wall clock, milliseconds).
    Running { started_at_msec: u64 },
    /// Auto-paused by inactivity; elapsed time already folded.
    Idle,
}

/// Read-only view returned by `snapshot` - what the host renders.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Snapshot {
    #[serde(flatten)]
    pub state: DisplayState,
    /// Displayed total: accumulated seconds plus the whole seconds of the
    /// in-flight run, already folded by the carry-forward.
    pub total_time_sec: u64,
}

/// Simplified state for the host API (no start timestamp bookkeeping).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(tag = "state")]
pub enum DisplayState {
    Stopped,
    Running,
    Idle,
}

impl TimeAccount {
    /// Create an empty account with the default idle threshold.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(AccountInner {
                total_time_sec: 0,
                idle_threshold_msec: DEFAULT_IDLE_THRESHOLD_MSEC,
                state: AccountState::Stopped,
            }),
        }
    }
}

impl Default for TimeAccount {
    fn default() -> Self {
        Self::new()
    }
}
