//! Time-tracking core for a status-bar widget.
//!
//! [`TimeAccount`] is the accounting FSM (Stopped/Running/Idle, accumulated
//! seconds, persistence record); [`ActivityMonitor`] bridges host input
//! events, the user toggle, and the 1-second tick cadence into account
//! transitions. The host delivers events with explicit millisecond
//! timestamps and reads [`Snapshot`]s for rendering; any clock (including a
//! virtual one in tests) satisfies the contract.

mod engine;
mod format;
mod monitor;
mod ticker;

pub use engine::{
    AccountState, DisplayState, PersistedState, Snapshot, TimeAccount,
    DEFAULT_IDLE_THRESHOLD_MSEC,
};
pub use format::format_duration;
pub use monitor::{ActivityMonitor, RedrawFn};
pub use ticker::now_msec;
