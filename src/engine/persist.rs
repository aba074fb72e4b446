use crate::engine::{AccountInner, AccountState, TimeAccount, DEFAULT_IDLE_THRESHOLD_MSEC};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tracing::{info, warn};

/// The one persisted record per tracked context. Running/idle flags and run
/// start are transient and never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersistedState {
    #[serde(default)]
    pub total_time_sec: u64,
    #[serde(default = "default_idle_threshold")]
    pub idle_threshold_msec: u64,
}

fn default_idle_threshold() -> u64 {
    DEFAULT_IDLE_THRESHOLD_MSEC
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            total_time_sec: 0,
            idle_threshold_msec: DEFAULT_IDLE_THRESHOLD_MSEC,
        }
    }
}

impl TimeAccount {
    /// Serialize for the host, folding the whole seconds of any in-flight run
    /// first so a partially elapsed run is never persisted as lost time. The
    /// fold is the carry-forward normalization: the account keeps running (if
    /// it was) and a later `stop` cannot double-count.
    pub fn to_persisted(&self, now_msec: u64) -> Result<PersistedState, String> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|e| format!("Mutex poisoned: {}", e))?;
        inner.carry_forward(now_msec);
        Ok(PersistedState {
            total_time_sec: inner.total_time_sec,
            idle_threshold_msec: inner.idle_threshold_msec,
        })
    }

    /// Restore an account from a persisted record. Always starts Stopped;
    /// a non-positive threshold falls back to the default.
    pub fn from_persisted(data: PersistedState) -> Self {
        let idle_threshold_msec = if data.idle_threshold_msec == 0 {
            warn!(
                "[RECOVERY] Non-positive idle threshold in persisted state, using default ({} msec)",
                DEFAULT_IDLE_THRESHOLD_MSEC
            );
            DEFAULT_IDLE_THRESHOLD_MSEC
        } else {
            data.idle_threshold_msec
        };
        Self {
            inner: Mutex::new(AccountInner {
                total_time_sec: data.total_time_sec,
                idle_threshold_msec,
                state: AccountState::Stopped,
            }),
        }
    }

    /// Restore from a raw JSON payload. Never crashes on restore: malformed
    /// data falls back to a fresh zeroed account with the default threshold.
    pub fn from_persisted_json(raw: &str) -> Self {
        match serde_json::from_str::<PersistedState>(raw) {
            Ok(data) => Self::from_persisted(data),
            Err(e) => {
                warn!(
                    "[RECOVERY] Failed to parse persisted state: {}. Starting with default state.",
                    e
                );
                Self::new()
            }
        }
    }

    /// Fold and serialize to JSON for the host's storage.
    pub fn to_persisted_json(&self, now_msec: u64) -> Result<String, String> {
        let data = self.to_persisted(now_msec)?;
        info!(
            "[TIMER] Persisting state: total={}s, idle_threshold={}ms",
            data.total_time_sec, data.idle_threshold_msec
        );
        serde_json::to_string(&data).map_err(|e| format!("Failed to serialize state: {}", e))
    }
}
