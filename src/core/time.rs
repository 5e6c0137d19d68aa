//! Wall-clock helpers.
//!
//! Timestamps in the board document are milliseconds since the Unix epoch.
//! They are for display and presence freshness only; nothing orders writes
//! by them (the remote store's serialization order decides).

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall time in milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Milliseconds elapsed from `then` to `now`, zero if `then` is in the future.
pub fn age_ms(now: u64, then: u64) -> u64 {
    now.saturating_sub(then)
}
