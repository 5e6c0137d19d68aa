//! Debounce scheduling for remote writes.
//!
//! Provides:
//! - `DebounceScheduler` - a single pending slot with a quiet-period deadline

use std::time::{Duration, Instant};

const DEFAULT_DEBOUNCE_MS: u64 = 500;
const TEST_FAST_DEBOUNCE_MS: u64 = 50;

pub fn default_delay() -> Duration {
    if env_flag_truthy("BOARDSYNC_TEST_FAST") {
        Duration::from_millis(TEST_FAST_DEBOUNCE_MS)
    } else {
        Duration::from_millis(DEFAULT_DEBOUNCE_MS)
    }
}

fn env_flag_truthy(name: &str) -> bool {
    let Ok(raw) = std::env::var(name) else {
        return false;
    };
    !matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "n" | "off"
    )
}

/// Holds at most one pending payload and the instant it becomes due.
///
/// Every `schedule_at` cancels the pending slot and starts a fresh quiet
/// period carrying the newest payload, so a burst of calls produces one fire
/// `delay` after the last call.
#[derive(Debug)]
pub struct DebounceScheduler<T> {
    pending: Option<(Instant, T)>,
    delay: Duration,
}

impl<T> Default for DebounceScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DebounceScheduler<T> {
    pub fn new() -> Self {
        Self::with_delay(default_delay())
    }

    pub fn with_delay(delay: Duration) -> Self {
        DebounceScheduler {
            pending: None,
            delay,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn schedule(&mut self, payload: T) {
        self.schedule_at(payload, Instant::now());
    }

    /// Replaces any pending payload; the deadline becomes `now + delay`.
    pub fn schedule_at(&mut self, payload: T, now: Instant) {
        let fire_at = now + self.delay;
        if self.pending.is_some() {
            tracing::trace!(delay_ms = self.delay.as_millis() as u64, "debounce rescheduled");
        }
        self.pending = Some((fire_at, payload));
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(fire_at, _)| *fire_at)
    }

    /// Takes the payload if its deadline is at or before `now`.
    pub fn take_due(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((fire_at, _)) if *fire_at <= now => self.pending.take().map(|(_, payload)| payload),
            _ => None,
        }
    }

    /// Takes the payload regardless of its deadline.
    pub fn take_now(&mut self) -> Option<T> {
        self.pending.take().map(|(_, payload)| payload)
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
