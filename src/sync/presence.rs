//! Who else is looking at the same board.
//!
//! Each client keeps one record in the presence collection, refreshed by a
//! heartbeat. Readers treat a record as present while it is younger than the
//! freshness window; departed clients that never deleted their record fade
//! out on their own.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use super::remote::{Listener, PresenceStore, Subscription};
use crate::core::time::age_ms;
use crate::identity::ClientContext;

pub const DEFAULT_HEARTBEAT_MS: u64 = 20_000;
pub const DEFAULT_FRESHNESS_MS: u64 = 60_000;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceRecord {
    pub identity: String,
    pub scope: String,
    pub last_seen_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl PresenceRecord {
    pub fn new(identity: impl Into<String>, scope: impl Into<String>, last_seen_ms: u64) -> Self {
        Self {
            identity: identity.into(),
            scope: scope.into(),
            last_seen_ms,
            display_name: None,
            avatar_url: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PresenceSettings {
    pub heartbeat: Duration,
    pub freshness_ms: u64,
}

impl Default for PresenceSettings {
    fn default() -> Self {
        Self {
            heartbeat: Duration::from_millis(DEFAULT_HEARTBEAT_MS),
            freshness_ms: DEFAULT_FRESHNESS_MS,
        }
    }
}

/// A record seen `window` ms ago or more recently counts as present.
pub fn is_fresh(record: &PresenceRecord, now_ms: u64, window_ms: u64) -> bool {
    age_ms(now_ms, record.last_seen_ms) <= window_ms
}

/// Scoped presence session. Dropping it removes the own record and cancels
/// the scope subscription.
pub struct PresenceTracker {
    store: Arc<dyn PresenceStore>,
    record: PresenceRecord,
    settings: PresenceSettings,
    subscription: Option<Subscription>,
    next_beat: Instant,
    peers: Vec<PresenceRecord>,
    left: bool,
}

impl PresenceTracker {
    /// Publishes the own record and subscribes to `scope`. Updates from the
    /// subscription are handed to `on_change`; feed them back via
    /// [`apply`](Self::apply) on the owning thread.
    pub fn join(
        store: Arc<dyn PresenceStore>,
        client: &ClientContext,
        scope: &str,
        settings: PresenceSettings,
        now: Instant,
        now_ms: u64,
        on_change: Listener<Vec<PresenceRecord>>,
    ) -> Self {
        let record = PresenceRecord {
            identity: client.identity.clone(),
            scope: scope.to_string(),
            last_seen_ms: now_ms,
            display_name: client.display_name.clone(),
            avatar_url: client.avatar_url.clone(),
        };
        if let Err(err) = store.upsert(record.clone()) {
            tracing::warn!(identity = %record.identity, "presence join failed: {err}");
        }
        let subscription = match store.subscribe_scope(scope, on_change) {
            Ok(sub) => Some(sub),
            Err(err) => {
                tracing::warn!(scope, "presence subscription failed: {err}");
                None
            }
        };
        tracing::debug!(identity = %record.identity, scope, "joined presence");
        Self {
            store,
            record,
            settings,
            subscription,
            next_beat: now + settings.heartbeat,
            peers: Vec::new(),
            left: false,
        }
    }

    pub fn identity(&self) -> &str {
        &self.record.identity
    }

    pub fn next_heartbeat(&self) -> Option<Instant> {
        (!self.left).then_some(self.next_beat)
    }

    pub fn heartbeat_due(&self, now: Instant) -> bool {
        !self.left && now >= self.next_beat
    }

    /// Refreshes the own record. Failures are logged; the next beat still
    /// happens on schedule.
    pub fn beat(&mut self, now: Instant, now_ms: u64) {
        if self.left {
            return;
        }
        self.record.last_seen_ms = now_ms;
        self.next_beat = now + self.settings.heartbeat;
        if let Err(err) = self.store.upsert(self.record.clone()) {
            tracing::warn!(identity = %self.record.identity, "presence heartbeat failed: {err}");
        }
    }

    pub fn apply(&mut self, records: Vec<PresenceRecord>) {
        self.peers = records
            .into_iter()
            .filter(|record| record.scope == self.record.scope)
            .collect();
    }

    /// Fresh records in scope, sorted by identity.
    pub fn visible(&self, now_ms: u64) -> Vec<PresenceRecord> {
        let mut out: Vec<PresenceRecord> = self
            .peers
            .iter()
            .filter(|record| is_fresh(record, now_ms, self.settings.freshness_ms))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.identity.cmp(&b.identity));
        out
    }

    /// Deletes the own record and stops listening. Idempotent.
    pub fn leave(&mut self) {
        if self.left {
            return;
        }
        self.left = true;
        if let Some(sub) = self.subscription.take() {
            sub.cancel();
        }
        if let Err(err) = self.store.remove(&self.record.identity) {
            tracing::warn!(identity = %self.record.identity, "presence leave failed: {err}");
        }
        tracing::debug!(identity = %self.record.identity, "left presence");
    }
}

impl Drop for PresenceTracker {
    fn drop(&mut self) {
        self.leave();
    }
}

impl std::fmt::Debug for PresenceTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresenceTracker")
            .field("record", &self.record)
            .field("peers", &self.peers.len())
            .field("left", &self.left)
            .finish()
    }
}
