//! Folding remote snapshots into local state.
//!
//! Last write wins at document granularity. A snapshot that echoes this
//! client's own write is ignored; anything else replaces local state after
//! migration.

use std::sync::Arc;

use crossbeam::channel::Sender;

use super::cache::LocalCache;
use super::remote::{RemoteEvent, RemoteSnapshot};
use crate::core::BoardState;
use crate::migrate::migrate;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SyncStatus {
    /// Local state matches the last adopted or acknowledged remote state.
    #[default]
    Synced,
    /// A local change has not been confirmed by the remote yet.
    LocalAhead,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Echo of our own pending write.
    Discarded,
    /// Remote document replaced local state.
    Adopted,
    /// Remote record does not exist; local state kept.
    Empty,
    /// Subscription reported an error; nothing changed.
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshCause {
    Local,
    Remote,
}

/// Signal to the presentation layer that the board should be re-read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Refresh {
    pub cause: RefreshCause,
}

/// Optional channel the engine and reconciler notify after state changes.
#[derive(Clone, Debug, Default)]
pub struct RefreshSink(Option<Sender<Refresh>>);

impl RefreshSink {
    pub fn new(tx: Sender<Refresh>) -> Self {
        Self(Some(tx))
    }

    pub fn none() -> Self {
        Self(None)
    }

    pub fn emit(&self, cause: RefreshCause) {
        if let Some(tx) = &self.0 {
            // receiver gone means nobody is rendering
            let _ = tx.send(Refresh { cause });
        }
    }
}

pub struct Reconciler {
    cache: Arc<dyn LocalCache>,
    refresh: RefreshSink,
    status: SyncStatus,
    adopted: u64,
    discarded: u64,
}

impl Reconciler {
    pub fn new(cache: Arc<dyn LocalCache>, refresh: RefreshSink) -> Self {
        Self {
            cache,
            refresh,
            status: SyncStatus::Synced,
            adopted: 0,
            discarded: 0,
        }
    }

    pub fn status(&self) -> SyncStatus {
        self.status
    }

    pub fn mark_local(&mut self) {
        self.status = SyncStatus::LocalAhead;
    }

    /// Our write landed and nothing newer is pending.
    pub fn mark_acknowledged(&mut self) {
        self.status = SyncStatus::Synced;
    }

    pub fn counts(&self) -> (u64, u64) {
        (self.adopted, self.discarded)
    }

    pub fn handle_event(&mut self, state: &mut BoardState, event: RemoteEvent) -> ReconcileOutcome {
        match event {
            RemoteEvent::Snapshot(snapshot) => self.handle(state, snapshot),
            RemoteEvent::Error(err) => {
                tracing::warn!(transience = ?err.transience(), "remote subscription error: {err}");
                ReconcileOutcome::Failed
            }
        }
    }

    pub fn handle(&mut self, state: &mut BoardState, snapshot: RemoteSnapshot) -> ReconcileOutcome {
        if snapshot.has_pending_writes {
            self.discarded += 1;
            tracing::trace!("ignoring echo of own write");
            return ReconcileOutcome::Discarded;
        }
        let Some(document) = snapshot.document else {
            tracing::debug!("remote document is empty; keeping local state");
            return ReconcileOutcome::Empty;
        };

        *state = migrate(&document);
        self.adopted += 1;
        self.status = SyncStatus::Synced;
        if let Err(err) = self.cache.write(&document_text(state)) {
            tracing::warn!("cache write after remote change failed: {err}");
        }
        self.refresh.emit(RefreshCause::Remote);
        tracing::info!(projects = state.projects.len(), "adopted remote board state");
        ReconcileOutcome::Adopted
    }
}

/// Compact JSON text of the document as stored in the cache.
pub(crate) fn document_text(state: &BoardState) -> String {
    state.to_document().to_string()
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("status", &self.status)
            .field("adopted", &self.adopted)
            .field("discarded", &self.discarded)
            .finish()
    }
}
