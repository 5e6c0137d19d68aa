//! Seams to the shared remote store.
//!
//! The board document is a single remote record replaced wholesale; presence
//! lives in a separate collection keyed by identity. Listeners run on
//! whatever thread the store notifies from, so they should only forward
//! into a channel.

use std::sync::Arc;

use serde_json::Value;

use super::error::RemoteError;
use super::presence::PresenceRecord;
use crate::identity::ClientContext;

/// One notification of the remote document.
#[derive(Clone, Debug, PartialEq)]
pub struct RemoteSnapshot {
    /// `None` when the remote record does not exist yet.
    pub document: Option<Value>,
    /// True when this notification echoes the receiver's own write.
    pub has_pending_writes: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RemoteEvent {
    Snapshot(RemoteSnapshot),
    Error(RemoteError),
}

pub type Listener<E> = Arc<dyn Fn(E) + Send + Sync>;

/// Cancels a subscription when dropped.
#[must_use = "dropping a subscription cancels it"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription with nothing to cancel.
    pub fn detached() -> Self {
        Self { cancel: None }
    }

    pub fn cancel(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

pub trait RemoteStore: Send + Sync {
    fn get(&self) -> Result<Option<Value>, RemoteError>;

    /// Replaces the whole remote document. `origin` identifies the writing
    /// session (for echo marking) and carries its credential.
    fn replace(&self, origin: &ClientContext, doc: Value) -> Result<(), RemoteError>;

    fn subscribe(
        &self,
        origin: &ClientContext,
        listener: Listener<RemoteEvent>,
    ) -> Result<Subscription, RemoteError>;
}

pub trait PresenceStore: Send + Sync {
    fn upsert(&self, record: PresenceRecord) -> Result<(), RemoteError>;

    fn remove(&self, identity: &str) -> Result<(), RemoteError>;

    /// Listener receives every record in `scope` on each change.
    fn subscribe_scope(
        &self,
        scope: &str,
        listener: Listener<Vec<PresenceRecord>>,
    ) -> Result<Subscription, RemoteError>;
}
