//! In-process remote store.
//!
//! Backs tests and single-machine sessions. Notifications are delivered
//! synchronously on the writer's thread, after the internal lock is
//! released.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use serde_json::Value;

use super::error::RemoteError;
use super::presence::PresenceRecord;
use super::remote::{
    Listener, PresenceStore, RemoteEvent, RemoteSnapshot, RemoteStore, Subscription,
};
use crate::identity::{ClientContext, SessionId};

#[derive(Clone, Default)]
pub struct MemoryRemote {
    inner: Arc<Mutex<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    document: Option<Value>,
    required_token: Option<String>,
    offline: bool,
    closed: bool,
    writes: u64,
    next_id: u64,
    doc_listeners: BTreeMap<u64, (SessionId, Listener<RemoteEvent>)>,
    presence: BTreeMap<String, PresenceRecord>,
    presence_listeners: BTreeMap<u64, (String, Listener<Vec<PresenceRecord>>)>,
}

impl MemoryState {
    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    fn check_open(&self) -> Result<(), RemoteError> {
        if self.closed {
            return Err(RemoteError::Closed);
        }
        if self.offline {
            return Err(RemoteError::unavailable("memory remote is offline"));
        }
        Ok(())
    }

    fn scope_records(&self, scope: &str) -> Vec<PresenceRecord> {
        self.presence
            .values()
            .filter(|record| record.scope == scope)
            .cloned()
            .collect()
    }

    fn scope_fanout(&self, scope: &str) -> Vec<(Listener<Vec<PresenceRecord>>, Vec<PresenceRecord>)> {
        let records = self.scope_records(scope);
        self.presence_listeners
            .values()
            .filter(|(listener_scope, _)| listener_scope == scope)
            .map(|(_, listener)| (Arc::clone(listener), records.clone()))
            .collect()
    }
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires `token` on every document write.
    pub fn with_token(token: impl Into<String>) -> Self {
        let remote = Self::new();
        remote.lock().required_token = Some(token.into());
        remote
    }

    /// Simulates a network outage: reads and writes fail with `Unavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Shuts the store down; listeners receive `Closed`.
    pub fn close(&self) {
        let listeners: Vec<_> = {
            let mut state = self.lock();
            state.closed = true;
            state
                .doc_listeners
                .values()
                .map(|(_, listener)| Arc::clone(listener))
                .collect()
        };
        for listener in listeners {
            listener(RemoteEvent::Error(RemoteError::Closed));
        }
    }

    /// Successful document writes so far.
    pub fn write_count(&self) -> u64 {
        self.lock().writes
    }

    pub fn document(&self) -> Option<Value> {
        self.lock().document.clone()
    }

    pub fn presence_records(&self) -> Vec<PresenceRecord> {
        self.lock().presence.values().cloned().collect()
    }

    pub fn listener_count(&self) -> usize {
        let state = self.lock();
        state.doc_listeners.len() + state.presence_listeners.len()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        lock_state(&self.inner)
    }

    fn weak(&self) -> Weak<Mutex<MemoryState>> {
        Arc::downgrade(&self.inner)
    }
}

fn lock_state(inner: &Mutex<MemoryState>) -> MutexGuard<'_, MemoryState> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl RemoteStore for MemoryRemote {
    fn get(&self) -> Result<Option<Value>, RemoteError> {
        let state = self.lock();
        state.check_open()?;
        Ok(state.document.clone())
    }

    fn replace(&self, origin: &ClientContext, doc: Value) -> Result<(), RemoteError> {
        let fanout: Vec<_> = {
            let mut state = self.lock();
            state.check_open()?;
            if let Some(required) = &state.required_token {
                let presented = origin.credential.as_ref().map(|c| c.token());
                if presented != Some(required.as_str()) {
                    return Err(RemoteError::Unauthorized);
                }
            }
            state.document = Some(doc.clone());
            state.writes += 1;
            state
                .doc_listeners
                .values()
                .map(|(session, listener)| (*session == origin.session, Arc::clone(listener)))
                .collect()
        };
        for (is_writer, listener) in fanout {
            listener(RemoteEvent::Snapshot(RemoteSnapshot {
                document: Some(doc.clone()),
                has_pending_writes: is_writer,
            }));
        }
        Ok(())
    }

    /// Delivers the current document right away, then every change.
    fn subscribe(
        &self,
        origin: &ClientContext,
        listener: Listener<RemoteEvent>,
    ) -> Result<Subscription, RemoteError> {
        let (id, current) = {
            let mut state = self.lock();
            if state.closed {
                return Err(RemoteError::Closed);
            }
            let id = state.next_id();
            state
                .doc_listeners
                .insert(id, (origin.session, Arc::clone(&listener)));
            (id, state.document.clone())
        };
        listener(RemoteEvent::Snapshot(RemoteSnapshot {
            document: current,
            has_pending_writes: false,
        }));

        let weak = self.weak();
        Ok(Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                lock_state(&inner).doc_listeners.remove(&id);
            }
        }))
    }
}

impl PresenceStore for MemoryRemote {
    fn upsert(&self, record: PresenceRecord) -> Result<(), RemoteError> {
        let fanout = {
            let mut state = self.lock();
            state.check_open()?;
            let scope = record.scope.clone();
            state.presence.insert(record.identity.clone(), record);
            state.scope_fanout(&scope)
        };
        for (listener, records) in fanout {
            listener(records);
        }
        Ok(())
    }

    fn remove(&self, identity: &str) -> Result<(), RemoteError> {
        let fanout = {
            let mut state = self.lock();
            state.check_open()?;
            match state.presence.remove(identity) {
                Some(record) => state.scope_fanout(&record.scope),
                None => Vec::new(),
            }
        };
        for (listener, records) in fanout {
            listener(records);
        }
        Ok(())
    }

    fn subscribe_scope(
        &self,
        scope: &str,
        listener: Listener<Vec<PresenceRecord>>,
    ) -> Result<Subscription, RemoteError> {
        let (id, current) = {
            let mut state = self.lock();
            if state.closed {
                return Err(RemoteError::Closed);
            }
            let id = state.next_id();
            state
                .presence_listeners
                .insert(id, (scope.to_string(), Arc::clone(&listener)));
            (id, state.scope_records(scope))
        };
        listener(current);

        let weak = self.weak();
        Ok(Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                lock_state(&inner).presence_listeners.remove(&id);
            }
        }))
    }
}

impl std::fmt::Debug for MemoryRemote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("MemoryRemote")
            .field("has_document", &state.document.is_some())
            .field("writes", &state.writes)
            .field("listeners", &state.doc_listeners.len())
            .field("presence", &state.presence.len())
            .finish()
    }
}
