//! The single owner of board state.
//!
//! All mutation and reconciliation run on one thread, in arrival order.
//! Remote and presence subscriptions only forward into the engine inbox;
//! the debounce deadline and the heartbeat are timers on the same loop.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam::channel::{Receiver, Sender};

use super::cache::LocalCache;
use super::error::EngineError;
use super::presence::{PresenceRecord, PresenceSettings, PresenceTracker};
use super::reconcile::{
    ReconcileOutcome, Reconciler, Refresh, RefreshCause, RefreshSink, SyncStatus, document_text,
};
use super::remote::{Listener, PresenceStore, RemoteEvent, RemoteStore, Subscription};
use super::scheduler::default_delay;
use super::writer::{DebouncedWriter, WriterStats};
use crate::config::Config;
use crate::core::time::now_ms;
use crate::core::{BoardState, CoreError};
use crate::identity::ClientContext;
use crate::migrate::migrate_str;

pub struct PresenceOptions {
    pub store: Arc<dyn PresenceStore>,
    pub scope: String,
    pub settings: PresenceSettings,
}

pub struct EngineOptions {
    pub client: ClientContext,
    pub cache: Arc<dyn LocalCache>,
    pub remote: Arc<dyn RemoteStore>,
    pub presence: Option<PresenceOptions>,
    pub debounce: Duration,
    pub refresh: RefreshSink,
}

impl EngineOptions {
    pub fn new(
        client: ClientContext,
        cache: Arc<dyn LocalCache>,
        remote: Arc<dyn RemoteStore>,
    ) -> Self {
        Self {
            client,
            cache,
            remote,
            presence: None,
            debounce: default_delay(),
            refresh: RefreshSink::none(),
        }
    }

    /// Debounce, presence windows and presence scope from `config`.
    /// Presence is enabled only when a store is supplied via
    /// [`with_presence`](Self::with_presence).
    pub fn configured(mut self, config: &Config) -> Self {
        self.debounce = Duration::from_millis(config.sync.debounce_ms);
        if let Some(presence) = &mut self.presence {
            presence.settings = config.presence.settings();
            presence.scope = config.presence.scope.clone();
        }
        self
    }

    pub fn with_presence(
        mut self,
        store: Arc<dyn PresenceStore>,
        scope: impl Into<String>,
        settings: PresenceSettings,
    ) -> Self {
        self.presence = Some(PresenceOptions {
            store,
            scope: scope.into(),
            settings,
        });
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_refresh(mut self, tx: Sender<Refresh>) -> Self {
        self.refresh = RefreshSink::new(tx);
        self
    }
}

/// Unit of work delivered to the engine loop.
pub enum EngineEvent {
    Mutate(Box<dyn FnOnce(&mut Engine) + Send>),
    Remote(RemoteEvent),
    Presence(Vec<PresenceRecord>),
    Snapshot(Sender<BoardState>),
    Status(Sender<EngineStatus>),
    Shutdown,
}

impl std::fmt::Debug for EngineEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EngineEvent::Mutate(_) => "Mutate",
            EngineEvent::Remote(_) => "Remote",
            EngineEvent::Presence(_) => "Presence",
            EngineEvent::Snapshot(_) => "Snapshot",
            EngineEvent::Status(_) => "Status",
            EngineEvent::Shutdown => "Shutdown",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineStatus {
    pub sync: SyncStatus,
    pub pending_write: bool,
    pub writer: WriterStats,
    pub peers: Vec<PresenceRecord>,
}

pub struct Engine {
    state: BoardState,
    client: ClientContext,
    cache: Arc<dyn LocalCache>,
    remote: Arc<dyn RemoteStore>,
    writer: DebouncedWriter,
    reconciler: Reconciler,
    refresh: RefreshSink,
    presence_options: Option<PresenceOptions>,
    presence: Option<PresenceTracker>,
    subscription: Option<Subscription>,
    stopped: bool,
}

impl Engine {
    /// Loads the cached document (migrated) or starts empty. Does not touch
    /// the network; see [`connect`](Self::connect).
    pub fn start(options: EngineOptions) -> Self {
        let state = match options.cache.read() {
            Ok(Some(doc)) => migrate_str(&doc),
            Ok(None) => BoardState::default(),
            Err(err) => {
                tracing::warn!("cache read failed, starting empty: {err}");
                BoardState::default()
            }
        };
        tracing::debug!(
            identity = %options.client.identity,
            projects = state.projects.len(),
            "engine started"
        );
        Self {
            state,
            writer: DebouncedWriter::new(
                Arc::clone(&options.remote),
                options.client.clone(),
                options.debounce,
            ),
            reconciler: Reconciler::new(Arc::clone(&options.cache), options.refresh.clone()),
            client: options.client,
            cache: options.cache,
            remote: options.remote,
            refresh: options.refresh,
            presence_options: options.presence,
            presence: None,
            subscription: None,
            stopped: false,
        }
    }

    /// Subscribes to the remote document and joins presence. Notifications
    /// are forwarded into `inbox`.
    pub fn connect(&mut self, inbox: &Sender<EngineEvent>) {
        let tx = inbox.clone();
        let listener: Listener<RemoteEvent> = Arc::new(move |event: RemoteEvent| {
            let _ = tx.send(EngineEvent::Remote(event));
        });
        match self.remote.subscribe(&self.client, listener) {
            Ok(sub) => self.subscription = Some(sub),
            Err(err) => tracing::warn!("remote subscription failed, working offline: {err}"),
        }

        if let Some(options) = &self.presence_options {
            let tx = inbox.clone();
            let on_change: Listener<Vec<PresenceRecord>> =
                Arc::new(move |records: Vec<PresenceRecord>| {
                    let _ = tx.send(EngineEvent::Presence(records));
                });
            self.presence = Some(PresenceTracker::join(
                Arc::clone(&options.store),
                &self.client,
                &options.scope,
                options.settings,
                Instant::now(),
                now_ms(),
                on_change,
            ));
        }
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    pub fn client(&self) -> &ClientContext {
        &self.client
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            sync: self.reconciler.status(),
            pending_write: self.writer.is_pending(),
            writer: self.writer.stats().clone(),
            peers: self.peers(now_ms()),
        }
    }

    pub fn peers(&self, now_ms: u64) -> Vec<PresenceRecord> {
        self.presence
            .as_ref()
            .map(|tracker| tracker.visible(now_ms))
            .unwrap_or_default()
    }

    pub fn apply<T>(
        &mut self,
        mutation: impl FnOnce(&mut BoardState) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        self.apply_at(mutation, Instant::now())
    }

    /// Runs `mutation` against a copy of the state and commits it only on
    /// success. A commit writes the cache, schedules a remote write and
    /// emits a refresh.
    pub fn apply_at<T>(
        &mut self,
        mutation: impl FnOnce(&mut BoardState) -> Result<T, CoreError>,
        now: Instant,
    ) -> Result<T, CoreError> {
        let mut draft = self.state.clone();
        let value = mutation(&mut draft)?;
        self.state = draft;

        let doc = self.state.to_document();
        if let Err(err) = self.cache.write(&doc.to_string()) {
            tracing::warn!("cache write failed: {err}");
        }
        self.writer.schedule_at(doc, now);
        self.reconciler.mark_local();
        self.refresh.emit(RefreshCause::Local);
        Ok(value)
    }

    /// Folds a remote event into local state. An adopted foreign snapshot
    /// supersedes any write still waiting for its quiet period.
    pub fn handle_remote(&mut self, event: RemoteEvent) -> ReconcileOutcome {
        let outcome = self.reconciler.handle_event(&mut self.state, event);
        if outcome == ReconcileOutcome::Adopted && self.writer.is_pending() {
            tracing::debug!("remote change adopted; dropping pending local write");
            self.writer.cancel();
        }
        outcome
    }

    pub fn handle_presence(&mut self, records: Vec<PresenceRecord>) {
        if let Some(tracker) = &mut self.presence {
            tracker.apply(records);
            self.refresh.emit(RefreshCause::Remote);
        }
    }

    /// Earliest timer: the debounced write or the next heartbeat.
    pub fn next_deadline(&self) -> Option<Instant> {
        let heartbeat = self
            .presence
            .as_ref()
            .and_then(PresenceTracker::next_heartbeat);
        match (self.writer.next_deadline(), heartbeat) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn fire_due(&mut self, now: Instant) {
        if let Some(result) = self.writer.fire_due(now) {
            self.after_write(result.is_ok());
        }
        if let Some(tracker) = &mut self.presence
            && tracker.heartbeat_due(now)
        {
            tracker.beat(now, now_ms());
        }
    }

    /// Dispatches one inbox event. Returns false on shutdown.
    pub fn handle_event(&mut self, event: EngineEvent) -> bool {
        match event {
            EngineEvent::Mutate(job) => job(self),
            EngineEvent::Remote(event) => {
                let _ = self.handle_remote(event);
            }
            EngineEvent::Presence(records) => self.handle_presence(records),
            EngineEvent::Snapshot(respond) => {
                let _ = respond.send(self.state.clone());
            }
            EngineEvent::Status(respond) => {
                let _ = respond.send(self.status());
            }
            EngineEvent::Shutdown => return false,
        }
        true
    }

    /// Handles every event already queued, without blocking.
    pub fn pump(&mut self, inbox: &Receiver<EngineEvent>) -> usize {
        let mut handled = 0;
        while let Ok(event) = inbox.try_recv() {
            handled += 1;
            if !self.handle_event(event) {
                break;
            }
        }
        handled
    }

    /// Flushes the pending write, leaves presence and drops the remote
    /// subscription. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        if let Some(result) = self.writer.flush() {
            self.after_write(result.is_ok());
        }
        if let Some(mut tracker) = self.presence.take() {
            tracker.leave();
        }
        self.subscription = None;
        if let Err(err) = self.cache.write(&document_text(&self.state)) {
            tracing::warn!("final cache write failed: {err}");
        }
    }

    pub fn into_state(mut self) -> BoardState {
        self.shutdown();
        std::mem::take(&mut self.state)
    }

    fn after_write(&mut self, ok: bool) {
        if ok && !self.writer.is_pending() {
            self.reconciler.mark_acknowledged();
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("identity", &self.client.identity)
            .field("projects", &self.state.projects.len())
            .field("writer", &self.writer)
            .field("reconciler", &self.reconciler)
            .finish()
    }
}

/// Run the engine loop until shutdown or until every sender is gone.
///
/// This is the serialization point: mutations, remote snapshots, presence
/// updates and timers are handled one at a time.
pub fn run(mut engine: Engine, inbox: Receiver<EngineEvent>) -> BoardState {
    loop {
        let tick = match engine.next_deadline() {
            Some(deadline) => {
                let wait = deadline.saturating_duration_since(Instant::now());
                crossbeam::channel::after(wait)
            }
            None => crossbeam::channel::never(),
        };

        crossbeam::select! {
            recv(inbox) -> msg => {
                match msg {
                    Ok(event) => {
                        if !engine.handle_event(event) {
                            tracing::debug!("engine shutdown requested");
                            break;
                        }
                    }
                    Err(_) => {
                        tracing::debug!("engine inbox closed");
                        break;
                    }
                }
            }
            recv(tick) -> _ => {
                engine.fire_due(Instant::now());
            }
        }
    }
    engine.into_state()
}

/// Starts an engine on its own thread and connects it.
pub fn spawn(options: EngineOptions) -> Result<(EngineHandle, JoinHandle<BoardState>), EngineError> {
    let (tx, rx) = crossbeam::channel::unbounded();
    let mut engine = Engine::start(options);
    engine.connect(&tx);
    let join = std::thread::Builder::new()
        .name("boardsync-engine".into())
        .spawn(move || run(engine, rx))
        .map_err(|err| EngineError::Spawn {
            reason: err.to_string(),
        })?;
    Ok((EngineHandle::new(tx), join))
}

/// Clonable front door to a running engine.
///
/// The store listeners keep their own inbox senders, so the inbox never
/// closes on its own. Dropping the last handle asks the engine to shut down.
#[derive(Clone, Debug)]
pub struct EngineHandle {
    inner: Arc<HandleInner>,
}

#[derive(Debug)]
struct HandleInner {
    tx: Sender<EngineEvent>,
}

impl Drop for HandleInner {
    fn drop(&mut self) {
        // already stopped is fine
        let _ = self.tx.send(EngineEvent::Shutdown);
    }
}

impl EngineHandle {
    pub fn new(tx: Sender<EngineEvent>) -> Self {
        Self {
            inner: Arc::new(HandleInner { tx }),
        }
    }

    /// Applies `mutation` on the engine thread and waits for the result.
    pub fn mutate<T, F>(&self, mutation: F) -> crate::Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut BoardState) -> Result<T, CoreError> + Send + 'static,
    {
        let (respond, response) = crossbeam::channel::bounded(1);
        let job = move |engine: &mut Engine| {
            let _ = respond.send(engine.apply(mutation));
        };
        self.inner
            .tx
            .send(EngineEvent::Mutate(Box::new(job)))
            .map_err(|_| EngineError::Stopped)?;
        let result = response.recv().map_err(|_| EngineError::NoResponse)?;
        Ok(result?)
    }

    pub fn snapshot(&self) -> Result<BoardState, EngineError> {
        let (respond, response) = crossbeam::channel::bounded(1);
        self.inner
            .tx
            .send(EngineEvent::Snapshot(respond))
            .map_err(|_| EngineError::Stopped)?;
        response.recv().map_err(|_| EngineError::NoResponse)
    }

    pub fn status(&self) -> Result<EngineStatus, EngineError> {
        let (respond, response) = crossbeam::channel::bounded(1);
        self.inner
            .tx
            .send(EngineEvent::Status(respond))
            .map_err(|_| EngineError::Stopped)?;
        response.recv().map_err(|_| EngineError::NoResponse)
    }

    pub fn shutdown(&self) -> Result<(), EngineError> {
        self.inner
            .tx
            .send(EngineEvent::Shutdown)
            .map_err(|_| EngineError::Stopped)
    }
}
