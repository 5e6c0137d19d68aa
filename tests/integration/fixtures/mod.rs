//! Shared rigs: engines wired to one in-process remote, pumped by hand.

use std::sync::Arc;
use std::time::{Duration, Instant};

use boardsync::sync::{
    Engine, EngineEvent, EngineOptions, LocalCache, MemoryCache, PresenceSettings,
};
use boardsync::{ClientContext, MemoryRemote};
use crossbeam::channel::{Receiver, Sender, unbounded};

pub const DEBOUNCE: Duration = Duration::from_millis(500);

pub fn options(identity: &str, remote: &MemoryRemote) -> EngineOptions {
    options_with_cache(identity, remote, Arc::new(MemoryCache::new()))
}

pub fn options_with_cache(
    identity: &str,
    remote: &MemoryRemote,
    cache: Arc<dyn LocalCache>,
) -> EngineOptions {
    EngineOptions::new(
        ClientContext::named(identity),
        cache,
        Arc::new(remote.clone()),
    )
    .with_debounce(DEBOUNCE)
}

pub fn with_presence(options: EngineOptions, remote: &MemoryRemote) -> EngineOptions {
    options.with_presence(
        Arc::new(remote.clone()),
        "board",
        PresenceSettings::default(),
    )
}

/// One client: an engine plus the inbox its listeners feed.
pub struct Peer {
    pub engine: Engine,
    inbox: Receiver<EngineEvent>,
    _tx: Sender<EngineEvent>,
}

impl Peer {
    pub fn connect(options: EngineOptions) -> Self {
        let (tx, inbox) = unbounded();
        let mut engine = Engine::start(options);
        engine.connect(&tx);
        let mut peer = Self {
            engine,
            inbox,
            _tx: tx,
        };
        peer.pump();
        peer
    }

    pub fn pump(&mut self) -> usize {
        self.engine.pump(&self.inbox)
    }

    /// Fires every due timer as if the debounce window had passed.
    pub fn flush(&mut self) {
        self.engine.fire_due(Instant::now() + DEBOUNCE * 2);
        self.pump();
    }

    pub fn project_names(&self) -> Vec<String> {
        self.engine
            .state()
            .projects
            .iter()
            .map(|project| project.name.clone())
            .collect()
    }
}
