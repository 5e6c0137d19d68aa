//! Local-first synchronization of the board document.
//!
//! Layout:
//! - cache: durable local copy (offline fallback)
//! - scheduler / writer: debounced full-document writes
//! - reconcile: adopting or discarding remote snapshots
//! - presence: heartbeat records of who is viewing a scope
//! - remote / memory: store seams and the in-process implementation
//! - engine: single-threaded owner of state tying it all together

pub mod cache;
pub mod engine;
pub mod error;
pub mod memory;
pub mod presence;
pub mod reconcile;
pub mod remote;
pub mod scheduler;
pub mod writer;

pub use cache::{FileCache, LocalCache, MemoryCache};
pub use engine::{
    Engine, EngineEvent, EngineHandle, EngineOptions, EngineStatus, PresenceOptions, run, spawn,
};
pub use error::{CacheError, EngineError, RemoteError};
pub use memory::MemoryRemote;
pub use presence::{
    DEFAULT_FRESHNESS_MS, DEFAULT_HEARTBEAT_MS, PresenceRecord, PresenceSettings, PresenceTracker,
    is_fresh,
};
pub use reconcile::{ReconcileOutcome, Reconciler, Refresh, RefreshCause, RefreshSink, SyncStatus};
pub use remote::{
    Listener, PresenceStore, RemoteEvent, RemoteSnapshot, RemoteStore, Subscription,
};
pub use scheduler::DebounceScheduler;
pub use writer::{DebouncedWriter, WriterStats};
