#![forbid(unsafe_code)]

mod enum_str;

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod identity;
pub mod migrate;
pub mod paths;
pub mod sync;
pub mod telemetry;

pub use error::{Effect, Error, Result, Transience};

// Re-export the types most callers touch at the crate root
pub use crate::core::{
    BoardState, Card, CardId, CardPatch, Column, ColumnId, CoreError, LabelColor, NewCard,
    Priority, Project, ProjectId, ViewMode,
};
pub use crate::identity::{ClientContext, Credential, IdentityEnvelope, SessionId, SsoIdentity};
pub use crate::migrate::{MigrationReport, export, import, migrate};
pub use crate::sync::{
    EngineHandle, EngineOptions, FileCache, MemoryRemote, PresenceStore, RemoteStore, spawn,
};
