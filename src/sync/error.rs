use std::path::PathBuf;

use thiserror::Error;

use crate::error::{Effect, Transience};

/// Failures talking to the shared document store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum RemoteError {
    #[error("remote store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("remote store rejected credentials")]
    Unauthorized,

    #[error("remote store rejected the write: {reason}")]
    Rejected { reason: String },

    #[error("remote store is closed")]
    Closed,
}

impl RemoteError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        RemoteError::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn transience(&self) -> Transience {
        match self {
            RemoteError::Unavailable { .. } => Transience::Retryable,
            // a refreshed token may succeed
            RemoteError::Unauthorized => Transience::Retryable,
            RemoteError::Rejected { .. } | RemoteError::Closed => Transience::Permanent,
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            RemoteError::Unavailable { .. } => Effect::Unknown,
            RemoteError::Unauthorized | RemoteError::Rejected { .. } | RemoteError::Closed => {
                Effect::None
            }
        }
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CacheError {
    #[error("failed to read cache {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write cache {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CacheError {
    pub fn transience(&self) -> Transience {
        Transience::Unknown
    }

    pub fn effect(&self) -> Effect {
        match self {
            CacheError::Read { .. } => Effect::None,
            CacheError::Write { .. } => Effect::Unknown,
        }
    }
}

/// The engine loop is gone; the request was not applied.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum EngineError {
    #[error("sync engine has shut down")]
    Stopped,

    #[error("sync engine dropped the request")]
    NoResponse,

    #[error("failed to start sync engine thread: {reason}")]
    Spawn { reason: String },
}

impl EngineError {
    pub fn transience(&self) -> Transience {
        Transience::Permanent
    }

    pub fn effect(&self) -> Effect {
        match self {
            EngineError::Stopped | EngineError::Spawn { .. } => Effect::None,
            EngineError::NoResponse => Effect::Unknown,
        }
    }
}
