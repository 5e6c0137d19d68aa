//! Core validation errors.
//!
//! These are refusal states for a mutation: the board is left untouched and
//! the caller gets one of these back to show feedback.

use thiserror::Error;

use crate::error::{Effect, Transience};

/// Kinds of entity a lookup can miss.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Project,
    Column,
    Card,
    Label,
    Member,
    RetroBoard,
    RetroItem,
}

crate::enum_str! {
    impl EntityKind {
        variants {
            Project => ["project"],
            Column => ["column"],
            Card => ["card"],
            Label => ["label"],
            Member => ["member"],
            RetroBoard => ["retro_board"],
            RetroItem => ["retro_item"],
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind} `{id}` not found")]
pub struct NotFound {
    pub kind: EntityKind,
    pub id: String,
}

impl NotFound {
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind} `{id}` already exists")]
pub struct Duplicate {
    pub kind: EntityKind,
    pub id: String,
}

/// Rejected dependency or parent edge.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid dependency: {reason}")]
pub struct InvalidDependency {
    pub reason: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid {field}: {reason}")]
pub struct InvalidInput {
    pub field: &'static str,
    pub reason: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CoreError {
    #[error(transparent)]
    NotFound(#[from] NotFound),
    #[error(transparent)]
    Duplicate(#[from] Duplicate),
    #[error(transparent)]
    InvalidDependency(#[from] InvalidDependency),
    #[error(transparent)]
    InvalidInput(#[from] InvalidInput),
}

impl CoreError {
    pub fn transience(&self) -> Transience {
        Transience::Permanent
    }

    pub fn effect(&self) -> Effect {
        Effect::None
    }

    pub fn code(&self) -> &'static str {
        match self {
            CoreError::NotFound(_) => "not_found",
            CoreError::Duplicate(_) => "duplicate",
            CoreError::InvalidDependency(_) => "invalid_dependency",
            CoreError::InvalidInput(_) => "invalid_input",
        }
    }
}

pub(crate) fn not_found(kind: EntityKind, id: impl Into<String>) -> CoreError {
    NotFound::new(kind, id).into()
}

pub(crate) fn duplicate(kind: EntityKind, id: impl Into<String>) -> CoreError {
    Duplicate {
        kind,
        id: id.into(),
    }
    .into()
}

pub(crate) fn invalid_input(field: &'static str, reason: impl Into<String>) -> CoreError {
    InvalidInput {
        field,
        reason: reason.into(),
    }
    .into()
}
