//! Board domain: the state document and every mutation on it.
//!
//! Module order follows type dependencies:
//! - time: wall-clock helpers
//! - domain: ids and enums (Priority, LabelColor, ViewMode, ...)
//! - error: validation errors
//! - card, retro, project: entities and their operations
//! - deps: dependency graph validator
//! - state: BoardState (the document root)

pub mod card;
pub mod deps;
pub mod domain;
pub mod error;
pub mod project;
pub mod retro;
pub mod state;
pub mod time;

pub use card::{Card, CardPatch, NewCard};
pub use deps::{check_no_cycle, dependency_cycles, would_create_cycle, would_create_parent_cycle};
pub use domain::{
    CardId, CardKind, ColumnId, LabelColor, Priority, ProjectId, RetroBoardId, RetroCategory,
    RetroItemId, ViewMode,
};
pub use error::{CoreError, Duplicate, EntityKind, InvalidDependency, InvalidInput, NotFound};
pub use project::{Column, DEFAULT_COLUMNS, Label, MoveOutcome, Project, WipExceeded};
pub use retro::{Retro, RetroBoard, RetroItem};
pub use state::{BoardState, CURRENT_SCHEMA_VERSION};
