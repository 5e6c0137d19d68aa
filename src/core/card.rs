use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::domain::{CardId, CardKind, ColumnId, Priority};

/// A card on a project board.
///
/// `labels` holds label names, not ids: renaming a label rewrites every card
/// that carries it. `depends_on` is the outgoing edge set of the dependency
/// graph and must stay acyclic.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub labels: BTreeSet<String>,
    #[serde(default)]
    pub depends_on: BTreeSet<CardId>,
    #[serde(default)]
    pub assignee: Option<String>,
    pub column: ColumnId,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub created_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<CardKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<CardId>,
    /// Fields written by newer clients that this version does not own.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Card {
    pub fn new(
        id: CardId,
        title: impl Into<String>,
        column: ColumnId,
        order: i64,
        created_at_ms: u64,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: String::new(),
            notes: String::new(),
            priority: Priority::default(),
            labels: BTreeSet::new(),
            depends_on: BTreeSet::new(),
            assignee: None,
            column,
            order,
            created_at_ms,
            kind: None,
            estimate: None,
            parent: None,
            extra: BTreeMap::new(),
        }
    }
}

/// Input for [`Project::add_card`](super::Project::add_card).
#[derive(Clone, Debug, Default)]
pub struct NewCard {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    /// Defaults to the backlog sentinel.
    pub column: Option<ColumnId>,
    pub labels: BTreeSet<String>,
    pub assignee: Option<String>,
    pub kind: Option<CardKind>,
    pub estimate: Option<u32>,
    pub parent: Option<CardId>,
}

impl NewCard {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn in_column(mut self, column: ColumnId) -> Self {
        self.column = Some(column);
        self
    }
}

/// Partial update of a card's free-form fields.
///
/// `None` leaves a field alone. For `assignee`, `Some(None)` clears it.
#[derive(Clone, Debug, Default)]
pub struct CardPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub priority: Option<Priority>,
    pub assignee: Option<Option<String>>,
    pub kind: Option<Option<CardKind>>,
    pub estimate: Option<Option<u32>>,
}

impl CardPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.notes.is_none()
            && self.priority.is_none()
            && self.assignee.is_none()
            && self.kind.is_none()
            && self.estimate.is_none()
    }
}
