//! Projects and the board operations on them.
//!
//! Every operation validates first and mutates second, so a returned error
//! means the project is exactly as it was.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::card::{Card, CardPatch, NewCard};
use super::deps;
use super::domain::{
    CardId, ColumnId, LabelColor, ProjectId, RetroBoardId, RetroCategory, RetroItemId,
};
use super::error::{CoreError, EntityKind, duplicate, invalid_input, not_found};
use super::retro::{Retro, RetroBoard, RetroItem};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: ColumnId,
    pub name: String,
    /// 0 means unlimited.
    #[serde(default)]
    pub wip_limit: u32,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Column {
    pub fn new(id: ColumnId, name: impl Into<String>, wip_limit: u32) -> Self {
        Self {
            id,
            name: name.into(),
            wip_limit,
            extra: BTreeMap::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    #[serde(default)]
    pub color: LabelColor,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub members: BTreeSet<String>,
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(default)]
    pub retro: Retro,
    #[serde(default)]
    pub created_at_ms: u64,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A column was already at or over its WIP limit when a card moved in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WipExceeded {
    pub column: ColumnId,
    pub limit: u32,
    /// Cards in the column after the move.
    pub count: usize,
}

/// Result of a move. WIP limits are soft: the move happens regardless and
/// the caller decides whether to warn.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MoveOutcome {
    pub wip_exceeded: Option<WipExceeded>,
}

pub const DEFAULT_COLUMNS: [&str; 3] = ["To Do", "In Progress", "Done"];

impl Project {
    pub fn new(id: ProjectId, name: impl Into<String>, created_at_ms: u64) -> Self {
        Self {
            id,
            name: name.into(),
            columns: Vec::new(),
            labels: Vec::new(),
            members: BTreeSet::new(),
            cards: Vec::new(),
            retro: Retro::default(),
            created_at_ms,
            extra: BTreeMap::new(),
        }
    }

    // ---------------------------------------------------------------------
    // Lookups
    // ---------------------------------------------------------------------

    pub fn card(&self, id: &CardId) -> Option<&Card> {
        self.cards.iter().find(|card| &card.id == id)
    }

    pub fn column(&self, id: &ColumnId) -> Option<&Column> {
        self.columns.iter().find(|col| &col.id == id)
    }

    pub fn label(&self, name: &str) -> Option<&Label> {
        self.labels.iter().find(|label| label.name == name)
    }

    fn card_index(&self, id: &CardId) -> Result<usize, CoreError> {
        self.cards
            .iter()
            .position(|card| &card.id == id)
            .ok_or_else(|| not_found(EntityKind::Card, id.as_str()))
    }

    fn column_index(&self, id: &ColumnId) -> Result<usize, CoreError> {
        self.columns
            .iter()
            .position(|col| &col.id == id)
            .ok_or_else(|| not_found(EntityKind::Column, id.as_str()))
    }

    fn ensure_column_ref(&self, id: &ColumnId) -> Result<(), CoreError> {
        if id.is_backlog() {
            return Ok(());
        }
        self.column_index(id).map(|_| ())
    }

    fn ensure_member(&self, name: &str) -> Result<(), CoreError> {
        if self.members.contains(name) {
            Ok(())
        } else {
            Err(not_found(EntityKind::Member, name))
        }
    }

    /// Cards of one column in board order. Equal `order` values keep their
    /// insertion order.
    pub fn cards_in_column(&self, column: &ColumnId) -> Vec<&Card> {
        let mut cards: Vec<&Card> = self.cards.iter().filter(|c| &c.column == column).collect();
        cards.sort_by_key(|card| card.order);
        cards
    }

    fn next_order(&self, column: &ColumnId) -> i64 {
        self.cards
            .iter()
            .filter(|card| &card.column == column)
            .map(|card| card.order + 1)
            .max()
            .unwrap_or(0)
    }

    // ---------------------------------------------------------------------
    // Columns
    // ---------------------------------------------------------------------

    pub fn add_column(&mut self, name: &str, wip_limit: u32) -> Result<ColumnId, CoreError> {
        let name = non_empty("column name", name)?;
        let id = ColumnId::generate();
        self.columns.push(Column::new(id.clone(), name, wip_limit));
        Ok(id)
    }

    pub fn rename_column(&mut self, id: &ColumnId, name: &str) -> Result<(), CoreError> {
        let name = non_empty("column name", name)?;
        let idx = self.column_index(id)?;
        self.columns[idx].name = name;
        Ok(())
    }

    pub fn set_wip_limit(&mut self, id: &ColumnId, wip_limit: u32) -> Result<(), CoreError> {
        let idx = self.column_index(id)?;
        self.columns[idx].wip_limit = wip_limit;
        Ok(())
    }

    pub fn move_column(&mut self, id: &ColumnId, index: usize) -> Result<(), CoreError> {
        let idx = self.column_index(id)?;
        let column = self.columns.remove(idx);
        let index = index.min(self.columns.len());
        self.columns.insert(index, column);
        Ok(())
    }

    /// Removes a column; its cards go to the backlog, after what is there.
    pub fn remove_column(&mut self, id: &ColumnId) -> Result<Column, CoreError> {
        let idx = self.column_index(id)?;
        let backlog = ColumnId::backlog();
        let mut next = self.next_order(&backlog);
        let displaced: Vec<CardId> = self
            .cards_in_column(id)
            .into_iter()
            .map(|card| card.id.clone())
            .collect();
        for card_id in displaced {
            if let Some(card) = self.cards.iter_mut().find(|c| c.id == card_id) {
                card.column = backlog.clone();
                card.order = next;
                next += 1;
            }
        }
        Ok(self.columns.remove(idx))
    }

    // ---------------------------------------------------------------------
    // Cards
    // ---------------------------------------------------------------------

    pub fn add_card(&mut self, new: NewCard, now_ms: u64) -> Result<CardId, CoreError> {
        let title = non_empty("card title", &new.title)?;
        let column = new.column.unwrap_or_else(ColumnId::backlog);
        self.ensure_column_ref(&column)?;
        for label in &new.labels {
            if self.label(label).is_none() {
                return Err(not_found(EntityKind::Label, label.as_str()));
            }
        }
        if let Some(assignee) = &new.assignee {
            self.ensure_member(assignee)?;
        }
        if let Some(parent) = &new.parent {
            self.card_index(parent)?;
        }

        let id = loop {
            let candidate = CardId::generate();
            if self.card(&candidate).is_none() {
                break candidate;
            }
        };
        let order = self.next_order(&column);
        let mut card = Card::new(id.clone(), title, column, order, now_ms);
        card.description = new.description;
        card.priority = new.priority;
        card.labels = new.labels;
        card.assignee = new.assignee;
        card.kind = new.kind;
        card.estimate = new.estimate;
        card.parent = new.parent;
        self.cards.push(card);
        Ok(id)
    }

    pub fn update_card(&mut self, id: &CardId, patch: CardPatch) -> Result<(), CoreError> {
        let idx = self.card_index(id)?;
        let title = match &patch.title {
            Some(title) => Some(non_empty("card title", title)?),
            None => None,
        };
        if let Some(Some(assignee)) = &patch.assignee {
            self.ensure_member(assignee)?;
        }

        let card = &mut self.cards[idx];
        if let Some(title) = title {
            card.title = title;
        }
        if let Some(description) = patch.description {
            card.description = description;
        }
        if let Some(notes) = patch.notes {
            card.notes = notes;
        }
        if let Some(priority) = patch.priority {
            card.priority = priority;
        }
        if let Some(assignee) = patch.assignee {
            card.assignee = assignee;
        }
        if let Some(kind) = patch.kind {
            card.kind = kind;
        }
        if let Some(estimate) = patch.estimate {
            card.estimate = estimate;
        }
        Ok(())
    }

    /// Moves a card to `column` at position `index` (end when `None`).
    ///
    /// Both the source and target columns are renumbered `0..n`.
    pub fn move_card(
        &mut self,
        id: &CardId,
        column: &ColumnId,
        index: Option<usize>,
    ) -> Result<MoveOutcome, CoreError> {
        let idx = self.card_index(id)?;
        self.ensure_column_ref(column)?;
        let source = self.cards[idx].column.clone();

        let mut target: Vec<CardId> = self
            .cards_in_column(column)
            .into_iter()
            .filter(|card| &card.id != id)
            .map(|card| card.id.clone())
            .collect();
        let index = index.unwrap_or(target.len()).min(target.len());
        target.insert(index, id.clone());

        self.cards[idx].column = column.clone();
        self.renumber(&target);
        if &source != column {
            let remaining: Vec<CardId> = self
                .cards_in_column(&source)
                .into_iter()
                .map(|card| card.id.clone())
                .collect();
            self.renumber(&remaining);
        }

        let mut outcome = MoveOutcome::default();
        if &source != column
            && let Some(col) = self.column(column)
            && col.wip_limit > 0
            && target.len() > col.wip_limit as usize
        {
            outcome.wip_exceeded = Some(WipExceeded {
                column: column.clone(),
                limit: col.wip_limit,
                count: target.len(),
            });
        }
        Ok(outcome)
    }

    fn renumber(&mut self, ordered: &[CardId]) {
        for (pos, card_id) in ordered.iter().enumerate() {
            if let Some(card) = self.cards.iter_mut().find(|c| &c.id == card_id) {
                card.order = pos as i64;
            }
        }
    }

    /// Deletes a card and scrubs every reference to it.
    ///
    /// Other cards lose it from `depends_on` and drop it as `parent`; they
    /// are never deleted themselves.
    pub fn delete_card(&mut self, id: &CardId) -> Result<Card, CoreError> {
        let idx = self.card_index(id)?;
        let removed = self.cards.remove(idx);
        for card in &mut self.cards {
            card.depends_on.remove(id);
            if card.parent.as_ref() == Some(id) {
                card.parent = None;
            }
        }
        Ok(removed)
    }

    /// Adds `from -> to` to the dependency graph.
    ///
    /// Returns `Ok(false)` when the edge already exists.
    pub fn add_dependency(&mut self, from: &CardId, to: &CardId) -> Result<bool, CoreError> {
        let idx = self.card_index(from)?;
        self.card_index(to)?;
        if self.cards[idx].depends_on.contains(to) {
            return Ok(false);
        }
        deps::check_no_cycle(&self.cards, from, to)?;
        self.cards[idx].depends_on.insert(to.clone());
        Ok(true)
    }

    pub fn remove_dependency(&mut self, from: &CardId, to: &CardId) -> Result<bool, CoreError> {
        let idx = self.card_index(from)?;
        Ok(self.cards[idx].depends_on.remove(to))
    }

    pub fn set_parent(&mut self, child: &CardId, parent: Option<&CardId>) -> Result<(), CoreError> {
        let idx = self.card_index(child)?;
        if let Some(parent) = parent {
            self.card_index(parent)?;
            if deps::would_create_parent_cycle(&self.cards, child, parent) {
                return Err(super::error::InvalidDependency {
                    reason: format!("{parent} is already below {child} in the hierarchy"),
                }
                .into());
            }
        }
        self.cards[idx].parent = parent.cloned();
        Ok(())
    }

    /// Cards with at least one dependency that is not finished yet.
    ///
    /// A card counts as finished when it sits in the last column.
    pub fn blocked_cards(&self) -> Vec<&Card> {
        let done = self.columns.last().map(|col| &col.id);
        self.cards
            .iter()
            .filter(|card| {
                card.depends_on.iter().any(|dep| match self.card(dep) {
                    Some(dep) => Some(&dep.column) != done,
                    None => false,
                })
            })
            .collect()
    }

    pub fn dependency_cycles(&self) -> Vec<Vec<CardId>> {
        deps::dependency_cycles(&self.cards)
    }

    /// Columns currently holding more cards than their WIP limit allows.
    pub fn wip_overflows(&self) -> Vec<WipExceeded> {
        self.columns
            .iter()
            .filter(|col| col.wip_limit > 0)
            .filter_map(|col| {
                let count = self.cards.iter().filter(|c| c.column == col.id).count();
                (count > col.wip_limit as usize).then(|| WipExceeded {
                    column: col.id.clone(),
                    limit: col.wip_limit,
                    count,
                })
            })
            .collect()
    }

    // ---------------------------------------------------------------------
    // Labels
    // ---------------------------------------------------------------------

    pub fn add_label(&mut self, name: &str, color: LabelColor) -> Result<(), CoreError> {
        let name = non_empty("label name", name)?;
        if self.label(&name).is_some() {
            return Err(duplicate(EntityKind::Label, name));
        }
        self.labels.push(Label { name, color });
        Ok(())
    }

    pub fn set_label_color(&mut self, name: &str, color: LabelColor) -> Result<(), CoreError> {
        let label = self
            .labels
            .iter_mut()
            .find(|label| label.name == name)
            .ok_or_else(|| not_found(EntityKind::Label, name))?;
        label.color = color;
        Ok(())
    }

    /// Renames a label and rewrites it on every card that carries it.
    pub fn rename_label(&mut self, old: &str, new: &str) -> Result<usize, CoreError> {
        let new = non_empty("label name", new)?;
        let pos = self
            .labels
            .iter()
            .position(|label| label.name == old)
            .ok_or_else(|| not_found(EntityKind::Label, old))?;
        if new == old {
            return Ok(0);
        }
        if self.label(&new).is_some() {
            return Err(duplicate(EntityKind::Label, new));
        }
        self.labels[pos].name = new.clone();
        let mut touched = 0;
        for card in &mut self.cards {
            if card.labels.remove(old) {
                card.labels.insert(new.clone());
                touched += 1;
            }
        }
        Ok(touched)
    }

    /// Removes a label and strips it from every card.
    pub fn remove_label(&mut self, name: &str) -> Result<Label, CoreError> {
        let pos = self
            .labels
            .iter()
            .position(|label| label.name == name)
            .ok_or_else(|| not_found(EntityKind::Label, name))?;
        for card in &mut self.cards {
            card.labels.remove(name);
        }
        Ok(self.labels.remove(pos))
    }

    /// Adds or removes `label` on a card; returns whether it is now present.
    pub fn toggle_card_label(&mut self, card: &CardId, label: &str) -> Result<bool, CoreError> {
        if self.label(label).is_none() {
            return Err(not_found(EntityKind::Label, label));
        }
        let idx = self.card_index(card)?;
        let labels = &mut self.cards[idx].labels;
        if labels.remove(label) {
            Ok(false)
        } else {
            labels.insert(label.to_string());
            Ok(true)
        }
    }

    // ---------------------------------------------------------------------
    // Members
    // ---------------------------------------------------------------------

    pub fn add_member(&mut self, name: &str) -> Result<(), CoreError> {
        let name = non_empty("member name", name)?;
        if !self.members.insert(name.clone()) {
            return Err(duplicate(EntityKind::Member, name));
        }
        Ok(())
    }

    /// Removes a member and unassigns their cards.
    pub fn remove_member(&mut self, name: &str) -> Result<(), CoreError> {
        if !self.members.remove(name) {
            return Err(not_found(EntityKind::Member, name));
        }
        for card in &mut self.cards {
            if card.assignee.as_deref() == Some(name) {
                card.assignee = None;
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Retro
    // ---------------------------------------------------------------------

    pub fn add_retro_board(&mut self, title: &str, now_ms: u64) -> Result<RetroBoardId, CoreError> {
        self.retro.add_board(title, now_ms)
    }

    pub fn remove_retro_board(&mut self, id: &RetroBoardId) -> Result<RetroBoard, CoreError> {
        self.retro.remove_board(id)
    }

    pub fn add_retro_item(
        &mut self,
        board: &RetroBoardId,
        category: RetroCategory,
        text: &str,
        author: Option<String>,
    ) -> Result<RetroItemId, CoreError> {
        self.retro.add_item(board, category, text, author)
    }

    pub fn vote_retro_item(
        &mut self,
        board: &RetroBoardId,
        item: &RetroItemId,
    ) -> Result<u32, CoreError> {
        self.retro.vote(board, item)
    }

    pub fn remove_retro_item(
        &mut self,
        board: &RetroBoardId,
        item: &RetroItemId,
    ) -> Result<RetroItem, CoreError> {
        self.retro.remove_item(board, item)
    }
}

fn non_empty(field: &'static str, raw: &str) -> Result<String, CoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(invalid_input(field, "must not be empty"));
    }
    Ok(trimmed.to_string())
}
