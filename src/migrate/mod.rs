//! Schema migration for stored and remote board documents.
//!
//! Every document that enters the process (local cache, remote snapshot,
//! import blob) goes through [`migrate`]. It never fails: malformed input
//! degrades to defaults and dangling references are repaired. Running it on
//! its own output is a no-op.

mod read;
pub mod transfer;

use std::collections::HashSet;

use serde_json::Value;

use crate::core::{
    BoardState, Card, CardId, Column, ColumnId, Label, LabelColor, Project, ProjectId,
    would_create_cycle, would_create_parent_cycle,
};

pub use transfer::{EXPORT_FORMAT, ExportEnvelope, TransferError, export, import};

/// What the migrator had to change to make a document valid.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub warnings: Vec<String>,
}

impl MigrationReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    fn warn(&mut self, message: String) {
        self.warnings.push(message);
    }
}

pub fn migrate(raw: &Value) -> BoardState {
    migrate_with_report(raw).0
}

/// Parses and migrates a serialized document. Text that is not JSON yields
/// the empty state.
pub fn migrate_str(raw: &str) -> BoardState {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => migrate(&value),
        Err(err) => {
            tracing::warn!("stored board document is not JSON, starting empty: {err}");
            BoardState::default()
        }
    }
}

pub fn migrate_with_report(raw: &Value) -> (BoardState, MigrationReport) {
    let mut report = MigrationReport::default();
    let Some(obj) = raw.as_object() else {
        if !raw.is_null() {
            report.warn("document root is not an object; using an empty board".into());
        }
        return (BoardState::default(), report);
    };

    let mut state = read::read_state(obj);
    for project in &mut state.projects {
        repair_project(project, &mut report);
    }

    if let Some(active) = &state.active_project
        && state.project(active).is_none()
    {
        report.warn(format!("active project {active} does not exist; cleared"));
        state.active_project = None;
    }

    if !report.is_clean() {
        tracing::debug!(repairs = report.warnings.len(), "board document repaired");
    }
    (state, report)
}

fn repair_project(project: &mut Project, report: &mut MigrationReport) {
    let pid = project.id.clone();

    for card in &mut project.cards {
        if let Some(column) = resolve_column(&project.columns, &card.column) {
            card.column = column;
        } else {
            report.warn(format!(
                "{pid}: card {} refers to unknown column {}; moved to backlog",
                card.id, card.column
            ));
            card.column = ColumnId::backlog();
        }
    }

    for card in &project.cards {
        for name in &card.labels {
            if !project.labels.iter().any(|label| &label.name == name) {
                report.warn(format!("{pid}: label {name:?} was not defined; registered"));
                project.labels.push(Label {
                    name: name.clone(),
                    color: LabelColor::default(),
                });
            }
        }
        if let Some(assignee) = &card.assignee
            && project.members.insert(assignee.clone())
        {
            report.warn(format!("{pid}: assignee {assignee:?} added to members"));
        }
    }

    repair_dependencies(&pid, &mut project.cards, report);
    repair_parents(&pid, &mut project.cards, report);
}

/// Column by id, then by case-insensitive name. `None` when neither matches.
fn resolve_column(columns: &[Column], raw: &ColumnId) -> Option<ColumnId> {
    if raw.is_backlog() || columns.iter().any(|col| &col.id == raw) {
        return Some(raw.clone());
    }
    columns
        .iter()
        .find(|col| col.name.eq_ignore_ascii_case(raw.as_str()))
        .map(|col| col.id.clone())
}

/// Re-adds every dependency edge in document order, skipping edges that are
/// dangling, self-referencing or would close a cycle. On an already acyclic
/// graph nothing is dropped, so the pass is idempotent.
fn repair_dependencies(pid: &ProjectId, cards: &mut [Card], report: &mut MigrationReport) {
    let known: HashSet<CardId> = cards.iter().map(|card| card.id.clone()).collect();
    let wanted: Vec<Vec<CardId>> = cards
        .iter_mut()
        .map(|card| std::mem::take(&mut card.depends_on).into_iter().collect())
        .collect();

    for (pos, targets) in wanted.into_iter().enumerate() {
        for target in targets {
            let from = cards[pos].id.clone();
            if !known.contains(&target) {
                report.warn(format!("{pid}: dependency {from} -> {target} is dangling; dropped"));
                continue;
            }
            if would_create_cycle(cards, &from, &target) {
                report.warn(format!("{pid}: dependency {from} -> {target} closes a cycle; dropped"));
                continue;
            }
            cards[pos].depends_on.insert(target);
        }
    }
}

fn repair_parents(pid: &ProjectId, cards: &mut [Card], report: &mut MigrationReport) {
    let known: HashSet<CardId> = cards.iter().map(|card| card.id.clone()).collect();
    let wanted: Vec<Option<CardId>> = cards.iter_mut().map(|card| card.parent.take()).collect();

    for (pos, parent) in wanted.into_iter().enumerate() {
        let Some(parent) = parent else { continue };
        let child = cards[pos].id.clone();
        if !known.contains(&parent) {
            report.warn(format!("{pid}: parent {parent} of {child} does not exist; cleared"));
            continue;
        }
        if would_create_parent_cycle(cards, &child, &parent) {
            report.warn(format!("{pid}: parent {parent} of {child} closes a loop; cleared"));
            continue;
        }
        cards[pos].parent = Some(parent);
    }
}
