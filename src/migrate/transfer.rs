//! Export / import of a whole board as a portable JSON blob.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::core::BoardState;
use crate::error::{Effect, Transience};

use super::migrate;

pub const EXPORT_FORMAT: &str = "boardsync-export/1";
const EXPORT_FORMAT_PREFIX: &str = "boardsync-export/";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportEnvelope {
    pub format: String,
    pub exported_at_ms: u64,
    pub state: Value,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransferError {
    #[error("import blob is not valid JSON: {0}")]
    NotJson(#[from] serde_json::Error),
}

impl TransferError {
    pub fn transience(&self) -> Transience {
        Transience::Permanent
    }

    pub fn effect(&self) -> Effect {
        Effect::None
    }
}

/// Pretty-printed export envelope around the current document.
pub fn export(state: &BoardState, exported_at_ms: u64) -> String {
    let envelope = ExportEnvelope {
        format: EXPORT_FORMAT.to_string(),
        exported_at_ms,
        state: state.to_document(),
    };
    serde_json::to_string_pretty(&envelope).unwrap_or_else(|err| {
        tracing::error!("export envelope failed to serialize: {err}");
        String::from("{}")
    })
}

/// Accepts an export envelope or a bare state document.
///
/// Only text that is not JSON at all is rejected; anything else goes through
/// the migrator. A blob counts as an envelope when its `format` names an
/// export version and its `state` is an object.
pub fn import(blob: &str) -> Result<BoardState, TransferError> {
    let value: Value = serde_json::from_str(blob)?;
    let format = value.get("format").and_then(Value::as_str);
    let doc = match (format, value.get("state")) {
        (Some(format), Some(state))
            if format.starts_with(EXPORT_FORMAT_PREFIX) && state.is_object() =>
        {
            if format != EXPORT_FORMAT {
                tracing::warn!(format, "importing blob with an unfamiliar export format");
            }
            state
        }
        _ => &value,
    };
    Ok(migrate(doc))
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;
    use serde_json::json;

    use crate::core::{
        CardId, ColumnId, LabelColor, NewCard, RetroCategory, RetroItemId, ViewMode,
    };

    #[test]
    fn envelope_carries_format_and_timestamp() {
        let blob = export(&BoardState::default(), 42);
        let value: Value = serde_json::from_str(&blob).unwrap();
        assert_eq!(value["format"], EXPORT_FORMAT);
        assert_eq!(value["exported_at_ms"], 42);
        assert_eq!(value["state"]["schema_version"], 3);
    }

    #[test]
    fn bare_document_is_accepted() {
        let state = import(r#"{"projects": [], "view": "retro"}"#).unwrap();
        assert_eq!(state.view, ViewMode::Retro);
    }

    #[test]
    fn foreign_format_and_state_keys_stay_in_a_bare_document() {
        let blob = json!({
            "format": "kanban-v2",
            "state": {"projects": []},
            "projects": [{"id": "p1", "name": "Kept"}],
        });
        let state = import(&blob.to_string()).unwrap();
        assert_eq!(state.projects[0].name, "Kept");
        assert_eq!(state.extra["format"], json!("kanban-v2"));
        assert_eq!(state.extra["state"], json!({"projects": []}));

        let not_an_object = json!({
            "format": EXPORT_FORMAT,
            "state": "later",
            "projects": [{"id": "p1", "name": "Also kept"}],
        });
        let state = import(&not_an_object.to_string()).unwrap();
        assert_eq!(state.projects[0].name, "Also kept");
    }

    #[test]
    fn newer_export_version_is_unwrapped() {
        let blob = json!({
            "format": "boardsync-export/2",
            "state": {"projects": [{"id": "p1", "name": "Future"}]},
        });
        assert_eq!(import(&blob.to_string()).unwrap().projects[0].name, "Future");
    }

    #[test]
    fn non_json_is_rejected() {
        let err = import("definitely not json").unwrap_err();
        assert!(matches!(err, TransferError::NotJson(_)));
        assert_eq!(err.transience(), Transience::Permanent);
    }

    #[test]
    fn non_object_json_imports_as_empty() {
        assert_eq!(import("[1,2]").unwrap(), BoardState::default());
        assert_eq!(import(&json!(7).to_string()).unwrap(), BoardState::default());
    }

    #[derive(Debug, Clone)]
    enum Op {
        AddCard {
            title: String,
            label: usize,
            assignee: usize,
        },
        Depend(usize, usize),
        Parent(usize, usize),
        Move(usize, usize),
        RetroItem {
            text: String,
            author: Option<String>,
            category: usize,
        },
        Vote(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            ("[a-z ]{1,12}", 0..4usize, 0..4usize).prop_map(|(title, label, assignee)| {
                Op::AddCard {
                    title,
                    label,
                    assignee,
                }
            }),
            (0..8usize, 0..8usize).prop_map(|(a, b)| Op::Depend(a, b)),
            (0..8usize, 0..8usize).prop_map(|(a, b)| Op::Parent(a, b)),
            (0..8usize, 0..4usize).prop_map(|(card, column)| Op::Move(card, column)),
            ("[a-z ]{1,12}", prop::option::of("[a-z ]{0,6}"), 0..3usize).prop_map(
                |(text, author, category)| Op::RetroItem {
                    text,
                    author,
                    category,
                }
            ),
            (0..8usize).prop_map(Op::Vote),
        ]
    }

    /// `pick(items, 0)` is none; `k > 0` wraps around the list.
    fn pick<T>(items: &[T], k: usize) -> Option<&T> {
        if k == 0 || items.is_empty() {
            None
        } else {
            items.get((k - 1) % items.len())
        }
    }

    fn build(labels: &[String], members: &[String], ops: &[Op]) -> BoardState {
        let mut state = BoardState::new();
        let pid = state.add_project("Board", 1).unwrap();
        let project = state.project_mut(&pid).unwrap();
        for (i, name) in labels.iter().enumerate() {
            let color = LabelColor::ALL[i % LabelColor::ALL.len()];
            // blank or duplicate names are rejected; fine here
            let _ = project.add_label(name, color);
        }
        for name in members {
            let _ = project.add_member(name);
        }
        let retro = project.add_retro_board("Sprint", 2).unwrap();

        for op in ops {
            let card_ids: Vec<CardId> = project.cards.iter().map(|c| c.id.clone()).collect();
            let card = |k: usize| pick(&card_ids, k + 1).cloned();
            match op {
                Op::AddCard {
                    title,
                    label,
                    assignee,
                } => {
                    let label_names: Vec<String> =
                        project.labels.iter().map(|l| l.name.clone()).collect();
                    let member_names: Vec<String> = project.members.iter().cloned().collect();
                    let mut new = NewCard::titled(title.clone());
                    new.labels.extend(pick(&label_names, *label).cloned());
                    new.assignee = pick(&member_names, *assignee).cloned();
                    let _ = project.add_card(new, 3);
                }
                Op::Depend(a, b) => {
                    if let (Some(a), Some(b)) = (card(*a), card(*b)) {
                        let _ = project.add_dependency(&a, &b);
                    }
                }
                Op::Parent(a, b) => {
                    if let (Some(a), Some(b)) = (card(*a), card(*b)) {
                        let _ = project.set_parent(&a, Some(&b));
                    }
                }
                Op::Move(k, column) => {
                    let columns: Vec<ColumnId> =
                        project.columns.iter().map(|c| c.id.clone()).collect();
                    let target = pick(&columns, *column).cloned().unwrap_or_else(ColumnId::backlog);
                    if let Some(id) = card(*k) {
                        let _ = project.move_card(&id, &target, Some(0));
                    }
                }
                Op::RetroItem {
                    text,
                    author,
                    category,
                } => {
                    let category = RetroCategory::ALL[category % RetroCategory::ALL.len()];
                    let _ = project.add_retro_item(&retro, category, text, author.clone());
                }
                Op::Vote(k) => {
                    let items: Vec<RetroItemId> = project
                        .retro
                        .board(&retro)
                        .map(|board| board.items.iter().map(|it| it.id.clone()).collect())
                        .unwrap_or_default();
                    if let Some(item) = pick(&items, k + 1) {
                        let _ = project.vote_retro_item(&retro, item);
                    }
                }
            }
        }
        state
    }

    proptest! {
        #[test]
        fn export_then_import_restores_state(
            labels in prop::collection::vec("[a-z ]{1,8}", 0..4),
            members in prop::collection::vec("[a-z ]{1,8}", 0..4),
            ops in prop::collection::vec(op(), 0..24),
        ) {
            let state = build(&labels, &members, &ops);
            let blob = export(&state, 9);
            prop_assert_eq!(import(&blob).unwrap(), state);
        }
    }
}
