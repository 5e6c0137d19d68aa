//! Lenient readers from raw JSON into board types.
//!
//! Every reader is total: wrong types and unknown enum values fall back to
//! defaults. Keys a reader owns (including legacy aliases) are consumed;
//! everything else lands in the entity's `extra` map untouched.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde_json::{Map, Value};

use crate::core::{
    BoardState, Card, CardId, CardKind, Column, ColumnId, Label, LabelColor, Priority, Project,
    ProjectId, Retro, RetroBoard, RetroBoardId, RetroCategory, RetroItem, RetroItemId, ViewMode,
};

const STATE_ACTIVE: &[&str] = &["active_project", "active_project_id", "activeProjectId"];
const STATE_VIEW: &[&str] = &["view", "view_mode", "currentView"];
const STATE_FIELDS: &[&[&str]] = &[
    &["schema_version", "schemaVersion", "version"],
    &["projects"],
    STATE_ACTIVE,
    STATE_VIEW,
];

const PROJECT_FIELDS: &[&[&str]] = &[
    &["id"],
    &["name", "title"],
    &["columns"],
    &["labels"],
    &["members", "team"],
    &["cards", "tasks"],
    &["retro", "retros"],
    &["created_at_ms", "created_at", "createdAt"],
];

const COLUMN_FIELDS: &[&[&str]] = &[&["id"], &["name", "title"], &["wip_limit", "wipLimit", "wip"]];

const CARD_FIELDS: &[&[&str]] = &[
    &["id"],
    &["title", "name"],
    &["description"],
    &["notes"],
    &["priority"],
    &["labels", "tags"],
    &["depends_on", "dependencies", "dependsOn"],
    &["assignee", "assigned_to", "assignedTo"],
    &["column", "column_id", "columnId", "status"],
    &["order", "position"],
    &["created_at_ms", "created_at", "createdAt"],
    &["kind", "type"],
    &["estimate", "points", "storyPoints"],
    &["parent", "parent_id", "parentId", "epic_id", "epicId"],
];

const RETRO_BOARD_FIELDS: &[&[&str]] = &[
    &["id"],
    &["title", "name"],
    &["created_at_ms", "created_at", "createdAt"],
    &["items"],
];

const RETRO_ITEM_FIELDS: &[&[&str]] = &[
    &["id"],
    &["category", "type", "column"],
    &["text", "content"],
    &["votes"],
    &["author"],
];

/// First non-null value under any of `keys`.
fn field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find(|value| !value.is_null())
}

fn extras(obj: &Map<String, Value>, owned: &[&[&str]]) -> BTreeMap<String, Value> {
    obj.iter()
        .filter(|(key, _)| !owned.iter().any(|group| group.contains(&key.as_str())))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn trimmed(value: Option<&Value>) -> Option<String> {
    string(value)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn integer(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|u| i64::try_from(u).unwrap_or(i64::MAX)))
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn unsigned(value: Option<&Value>) -> Option<u64> {
    integer(value).and_then(|n| u64::try_from(n).ok())
}

fn array(value: Option<&Value>) -> &[Value] {
    match value {
        Some(Value::Array(items)) => items,
        _ => &[],
    }
}

/// Names from an array of strings or of `{name}` / `{id}` objects.
fn names(value: Option<&Value>) -> Vec<String> {
    array(value)
        .iter()
        .filter_map(|item| match item {
            Value::Object(obj) => trimmed(field(obj, &["name", "id"])),
            other => trimmed(Some(other)),
        })
        .collect()
}

/// Assigns `candidate` (or `fallback` when absent) a value not yet in `taken`.
pub(super) fn claim_id(taken: &mut HashSet<String>, candidate: Option<String>, fallback: String) -> String {
    let base = candidate.unwrap_or(fallback);
    let mut id = base.clone();
    let mut n = 2;
    while taken.contains(&id) {
        id = format!("{base}-{n}");
        n += 1;
    }
    taken.insert(id.clone());
    id
}

pub(super) fn read_state(obj: &Map<String, Value>) -> BoardState {
    let mut taken = HashSet::new();
    let projects = array(obj.get("projects"))
        .iter()
        .enumerate()
        .filter_map(|(pos, value)| value.as_object().map(|p| read_project(p, pos, &mut taken)))
        .collect();

    BoardState {
        schema_version: crate::core::CURRENT_SCHEMA_VERSION,
        projects,
        active_project: trimmed(field(obj, STATE_ACTIVE)).map(ProjectId::new),
        view: string(field(obj, STATE_VIEW))
            .and_then(|raw| ViewMode::parse(&raw))
            .unwrap_or_default(),
        extra: extras(obj, STATE_FIELDS),
    }
}

fn read_project(obj: &Map<String, Value>, pos: usize, taken: &mut HashSet<String>) -> Project {
    let id = claim_id(taken, trimmed(field(obj, &["id"])), format!("prj-{pos}"));

    let mut column_ids: HashSet<String> = HashSet::from([ColumnId::BACKLOG.to_string()]);
    let columns = array(field(obj, &["columns"]))
        .iter()
        .enumerate()
        .filter_map(|(pos, value)| read_column(value, pos, &mut column_ids))
        .collect();

    let mut labels: Vec<Label> = Vec::new();
    for value in array(field(obj, &["labels"])) {
        let (name, color) = match value {
            Value::Object(label) => (
                trimmed(field(label, &["name"])),
                string(field(label, &["color", "colour"])).and_then(|raw| LabelColor::parse(&raw)),
            ),
            other => (trimmed(Some(other)), None),
        };
        if let Some(name) = name
            && !labels.iter().any(|label| label.name == name)
        {
            labels.push(Label {
                name,
                color: color.unwrap_or_default(),
            });
        }
    }

    let mut card_ids = HashSet::new();
    let cards = array(field(obj, &["cards", "tasks"]))
        .iter()
        .enumerate()
        .filter_map(|(pos, value)| value.as_object().map(|c| read_card(c, pos, &mut card_ids)))
        .collect();

    Project {
        id: ProjectId::new(id),
        name: trimmed(field(obj, &["name", "title"])).unwrap_or_else(|| "Untitled project".into()),
        columns,
        labels,
        members: names(field(obj, &["members", "team"])).into_iter().collect(),
        cards,
        retro: read_retro(field(obj, &["retro", "retros"])),
        created_at_ms: unsigned(field(obj, &["created_at_ms", "created_at", "createdAt"]))
            .unwrap_or(0),
        extra: extras(obj, PROJECT_FIELDS),
    }
}

fn read_column(value: &Value, pos: usize, taken: &mut HashSet<String>) -> Option<Column> {
    let fallback = format!("col-{pos}");
    match value {
        Value::Object(obj) => {
            let id = claim_id(taken, trimmed(field(obj, &["id"])), fallback);
            Some(Column {
                name: trimmed(field(obj, &["name", "title"])).unwrap_or_else(|| id.clone()),
                id: ColumnId::new(id),
                wip_limit: unsigned(field(obj, &["wip_limit", "wipLimit", "wip"]))
                    .and_then(|n| u32::try_from(n).ok())
                    .unwrap_or(0),
                extra: extras(obj, COLUMN_FIELDS),
            })
        }
        // legacy boards stored bare column names
        other => {
            let name = trimmed(Some(other))?;
            let id = claim_id(taken, None, fallback);
            Some(Column::new(ColumnId::new(id), name, 0))
        }
    }
}

fn read_card(obj: &Map<String, Value>, pos: usize, taken: &mut HashSet<String>) -> Card {
    let id = claim_id(taken, trimmed(field(obj, &["id"])), format!("card-{pos}"));

    let priority = match field(obj, &["priority"]) {
        Some(Value::String(raw)) => Priority::parse(raw),
        Some(Value::Number(n)) => n.as_i64().and_then(Priority::from_legacy_rank),
        _ => None,
    }
    .unwrap_or_default();

    let depends_on: BTreeSet<CardId> = names(field(obj, &["depends_on", "dependencies", "dependsOn"]))
        .into_iter()
        .map(CardId::new)
        .collect();

    Card {
        id: CardId::new(id),
        title: string(field(obj, &["title", "name"])).unwrap_or_default(),
        description: string(field(obj, &["description"])).unwrap_or_default(),
        notes: string(field(obj, &["notes"])).unwrap_or_default(),
        priority,
        labels: names(field(obj, &["labels", "tags"])).into_iter().collect(),
        depends_on,
        assignee: trimmed(field(obj, &["assignee", "assigned_to", "assignedTo"])),
        column: trimmed(field(obj, &["column", "column_id", "columnId", "status"]))
            .map(ColumnId::new)
            .unwrap_or_else(ColumnId::backlog),
        order: integer(field(obj, &["order", "position"])).unwrap_or(pos as i64),
        created_at_ms: unsigned(field(obj, &["created_at_ms", "created_at", "createdAt"])).unwrap_or(0),
        kind: string(field(obj, &["kind", "type"])).and_then(|raw| CardKind::parse(&raw)),
        estimate: unsigned(field(obj, &["estimate", "points", "storyPoints"])).and_then(|n| u32::try_from(n).ok()),
        parent: trimmed(field(obj, &["parent", "parent_id", "parentId", "epic_id", "epicId"])).map(CardId::new),
        extra: extras(obj, CARD_FIELDS),
    }
}

fn read_retro(value: Option<&Value>) -> Retro {
    let boards = match value {
        Some(Value::Object(obj)) => array(obj.get("boards")),
        // older documents kept the board list directly under `retro`
        Some(Value::Array(items)) => items.as_slice(),
        _ => &[],
    };
    let mut board_ids = HashSet::new();
    let mut item_ids = HashSet::new();
    Retro {
        boards: boards
            .iter()
            .enumerate()
            .filter_map(|(pos, value)| {
                let obj = value.as_object()?;
                Some(read_retro_board(obj, pos, &mut board_ids, &mut item_ids))
            })
            .collect(),
    }
}

fn read_retro_board(
    obj: &Map<String, Value>,
    pos: usize,
    board_ids: &mut HashSet<String>,
    item_ids: &mut HashSet<String>,
) -> RetroBoard {
    let id = claim_id(board_ids, trimmed(field(obj, &["id"])), format!("retro-{pos}"));
    let items = array(obj.get("items"))
        .iter()
        .enumerate()
        .filter_map(|(item_pos, value)| {
            let item = value.as_object()?;
            let item_id = claim_id(
                item_ids,
                trimmed(field(item, &["id"])),
                format!("item-{pos}-{item_pos}"),
            );
            Some(RetroItem {
                id: RetroItemId::new(item_id),
                category: string(field(item, &["category", "type", "column"]))
                    .and_then(|raw| RetroCategory::parse(&raw))
                    .unwrap_or(RetroCategory::ToImprove),
                text: string(field(item, &["text", "content"])).unwrap_or_default(),
                votes: unsigned(field(item, &["votes"]))
                    .and_then(|n| u32::try_from(n).ok())
                    .unwrap_or(0),
                author: trimmed(field(item, &["author"])),
                extra: extras(item, RETRO_ITEM_FIELDS),
            })
        })
        .collect();

    RetroBoard {
        id: RetroBoardId::new(id),
        title: trimmed(field(obj, &["title", "name"])).unwrap_or_else(|| "Retro".into()),
        created_at_ms: unsigned(field(obj, &["created_at_ms", "created_at", "createdAt"]))
            .unwrap_or(0),
        items,
        extra: extras(obj, RETRO_BOARD_FIELDS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn claim_id_suffixes_duplicates() {
        let mut taken = HashSet::new();
        assert_eq!(claim_id(&mut taken, Some("a".into()), "x".into()), "a");
        assert_eq!(claim_id(&mut taken, Some("a".into()), "x".into()), "a-2");
        assert_eq!(claim_id(&mut taken, None, "a".into()), "a-3");
    }

    #[test]
    fn integer_accepts_floats_and_numeric_strings() {
        assert_eq!(integer(Some(&json!(3.9))), Some(3));
        assert_eq!(integer(Some(&json!(" 12 "))), Some(12));
        assert_eq!(integer(Some(&json!(true))), None);
    }

    #[test]
    fn card_aliases_are_consumed_not_preserved() {
        let obj = json!({
            "id": "c1",
            "name": "legacy title",
            "dependencies": ["c2"],
            "columnId": "todo",
            "priority": 1,
            "wobble": {"x": 1}
        });
        let card = read_card(obj.as_object().unwrap(), 0, &mut HashSet::new());
        assert_eq!(card.title, "legacy title");
        assert!(card.depends_on.contains(&CardId::from("c2")));
        assert_eq!(card.column, ColumnId::from("todo"));
        assert_eq!(card.priority, Priority::High);
        assert_eq!(card.extra.len(), 1);
        assert_eq!(card.extra["wobble"], json!({"x": 1}));
    }
}
