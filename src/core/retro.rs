//! Retrospective boards embedded in a project.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::domain::{RetroBoardId, RetroCategory, RetroItemId};
use super::error::{CoreError, EntityKind, invalid_input, not_found};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Retro {
    #[serde(default)]
    pub boards: Vec<RetroBoard>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetroBoard {
    pub id: RetroBoardId,
    pub title: String,
    #[serde(default)]
    pub created_at_ms: u64,
    #[serde(default)]
    pub items: Vec<RetroItem>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetroItem {
    pub id: RetroItemId,
    pub category: RetroCategory,
    pub text: String,
    #[serde(default)]
    pub votes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Retro {
    pub fn board(&self, id: &RetroBoardId) -> Option<&RetroBoard> {
        self.boards.iter().find(|board| &board.id == id)
    }

    fn board_mut(&mut self, id: &RetroBoardId) -> Result<&mut RetroBoard, CoreError> {
        self.boards
            .iter_mut()
            .find(|board| &board.id == id)
            .ok_or_else(|| not_found(EntityKind::RetroBoard, id.as_str()))
    }

    pub fn add_board(&mut self, title: &str, now_ms: u64) -> Result<RetroBoardId, CoreError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(invalid_input("retro title", "must not be empty"));
        }
        let id = RetroBoardId::generate();
        self.boards.push(RetroBoard {
            id: id.clone(),
            title: title.to_string(),
            created_at_ms: now_ms,
            items: Vec::new(),
            extra: BTreeMap::new(),
        });
        Ok(id)
    }

    pub fn remove_board(&mut self, id: &RetroBoardId) -> Result<RetroBoard, CoreError> {
        let pos = self
            .boards
            .iter()
            .position(|board| &board.id == id)
            .ok_or_else(|| not_found(EntityKind::RetroBoard, id.as_str()))?;
        Ok(self.boards.remove(pos))
    }

    pub fn add_item(
        &mut self,
        board: &RetroBoardId,
        category: RetroCategory,
        text: &str,
        author: Option<String>,
    ) -> Result<RetroItemId, CoreError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(invalid_input("retro item", "must not be empty"));
        }
        let author = author
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());
        let board = self.board_mut(board)?;
        let id = RetroItemId::generate();
        board.items.push(RetroItem {
            id: id.clone(),
            category,
            text: text.to_string(),
            votes: 0,
            author,
            extra: BTreeMap::new(),
        });
        Ok(id)
    }

    /// Adds one vote and returns the new total.
    pub fn vote(&mut self, board: &RetroBoardId, item: &RetroItemId) -> Result<u32, CoreError> {
        let board = self.board_mut(board)?;
        let item = board
            .items
            .iter_mut()
            .find(|it| &it.id == item)
            .ok_or_else(|| not_found(EntityKind::RetroItem, item.as_str()))?;
        item.votes = item.votes.saturating_add(1);
        Ok(item.votes)
    }

    pub fn remove_item(
        &mut self,
        board: &RetroBoardId,
        item: &RetroItemId,
    ) -> Result<RetroItem, CoreError> {
        let board = self.board_mut(board)?;
        let pos = board
            .items
            .iter()
            .position(|it| &it.id == item)
            .ok_or_else(|| not_found(EntityKind::RetroItem, item.as_str()))?;
        Ok(board.items.remove(pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn items_vote_and_remove() {
        let mut retro = Retro::default();
        let board = retro.add_board("Sprint 12", 10).unwrap();
        let item = retro
            .add_item(&board, RetroCategory::WentWell, "shipped sync", None)
            .unwrap();
        assert_eq!(retro.vote(&board, &item).unwrap(), 1);
        assert_eq!(retro.vote(&board, &item).unwrap(), 2);

        let removed = retro.remove_item(&board, &item).unwrap();
        assert_eq!(removed.votes, 2);
        assert!(retro.board(&board).unwrap().items.is_empty());
    }

    #[test]
    fn missing_board_is_not_found() {
        let mut retro = Retro::default();
        let err = retro
            .add_item(
                &RetroBoardId::from("retro-nope"),
                RetroCategory::Action,
                "x",
                None,
            )
            .unwrap_err();
        assert_eq!(err.code(), "not_found");
    }

    #[test]
    fn author_is_trimmed_and_blank_dropped() {
        let mut retro = Retro::default();
        let board = retro.add_board("Sprint 13", 0).unwrap();
        let named = retro
            .add_item(&board, RetroCategory::Action, "pair more", Some(" ada ".into()))
            .unwrap();
        let blank = retro
            .add_item(&board, RetroCategory::Action, "fix ci", Some("   ".into()))
            .unwrap();
        let items = &retro.board(&board).unwrap().items;
        let author = |id: &RetroItemId| items.iter().find(|it| &it.id == id).unwrap().author.clone();
        assert_eq!(author(&named), Some("ada".to_string()));
        assert_eq!(author(&blank), None);
    }

    #[test]
    fn blank_text_is_rejected() {
        let mut retro = Retro::default();
        assert!(retro.add_board("   ", 0).is_err());
    }
}
