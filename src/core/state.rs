use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::domain::{ProjectId, ViewMode};
use super::error::{CoreError, EntityKind, invalid_input, not_found};
use super::project::{DEFAULT_COLUMNS, Project};

/// Schema version written by this build.
pub const CURRENT_SCHEMA_VERSION: u32 = 3;

/// The whole shared workspace: one document, replaced wholesale on sync.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoardState {
    pub schema_version: u32,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub active_project: Option<ProjectId>,
    #[serde(default)]
    pub view: ViewMode,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for BoardState {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            projects: Vec::new(),
            active_project: None,
            view: ViewMode::default(),
            extra: BTreeMap::new(),
        }
    }
}

impl BoardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn project(&self, id: &ProjectId) -> Option<&Project> {
        self.projects.iter().find(|project| &project.id == id)
    }

    pub fn project_mut(&mut self, id: &ProjectId) -> Result<&mut Project, CoreError> {
        self.projects
            .iter_mut()
            .find(|project| &project.id == id)
            .ok_or_else(|| not_found(EntityKind::Project, id.as_str()))
    }

    pub fn active(&self) -> Option<&Project> {
        self.active_project.as_ref().and_then(|id| self.project(id))
    }

    /// Creates a project with the default columns and makes it active if no
    /// project was.
    pub fn add_project(&mut self, name: &str, now_ms: u64) -> Result<ProjectId, CoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(invalid_input("project name", "must not be empty"));
        }
        let id = loop {
            let candidate = ProjectId::generate();
            if self.project(&candidate).is_none() {
                break candidate;
            }
        };
        let mut project = Project::new(id.clone(), name, now_ms);
        for column in DEFAULT_COLUMNS {
            project.add_column(column, 0)?;
        }
        self.projects.push(project);
        if self.active_project.is_none() {
            self.active_project = Some(id.clone());
        }
        Ok(id)
    }

    pub fn rename_project(&mut self, id: &ProjectId, name: &str) -> Result<(), CoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(invalid_input("project name", "must not be empty"));
        }
        self.project_mut(id)?.name = name.to_string();
        Ok(())
    }

    /// Removes a project; clears the active reference if it pointed there.
    pub fn remove_project(&mut self, id: &ProjectId) -> Result<Project, CoreError> {
        let pos = self
            .projects
            .iter()
            .position(|project| &project.id == id)
            .ok_or_else(|| not_found(EntityKind::Project, id.as_str()))?;
        if self.active_project.as_ref() == Some(id) {
            self.active_project = None;
        }
        Ok(self.projects.remove(pos))
    }

    pub fn set_active_project(&mut self, id: Option<&ProjectId>) -> Result<(), CoreError> {
        if let Some(id) = id
            && self.project(id).is_none()
        {
            return Err(not_found(EntityKind::Project, id.as_str()));
        }
        self.active_project = id.cloned();
        Ok(())
    }

    pub fn set_view(&mut self, view: ViewMode) {
        self.view = view;
    }

    /// Serialized form used for the local cache and the remote document.
    pub fn to_document(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|err| {
            tracing::error!("board state failed to serialize: {err}");
            Value::Null
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_project_becomes_active() {
        let mut state = BoardState::new();
        let a = state.add_project("Alpha", 1).unwrap();
        let _b = state.add_project("Beta", 2).unwrap();
        assert_eq!(state.active_project.as_ref(), Some(&a));
        assert_eq!(state.active().unwrap().columns.len(), DEFAULT_COLUMNS.len());
    }

    #[test]
    fn removing_active_project_clears_reference() {
        let mut state = BoardState::new();
        let a = state.add_project("Alpha", 1).unwrap();
        state.remove_project(&a).unwrap();
        assert_eq!(state.active_project, None);
        assert!(state.projects.is_empty());
    }

    #[test]
    fn active_must_exist() {
        let mut state = BoardState::new();
        let err = state
            .set_active_project(Some(&ProjectId::from("prj-missing")))
            .unwrap_err();
        assert_eq!(err.code(), "not_found");
        state.set_active_project(None).unwrap();
    }

    #[test]
    fn document_serializes_schema_version() {
        let state = BoardState::new();
        let doc = state.to_document();
        assert_eq!(doc["schema_version"], CURRENT_SCHEMA_VERSION);
        assert_eq!(doc["view"], "board");
    }
}
