//! Human output for CLI commands. Pure formatting.

use serde_json::{Value, json};

use crate::core::{BoardState, Project};

/// `*` marks the active project.
pub fn render_projects(state: &BoardState) -> String {
    if state.projects.is_empty() {
        return "no projects".into();
    }
    state
        .projects
        .iter()
        .map(|project| {
            let marker = if state.active_project.as_ref() == Some(&project.id) {
                '*'
            } else {
                ' '
            };
            format!(
                "{marker} {:<12} {:<24} {}",
                project.id.as_str(),
                project.name,
                counts(project)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn counts(project: &Project) -> String {
    let blocked = project.blocked_cards().len();
    let mut line = format!(
        "{} columns, {} cards",
        project.columns.len(),
        project.cards.len()
    );
    if blocked > 0 {
        line.push_str(&format!(" ({blocked} blocked)"));
    }
    line
}

pub fn projects_json(state: &BoardState) -> Value {
    let projects: Vec<Value> = state
        .projects
        .iter()
        .map(|project| {
            json!({
                "id": project.id.as_str(),
                "name": project.name,
                "active": state.active_project.as_ref() == Some(&project.id),
                "columns": project.columns.len(),
                "cards": project.cards.len(),
                "blocked": project.blocked_cards().len(),
            })
        })
        .collect();
    json!({ "projects": projects })
}

pub fn render_problems(problems: &[String]) -> String {
    if problems.is_empty() {
        return "ok".into();
    }
    let mut out = format!("{} problem(s):", problems.len());
    for problem in problems {
        out.push_str("\n  - ");
        out.push_str(problem);
    }
    out
}
