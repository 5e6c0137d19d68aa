use std::process::ExitCode;

use serde_json::{Value, json};

use super::super::render::render_problems;
use super::super::{Ctx, print_json};
use crate::Result;
use crate::migrate::migrate_with_report;

pub(crate) fn handle(ctx: &Ctx) -> Result<ExitCode> {
    let problems = match ctx.read_raw()? {
        Some(doc) => problems(&doc),
        None => Vec::new(),
    };

    if ctx.json {
        print_json(&json!({ "ok": problems.is_empty(), "problems": problems }));
    } else {
        println!("{}", render_problems(&problems));
    }
    Ok(if problems.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Everything the migrator had to repair plus soft-limit overflows that
/// survive migration.
fn problems(doc: &str) -> Vec<String> {
    let value: Value = match serde_json::from_str(doc) {
        Ok(value) => value,
        Err(err) => return vec![format!("cache is not JSON: {err}")],
    };
    let (state, report) = migrate_with_report(&value);
    let mut problems = report.warnings;
    for project in &state.projects {
        for over in project.wip_overflows() {
            problems.push(format!(
                "{}: column {} holds {} cards over a WIP limit of {}",
                project.id, over.column, over.count, over.limit
            ));
        }
    }
    problems
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_document_has_no_problems() {
        let mut state = crate::BoardState::default();
        state.add_project("Roadmap", 0).unwrap();
        let doc = state.to_document().to_string();
        assert!(problems(&doc).is_empty());
    }

    #[test]
    fn cycles_dangling_refs_and_wip_are_reported() {
        let doc = json!({
            "schema_version": 3,
            "projects": [{
                "id": "prj-1",
                "name": "Board",
                "columns": [{ "id": "col-a", "name": "Doing", "wip_limit": 1 }],
                "cards": [
                    { "id": "a", "title": "A", "column": "col-a", "depends_on": ["b"] },
                    { "id": "b", "title": "B", "column": "col-a", "depends_on": ["a", "ghost"] }
                ]
            }]
        })
        .to_string();

        let found = problems(&doc);
        assert!(found.iter().any(|p| p.contains("cycle")), "{found:?}");
        assert!(found.iter().any(|p| p.contains("ghost")), "{found:?}");
        assert!(found.iter().any(|p| p.contains("WIP limit of 1")), "{found:?}");
    }

    #[test]
    fn non_json_cache_is_a_problem() {
        let found = problems("{not json");
        assert_eq!(found.len(), 1);
        assert!(found[0].starts_with("cache is not JSON"));
    }
}
