use std::path::Path;
use std::process::ExitCode;

use serde_json::json;

use super::super::{Ctx, print_json, read_file};
use crate::Result;
use crate::migrate::import;

pub(crate) fn handle(ctx: &Ctx, file: &Path) -> Result<ExitCode> {
    let blob = read_file(file)?;
    let state = import(&blob)?;
    ctx.store_state(&state)?;

    let cards: usize = state.projects.iter().map(|p| p.cards.len()).sum();
    if ctx.json {
        print_json(&json!({
            "cache": ctx.cache.path().display().to_string(),
            "projects": state.projects.len(),
            "cards": cards,
        }));
    } else {
        println!(
            "imported {} project(s), {cards} card(s) into {}",
            state.projects.len(),
            ctx.cache.path().display()
        );
    }
    Ok(ExitCode::SUCCESS)
}
