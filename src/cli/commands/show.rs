use std::process::ExitCode;

use super::super::render::{projects_json, render_projects};
use super::super::{Ctx, print_json};
use crate::Result;

pub(crate) fn handle(ctx: &Ctx) -> Result<ExitCode> {
    let state = ctx.load_state()?;
    if ctx.json {
        print_json(&projects_json(&state));
    } else {
        println!("{}", render_projects(&state));
    }
    Ok(ExitCode::SUCCESS)
}
