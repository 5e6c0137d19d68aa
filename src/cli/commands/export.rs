use std::path::Path;
use std::process::ExitCode;

use super::super::Ctx;
use crate::core::time::now_ms;
use crate::migrate::export;
use crate::{Error, Result};

pub(crate) fn handle(ctx: &Ctx, out: Option<&Path>) -> Result<ExitCode> {
    let state = ctx.load_state()?;
    let blob = export(&state, now_ms());
    match out {
        Some(path) => {
            std::fs::write(path, blob.as_bytes()).map_err(|source| Error::Io {
                path: path.to_path_buf(),
                source,
            })?;
            tracing::info!(path = %path.display(), projects = state.projects.len(), "board exported");
        }
        None => println!("{blob}"),
    }
    Ok(ExitCode::SUCCESS)
}
