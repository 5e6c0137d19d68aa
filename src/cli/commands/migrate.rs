use std::path::Path;
use std::process::ExitCode;

use serde_json::Value;

use super::super::{Ctx, print_json, read_file};
use crate::Result;
use crate::migrate::{TransferError, migrate_with_report};

/// Prints the migrated document on stdout and each repair on stderr.
pub(crate) fn handle(ctx: &Ctx, file: &Path) -> Result<ExitCode> {
    let raw = read_file(file)?;
    let value: Value = serde_json::from_str(&raw).map_err(TransferError::from)?;
    let (state, report) = migrate_with_report(&value);

    if !ctx.json {
        for warning in &report.warnings {
            eprintln!("repaired: {warning}");
        }
    }
    print_json(&state.to_document());
    Ok(ExitCode::SUCCESS)
}
