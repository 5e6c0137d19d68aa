//! Offline CLI over the local board cache.
//!
//! Every command works on the cached document only; nothing here talks to a
//! remote store.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand, builder::BoolishValueParser};

use crate::config::Config;
use crate::sync::{FileCache, LocalCache};
use crate::{BoardState, Error, Result};

mod commands;
mod render;

#[derive(Parser, Debug)]
#[command(
    name = "boardsync",
    version,
    about = "Inspect and move the local board cache",
    infer_subcommands = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Machine-readable JSON output.
    #[arg(
        long,
        global = true,
        default_value_t = false,
        num_args = 0..=1,
        value_parser = BoolishValueParser::new()
    )]
    pub json: bool,

    /// Cache document to operate on (default: from config).
    #[arg(long, global = true, value_name = "PATH")]
    pub cache: Option<PathBuf>,

    /// Log more (repeat for more).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the cached board as an export blob.
    Export {
        /// Write to this file instead of stdout.
        #[arg(long, short = 'o', value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// Replace the cached board with an export blob or raw document.
    Import {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Print the migrated form of a raw document.
    Migrate {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Report repairs, dependency cycles and WIP overflows in the cache.
    #[command(alias = "doctor")]
    Check,

    /// One line per project.
    #[command(alias = "ls")]
    Show,
}

pub(crate) struct Ctx {
    pub cache: FileCache,
    pub json: bool,
}

impl Ctx {
    /// Cached document text, `None` when the cache was never written.
    pub fn read_raw(&self) -> Result<Option<String>> {
        Ok(self.cache.read()?)
    }

    pub fn load_state(&self) -> Result<BoardState> {
        Ok(match self.read_raw()? {
            Some(doc) => crate::migrate::migrate_str(&doc),
            None => BoardState::default(),
        })
    }

    pub fn store_state(&self, state: &BoardState) -> Result<()> {
        self.cache
            .write(&crate::sync::reconcile::document_text(state))?;
        Ok(())
    }
}

pub fn parse_from<I, T>(args: I) -> Cli
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::parse_from(args)
}

/// Run the CLI (used by bin).
pub fn run(cli: Cli, config: &Config) -> Result<ExitCode> {
    let cache_path = cli
        .cache
        .clone()
        .unwrap_or_else(|| config.cache.resolved_path());
    tracing::debug!(cache = %cache_path.display(), "using board cache");
    let ctx = Ctx {
        cache: FileCache::new(cache_path),
        json: cli.json,
    };

    match cli.command {
        Commands::Export { out } => commands::export::handle(&ctx, out.as_deref()),
        Commands::Import { file } => commands::import::handle(&ctx, &file),
        Commands::Migrate { file } => commands::migrate::handle(&ctx, &file),
        Commands::Check => commands::check::handle(&ctx),
        Commands::Show => commands::show::handle(&ctx),
    }
}

pub(crate) fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(err) => tracing::error!("failed to render json: {err}"),
    }
}
