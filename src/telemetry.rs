//! Tracing subscriber setup: stderr output plus an optional rolling log file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::metadata::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

use crate::config::{FileLoggingConfig, LogFormat, LogRotation, LoggingConfig};
use crate::paths;

const LOG_FILE_PREFIX: &str = "boardsync.log";
const FILTER_ENV: &str = "BOARDSYNC_LOG";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    pub verbosity: u8,
    pub logging: LoggingConfig,
}

impl TelemetryConfig {
    pub fn new(verbosity: u8, logging: LoggingConfig) -> Self {
        Self { verbosity, logging }
    }
}

/// Keeps the non-blocking file writer alive; drop it last.
pub struct TelemetryGuard {
    _guards: Vec<tracing_appender::non_blocking::WorkerGuard>,
}

/// Installs the global subscriber. A second call in the same process is a
/// no-op apart from the returned guard.
pub fn init(config: TelemetryConfig) -> TelemetryGuard {
    let filter = build_filter(config.verbosity, config.logging.filter.as_deref());

    let mut guards = Vec::new();
    let mut layers: Vec<BoxedLayer> = Vec::new();
    if config.logging.stderr {
        layers.push(format_layer(
            config.logging.stderr_format,
            std::io::stderr,
            true,
        ));
    }

    let mut notes = Vec::new();
    if config.logging.file.enabled {
        let dir = config
            .logging
            .file
            .dir
            .clone()
            .unwrap_or_else(paths::log_dir);
        match fs::create_dir_all(&dir) {
            Ok(()) => {
                let retention = Retention::from_config(&config.logging.file);
                if retention.is_enabled() {
                    match prune_logs(&dir, retention, SystemTime::now()) {
                        Ok(removed) if removed > 0 => {
                            notes.push(format!("pruned {removed} old log files"));
                        }
                        Ok(_) => {}
                        Err(err) => notes.push(format!("log retention failed: {err}")),
                    }
                }
                let appender = tracing_appender::rolling::RollingFileAppender::new(
                    rotation(config.logging.file.rotation),
                    &dir,
                    LOG_FILE_PREFIX,
                );
                let (writer, guard) = tracing_appender::non_blocking(appender);
                layers.push(format_layer(config.logging.file.format, writer, false));
                guards.push(guard);
            }
            Err(err) => notes.push(format!("log dir {} unavailable: {err}", dir.display())),
        }
    }

    layers.push(Box::new(filter));
    if Registry::default().with(layers).try_init().is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
    for note in notes {
        tracing::warn!("{note}");
    }

    TelemetryGuard { _guards: guards }
}

fn build_filter(verbosity: u8, configured: Option<&str>) -> EnvFilter {
    let builder = EnvFilter::builder().with_default_directive(level_from_verbosity(verbosity).into());
    match std::env::var(FILTER_ENV) {
        Ok(directives) if !directives.trim().is_empty() => builder.parse_lossy(directives),
        _ => match configured {
            Some(directives) => builder.parse_lossy(directives),
            None => builder.parse_lossy(""),
        },
    }
}

fn level_from_verbosity(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

fn rotation(rotation: LogRotation) -> tracing_appender::rolling::Rotation {
    use tracing_appender::rolling::Rotation;
    match rotation {
        LogRotation::Daily => Rotation::DAILY,
        LogRotation::Hourly => Rotation::HOURLY,
        LogRotation::Minutely => Rotation::MINUTELY,
        LogRotation::Never => Rotation::NEVER,
    }
}

fn format_layer<W>(format: LogFormat, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Tree => Box::new(
            tracing_tree::HierarchicalLayer::new(2)
                .with_ansi(ansi)
                .with_writer(writer),
        ),
        LogFormat::Pretty => Box::new(
            tracing_subscriber::fmt::layer()
                .pretty()
                .with_writer(writer)
                .with_ansi(ansi)
                .with_target(true)
                .with_thread_names(true),
        ),
        LogFormat::Compact => Box::new(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(writer)
                .with_ansi(ansi)
                .with_target(true),
        ),
        LogFormat::Json => Box::new(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .with_target(true)
                .with_current_span(true)
                .with_span_list(true),
        ),
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Retention {
    max_age: Option<Duration>,
    max_files: Option<usize>,
}

impl Retention {
    fn from_config(config: &FileLoggingConfig) -> Self {
        Self {
            max_age: config
                .retention_max_age_days
                .map(|days| Duration::from_secs(days.saturating_mul(24 * 60 * 60))),
            max_files: config.retention_max_files,
        }
    }

    fn is_enabled(&self) -> bool {
        self.max_age.is_some() || self.max_files.is_some()
    }
}

fn prune_logs(dir: &Path, retention: Retention, now: SystemTime) -> std::io::Result<usize> {
    let mut logs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let is_log = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with(LOG_FILE_PREFIX));
        let meta = entry.metadata()?;
        if is_log && meta.is_file() {
            logs.push((entry.path(), meta.modified().unwrap_or(now)));
        }
    }

    let mut removed = 0;
    for path in expired(logs, retention, now) {
        match fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(err) => tracing::debug!(path = %path.display(), "could not prune log: {err}"),
        }
    }
    Ok(removed)
}

/// Files beyond the age limit, then the oldest files beyond the count limit.
fn expired(
    mut logs: Vec<(PathBuf, SystemTime)>,
    retention: Retention,
    now: SystemTime,
) -> Vec<PathBuf> {
    // newest first
    logs.sort_by(|a, b| b.1.cmp(&a.1));
    logs.into_iter()
        .enumerate()
        .filter(|(index, (_, modified))| {
            let too_old = retention.max_age.is_some_and(|max| {
                now.duration_since(*modified).unwrap_or(Duration::ZERO) > max
            });
            let too_many = retention.max_files.is_some_and(|max| *index >= max);
            too_old || too_many
        })
        .map(|(_, (path, _))| path)
        .collect()
}
