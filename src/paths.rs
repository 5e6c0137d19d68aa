//! XDG directory helpers for config/data locations.

use std::path::PathBuf;

/// Base directory for persistent data (cache document, logs).
///
/// Uses `BOARDSYNC_DATA_DIR` if set, otherwise `$XDG_DATA_HOME/boardsync` or
/// `~/.local/share/boardsync`.
pub fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("BOARDSYNC_DATA_DIR")
        && !dir.trim().is_empty()
    {
        return PathBuf::from(dir);
    }

    std::env::var("XDG_DATA_HOME")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::data_dir)
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("/tmp"))
                .join(".local")
                .join("share")
        })
        .join("boardsync")
}

/// Default location of the cached board document.
pub fn cache_path() -> PathBuf {
    data_dir().join("state.json")
}

/// Default directory for rolling log files.
pub fn log_dir() -> PathBuf {
    data_dir().join("logs")
}

/// Base directory for configuration files.
///
/// Uses `BOARDSYNC_CONFIG_DIR` if set, otherwise `$XDG_CONFIG_HOME/boardsync`
/// or `~/.config/boardsync`.
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("BOARDSYNC_CONFIG_DIR")
        && !dir.trim().is_empty()
    {
        return PathBuf::from(dir);
    }

    std::env::var("XDG_CONFIG_HOME")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::config_dir)
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("/tmp"))
                .join(".config")
        })
        .join("boardsync")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_and_logs_live_under_data_dir() {
        let data = data_dir();
        assert!(data.ends_with("boardsync") || std::env::var_os("BOARDSYNC_DATA_DIR").is_some());
        assert_eq!(cache_path(), data.join("state.json"));
        assert_eq!(log_dir(), data.join("logs"));
    }
}
