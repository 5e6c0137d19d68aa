//! Durable local copy of the board document.
//!
//! The cache is the offline fallback: the engine reads it once at start-up
//! and rewrites it after every mutation and every adopted remote change.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::error::CacheError;

pub trait LocalCache: Send + Sync {
    /// The last written document, or `None` if nothing was ever written.
    fn read(&self) -> Result<Option<String>, CacheError>;

    fn write(&self, doc: &str) -> Result<(), CacheError>;
}

/// Single-file cache. Writes go through a temp file in the same directory
/// and a rename, so readers never see a partial document.
#[derive(Debug, Clone)]
pub struct FileCache {
    path: PathBuf,
}

impl FileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_err(&self, source: io::Error) -> CacheError {
        CacheError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

impl LocalCache for FileCache {
    fn read(&self) -> Result<Option<String>, CacheError> {
        match fs::read_to_string(&self.path) {
            Ok(doc) => Ok(Some(doc)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(CacheError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn write(&self, doc: &str) -> Result<(), CacheError> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| self.write_err(e))?;
        let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(|e| self.write_err(e))?;
        temp.write_all(doc.as_bytes())
            .map_err(|e| self.write_err(e))?;
        temp.as_file().sync_all().map_err(|e| self.write_err(e))?;
        temp.persist(&self.path)
            .map_err(|err| self.write_err(err.error))?;
        tracing::trace!(path = %self.path.display(), bytes = doc.len(), "cache written");
        Ok(())
    }
}

/// In-process cache for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryCache {
    doc: Mutex<Option<String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(doc: impl Into<String>) -> Self {
        Self {
            doc: Mutex::new(Some(doc.into())),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.doc.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LocalCache for MemoryCache {
    fn read(&self) -> Result<Option<String>, CacheError> {
        Ok(self.slot().clone())
    }

    fn write(&self, doc: &str) -> Result<(), CacheError> {
        *self.slot() = Some(doc.to_string());
        Ok(())
    }
}
