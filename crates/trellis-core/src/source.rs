//! Identity of a model source file

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};

/// A model source: its path plus the modification time it was observed at.
///
/// The path is the cache key; two descriptors for the same path compare by
/// timestamp only, in whole seconds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceDescriptor {
    pub path: PathBuf,
    pub modified_at: DateTime<Utc>,
}

impl SourceDescriptor {
    pub fn new(path: impl Into<PathBuf>, modified_at: DateTime<Utc>) -> Self {
        SourceDescriptor {
            path: path.into(),
            modified_at,
        }
    }

    /// Describe a file from its current filesystem metadata.
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let modified = std::fs::metadata(path)?.modified()?;
        Ok(SourceDescriptor::new(path, modified.into()))
    }

    /// Integer timestamp used for every staleness comparison.
    pub fn timestamp(&self) -> i64 {
        self.modified_at.timestamp()
    }

    /// Directory the source lives in; generated artifacts are placed here.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }
}

/// Seconds-resolution timestamp of a filesystem modification time.
pub fn file_timestamp(modified: SystemTime) -> i64 {
    DateTime::<Utc>::from(modified).timestamp()
}
