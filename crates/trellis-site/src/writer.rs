//! Conditional artifact writer and asset registration

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use trellis_core::{GenerationError, Result};

use crate::freshness::{Freshness, check_freshness};

/// Receives the site-relative path of every artifact created for the first
/// time, so the host site can publish it.
pub trait AssetRegistry: Send + Sync {
    fn register(&self, relative: &Path);
}

/// Registry that records registered paths in order.
#[derive(Debug, Default)]
pub struct StaticFileRegistry {
    files: Mutex<Vec<PathBuf>>,
}

impl StaticFileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> Vec<PathBuf> {
        self.files.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.files.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AssetRegistry for StaticFileRegistry {
    fn register(&self, relative: &Path) {
        tracing::debug!("Registering static file {}", relative.display());
        self.files.lock().push(relative.to_path_buf());
    }
}

/// Result of one conditional write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The artifact was current and left untouched.
    Skipped(Freshness),
    /// The artifact was persisted.
    Written {
        path: PathBuf,
        created: bool,
        reason: Freshness,
    },
}

impl WriteOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, WriteOutcome::Written { .. })
    }
}

/// Writes artifacts under a site root only when they are out of date.
///
/// Not atomic; assumes one writer per output path.
#[derive(Clone)]
pub struct ConditionalWriter {
    root: PathBuf,
    registry: Arc<dyn AssetRegistry>,
}

impl std::fmt::Debug for ConditionalWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConditionalWriter")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl ConditionalWriter {
    pub fn new(root: impl Into<PathBuf>, registry: Arc<dyn AssetRegistry>) -> Self {
        ConditionalWriter {
            root: root.into(),
            registry,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write text content at `relative` unless the existing file is newer
    /// than the source and byte-identical.
    pub fn write_text(
        &self,
        relative: &Path,
        source_timestamp: i64,
        content: &str,
    ) -> Result<WriteOutcome> {
        let path = self.root.join(relative);
        let freshness = check_freshness(source_timestamp, &path, Some(content.as_bytes()))?;
        if !freshness.needs_write() {
            tracing::debug!("{} is current", relative.display());
            return Ok(WriteOutcome::Skipped(freshness));
        }
        self.persist(relative, path, freshness, content.as_bytes())
    }

    /// Write binary content at `relative` when the existing file is missing
    /// or older than the source. `render` is only called when a write is
    /// needed.
    pub fn write_binary<F>(
        &self,
        relative: &Path,
        source_timestamp: i64,
        render: F,
    ) -> Result<WriteOutcome>
    where
        F: FnOnce() -> Result<Vec<u8>>,
    {
        let path = self.root.join(relative);
        let freshness = check_freshness(source_timestamp, &path, None)?;
        if !freshness.needs_write() {
            tracing::debug!("{} is current", relative.display());
            return Ok(WriteOutcome::Skipped(freshness));
        }
        let bytes = render()?;
        self.persist(relative, path, freshness, &bytes)
    }

    fn persist(
        &self,
        relative: &Path,
        path: PathBuf,
        reason: Freshness,
        bytes: &[u8],
    ) -> Result<WriteOutcome> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| GenerationError::persistence(parent, e))?;
        }
        tracing::info!("Rendering {}", relative.display());
        std::fs::write(&path, bytes).map_err(|e| GenerationError::persistence(&path, e))?;

        let created = reason == Freshness::Missing;
        if created {
            self.registry.register(relative);
        }
        Ok(WriteOutcome::Written {
            path,
            created,
            reason,
        })
    }
}
