//! Staleness-aware in-memory model cache

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};

use crate::error::{BoxError, GenerationError, Result};
use crate::model::{Model, ModelHandle};
use crate::source::SourceDescriptor;

/// Parse boundary: turns a model source file into an in-memory model.
pub trait ModelParser: Send + Sync {
    fn parse(&self, path: &Path) -> std::result::Result<Model, BoxError>;
}

impl<F> ModelParser for F
where
    F: Fn(&Path) -> std::result::Result<Model, BoxError> + Send + Sync,
{
    fn parse(&self, path: &Path) -> std::result::Result<Model, BoxError> {
        self(path)
    }
}

/// Freshness of a cached model relative to a source descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    /// Loaded at or after the descriptor's timestamp.
    Fresh,
    /// The source advanced, or the entry was invalidated.
    Stale,
    /// Nothing cached for the path.
    Unknown,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    source: SourceDescriptor,
    model: ModelHandle,
    status: EntryStatus,
}

impl CacheEntry {
    /// Only a timestamp that has advanced past the recorded one makes the
    /// entry stale; equal or older timestamps (clock skew) never do.
    fn is_stale_for(&self, descriptor: &SourceDescriptor) -> bool {
        self.status == EntryStatus::Stale || descriptor.timestamp() > self.source.timestamp()
    }
}

/// Per-path slot. Holding its lock is what serializes loads of one path.
type Slot = Arc<Mutex<Option<CacheEntry>>>;

/// Maps source paths to their most recently loaded model.
///
/// Loads of distinct paths may run concurrently; loads of the same path are
/// single-flight, so a (path, timestamp) pair is parsed at most once.
pub struct ModelCache {
    parser: Arc<dyn ModelParser>,
    slots: DashMap<PathBuf, Slot>,
    default_source: RwLock<Option<PathBuf>>,
    first_loaded: RwLock<Option<PathBuf>>,
    loads: AtomicUsize,
}

impl std::fmt::Debug for ModelCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelCache")
            .field("entries", &self.slots.len())
            .field("loads", &self.load_count())
            .finish()
    }
}

impl ModelCache {
    pub fn new(parser: Arc<dyn ModelParser>) -> Self {
        ModelCache {
            parser,
            slots: DashMap::new(),
            default_source: RwLock::new(None),
            first_loaded: RwLock::new(None),
            loads: AtomicUsize::new(0),
        }
    }

    /// True when the path has no usable entry for this descriptor.
    pub fn is_stale(&self, descriptor: &SourceDescriptor) -> bool {
        self.status(descriptor) != EntryStatus::Fresh
    }

    pub fn status(&self, descriptor: &SourceDescriptor) -> EntryStatus {
        let Some(slot) = self.existing_slot(&descriptor.path) else {
            return EntryStatus::Unknown;
        };
        let guard = slot.lock();
        match guard.as_ref() {
            None => EntryStatus::Unknown,
            Some(entry) if entry.is_stale_for(descriptor) => EntryStatus::Stale,
            Some(_) => EntryStatus::Fresh,
        }
    }

    /// Return the model for a source, loading it if stale.
    ///
    /// With no descriptor the default source is used: the one set with
    /// [`ModelCache::set_default`], else the first path ever loaded.
    pub fn get(&self, descriptor: Option<&SourceDescriptor>) -> Result<ModelHandle> {
        match descriptor {
            Some(descriptor) => self.model(descriptor),
            None => self.default_model(),
        }
    }

    /// Return the model for a source, loading it if stale.
    pub fn model(&self, descriptor: &SourceDescriptor) -> Result<ModelHandle> {
        let slot = self.slot(&descriptor.path);
        let mut guard = slot.lock();
        if let Some(entry) = guard.as_ref().filter(|e| !e.is_stale_for(descriptor)) {
            return Ok(Arc::clone(&entry.model));
        }
        self.load_into(&mut guard, descriptor)
    }

    /// Parse the source unconditionally and replace its entry.
    pub fn reload(&self, descriptor: &SourceDescriptor) -> Result<ModelHandle> {
        let slot = self.slot(&descriptor.path);
        let mut guard = slot.lock();
        self.load_into(&mut guard, descriptor)
    }

    fn default_model(&self) -> Result<ModelHandle> {
        let path = self
            .default_path()
            .ok_or_else(|| GenerationError::SourceUnavailable {
                reason: "no model source has been loaded".to_string(),
            })?;
        let slot = self
            .existing_slot(&path)
            .ok_or_else(|| unavailable(&path))?;
        let mut guard = slot.lock();
        let status = guard.as_ref().map(|e| e.status);

        match status {
            Some(EntryStatus::Stale) => {
                let descriptor = SourceDescriptor::from_path(&path).map_err(|_| unavailable(&path))?;
                self.load_into(&mut guard, &descriptor)
            }
            Some(_) => guard
                .as_ref()
                .map(|e| Arc::clone(&e.model))
                .ok_or_else(|| unavailable(&path)),
            None => Err(unavailable(&path)),
        }
    }

    fn load_into(
        &self,
        slot: &mut Option<CacheEntry>,
        descriptor: &SourceDescriptor,
    ) -> Result<ModelHandle> {
        tracing::info!("Loading model {}", descriptor.path.display());
        let started = Instant::now();

        let model = self
            .parser
            .parse(&descriptor.path)
            .map_err(|source| GenerationError::SourceLoadFailure {
                path: descriptor.path.clone(),
                source,
            })?;

        let handle: ModelHandle = Arc::new(model);
        *slot = Some(CacheEntry {
            source: descriptor.clone(),
            model: Arc::clone(&handle),
            status: EntryStatus::Fresh,
        });
        self.loads.fetch_add(1, Ordering::Relaxed);

        {
            let mut first = self.first_loaded.write();
            if first.is_none() {
                *first = Some(descriptor.path.clone());
            }
        }

        let elapsed = started.elapsed();
        tracing::info!(
            path = %descriptor.path.display(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Loaded model in {:.1} seconds",
            elapsed.as_secs_f64()
        );
        Ok(handle)
    }

    /// Mark a path stale so the next request reloads it.
    pub fn invalidate(&self, path: &Path) -> bool {
        let Some(slot) = self.existing_slot(path) else {
            return false;
        };
        let mut guard = slot.lock();
        match guard.as_mut() {
            Some(entry) => {
                entry.status = EntryStatus::Stale;
                tracing::debug!("Invalidated cached model {}", path.display());
                true
            }
            None => false,
        }
    }

    /// Drop a path from the cache entirely (e.g. the source was deleted).
    pub fn evict(&self, path: &Path) -> bool {
        let removed = self.slots.remove(path).is_some();
        for default in [&self.default_source, &self.first_loaded] {
            let mut current = default.write();
            if current.as_deref() == Some(path) {
                *current = None;
            }
        }
        removed
    }

    /// Choose the source used by requests that name none.
    pub fn set_default(&self, path: &Path) -> Result<()> {
        let cached = self
            .existing_slot(path)
            .is_some_and(|slot| slot.lock().is_some());
        if !cached {
            return Err(GenerationError::SourceUnavailable {
                reason: format!("default source {} is not in the cache", path.display()),
            });
        }
        *self.default_source.write() = Some(path.to_path_buf());
        Ok(())
    }

    pub fn default_path(&self) -> Option<PathBuf> {
        self.default_source
            .read()
            .clone()
            .or_else(|| self.first_loaded.read().clone())
    }

    /// Number of successful loads since the cache was created.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }

    /// Paths with a loaded model, sorted.
    pub fn cached_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self
            .slots
            .iter()
            .filter(|slot| slot.value().lock().is_some())
            .map(|slot| slot.key().clone())
            .collect();
        paths.sort();
        paths
    }

    fn slot(&self, path: &Path) -> Slot {
        if let Some(slot) = self.existing_slot(path) {
            return slot;
        }
        Arc::clone(self.slots.entry(path.to_path_buf()).or_default().value())
    }

    /// Clone the slot out so no map shard lock is held while waiting on it.
    fn existing_slot(&self, path: &Path) -> Option<Slot> {
        self.slots.get(path).map(|slot| Arc::clone(slot.value()))
    }
}

fn unavailable(path: &Path) -> GenerationError {
    GenerationError::SourceUnavailable {
        reason: format!("model source {} is not available", path.display()),
    }
}
