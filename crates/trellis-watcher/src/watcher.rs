//! Filesystem watcher driving cache invalidation and regeneration

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use trellis_indexer::ModelFormat;
use trellis_site::{GenerationPipeline, RunReport};

/// Quiet period after an event before regenerating, so an editor's burst of
/// writes triggers one run.
const DEBOUNCE: Duration = Duration::from_millis(200);

/// Model source events emitted by the file watcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// Model file created
    Created(PathBuf),
    /// Model file modified
    Modified(PathBuf),
    /// Model file removed
    Removed(PathBuf),
}

impl WatchEvent {
    pub fn path(&self) -> &Path {
        match self {
            WatchEvent::Created(path) | WatchEvent::Modified(path) | WatchEvent::Removed(path) => {
                path
            }
        }
    }
}

/// File system watcher for model sources
pub struct FileWatcher {
    watcher: RecommendedWatcher,
    event_rx: mpsc::UnboundedReceiver<WatchEvent>,
    watched_paths: HashSet<PathBuf>,
}

impl FileWatcher {
    pub fn new() -> Result<Self> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            match res {
                Ok(event) => {
                    debug!("File system event: {:?}", event);
                    Self::handle_notify_event(event, &event_tx);
                }
                Err(e) => {
                    error!("File system watch error: {}", e);
                }
            }
        })?;

        Ok(Self {
            watcher,
            event_rx,
            watched_paths: HashSet::new(),
        })
    }

    /// Convert a notify event into model source events
    fn handle_notify_event(event: notify::Event, event_tx: &mpsc::UnboundedSender<WatchEvent>) {
        let make: fn(PathBuf) -> WatchEvent = match event.kind {
            notify::EventKind::Create(_) => WatchEvent::Created,
            notify::EventKind::Modify(_) => WatchEvent::Modified,
            notify::EventKind::Remove(_) => WatchEvent::Removed,
            _ => return,
        };
        for path in event.paths {
            if !is_model_source(&path) {
                continue;
            }
            if let Err(e) = event_tx.send(make(path)) {
                warn!("Failed to send watch event: {}", e);
            }
        }
    }

    /// Watch a directory recursively
    pub fn watch_directory(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        info!("Watching directory: {}", path.display());

        self.watcher.watch(path, RecursiveMode::Recursive)?;
        self.watched_paths.insert(path.to_path_buf());
        Ok(())
    }

    pub fn event_receiver(&mut self) -> &mut mpsc::UnboundedReceiver<WatchEvent> {
        &mut self.event_rx
    }

    pub fn is_watching(&self, path: &Path) -> bool {
        self.watched_paths.contains(path)
    }
}

/// Keeps a site's artifacts in step with its model sources
pub struct WatcherService {
    watcher: FileWatcher,
    pipeline: Arc<GenerationPipeline>,
}

impl WatcherService {
    pub fn new(pipeline: Arc<GenerationPipeline>) -> Result<Self> {
        Ok(Self {
            watcher: FileWatcher::new()?,
            pipeline,
        })
    }

    pub fn pipeline(&self) -> &Arc<GenerationPipeline> {
        &self.pipeline
    }

    /// Start watching the site source directory
    pub fn start_watching(&mut self) -> Result<()> {
        let root = self.pipeline.config().source.clone();
        self.watcher.watch_directory(&root)?;
        info!("Started watching site sources: {}", root.display());
        Ok(())
    }

    /// Apply one event to the model cache. Returns whether the site needs
    /// regenerating.
    pub fn handle_event(&self, event: &WatchEvent) -> bool {
        let path = event.path();
        if path.starts_with(&self.pipeline.config().destination) {
            return false;
        }
        let cache = self.pipeline.cache();
        match event {
            WatchEvent::Created(_) => {
                info!("Model source created: {}", path.display());
            }
            WatchEvent::Modified(_) => {
                info!("Model source modified: {}", path.display());
                cache.invalidate(path);
            }
            WatchEvent::Removed(_) => {
                info!("Model source removed: {}", path.display());
                cache.evict(path);
            }
        }
        true
    }

    /// Discover sources and run the pipeline on the blocking pool.
    pub async fn regenerate(&self) -> Result<RunReport> {
        let pipeline = Arc::clone(&self.pipeline);
        let report = tokio::task::spawn_blocking(move || -> Result<RunReport> {
            let sources = pipeline.discover()?;
            Ok(pipeline.run(&sources))
        })
        .await??;
        Ok(report)
    }

    /// Process file system events until the watcher shuts down
    pub async fn process_events(&mut self) -> Result<()> {
        loop {
            let Some(event) = self.watcher.event_receiver().recv().await else {
                info!("File watcher closed");
                return Ok(());
            };
            let mut dirty = self.handle_event(&event);

            // Collect the rest of the burst.
            while let Ok(Some(event)) =
                tokio::time::timeout(DEBOUNCE, self.watcher.event_receiver().recv()).await
            {
                dirty |= self.handle_event(&event);
            }

            if !dirty {
                continue;
            }
            match self.regenerate().await {
                Ok(report) => info!("Regenerated: {}", report.summary()),
                Err(e) => error!("Regeneration failed: {}", e),
            }
        }
    }
}

fn is_model_source(path: &Path) -> bool {
    let hidden = path.components().any(|c| {
        c.as_os_str()
            .to_str()
            .is_some_and(|name| name == ".git" || name.starts_with('_'))
    });
    !hidden && ModelFormat::from_path(path).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::SystemTime;
    use trellis_core::EntryStatus;
    use trellis_indexer::SiteConfig;
    use trellis_site::StaticFileRegistry;

    const MODEL: &str = r#"{
        "id": "m",
        "elements": [{"id": "a", "name": "A", "type": "ApplicationComponent"}],
        "diagrams": [{"id": "d1", "name": "A only", "elements": ["a"]}]
    }"#;

    fn service(root: &Path) -> WatcherService {
        let config = SiteConfig::default().resolved(root);
        let pipeline =
            GenerationPipeline::from_config(config, Arc::new(StaticFileRegistry::new())).unwrap();
        WatcherService::new(Arc::new(pipeline)).unwrap()
    }

    fn write_old(path: &Path, content: &str) {
        std::fs::write(path, content).unwrap();
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(SystemTime::now() - Duration::from_secs(3600))
            .unwrap();
    }

    #[test]
    fn only_model_sources_are_reported() {
        assert!(is_model_source(Path::new("/site/arch/shop.model.json")));
        assert!(is_model_source(Path::new("/site/shop.model.yml")));
        assert!(!is_model_source(Path::new("/site/arch/index.json")));
        assert!(!is_model_source(Path::new("/site/arch/svg/d1.svg")));
        assert!(!is_model_source(Path::new("/site/_site/shop.model.json")));
    }

    #[tokio::test]
    async fn regenerate_writes_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        write_old(&dir.path().join("a.model.json"), MODEL);
        let service = service(dir.path());

        let report = service.regenerate().await.unwrap();

        assert_eq!(report.writes(), 2);
        assert!(dir.path().join("index.json").exists());
        assert!(dir.path().join("svg/d1.svg").exists());
    }

    #[tokio::test]
    async fn modified_event_invalidates_and_removed_evicts() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.model.json");
        write_old(&source, MODEL);
        let service = service(dir.path());
        service.regenerate().await.unwrap();
        let descriptor = trellis_core::SourceDescriptor::from_path(&source).unwrap();
        assert_eq!(service.pipeline().cache().status(&descriptor), EntryStatus::Fresh);

        assert!(service.handle_event(&WatchEvent::Modified(source.clone())));
        assert_eq!(service.pipeline().cache().status(&descriptor), EntryStatus::Stale);

        let report = service.regenerate().await.unwrap();
        assert_eq!(report.writes(), 0);
        assert_eq!(service.pipeline().cache().load_count(), 2);

        assert!(service.handle_event(&WatchEvent::Removed(source.clone())));
        assert!(service.pipeline().cache().cached_paths().is_empty());
    }

    #[tokio::test]
    async fn events_match_sources_of_a_relative_root() {
        let dir = tempfile::Builder::new().prefix("site").tempdir_in(".").unwrap();
        let relative = dir.path();
        assert!(relative.is_relative());
        write_old(&relative.join("a.model.json"), MODEL);
        let service = service(relative);
        service.regenerate().await.unwrap();

        // notify reports absolute paths even for relative watch roots.
        let reported = std::env::current_dir().unwrap().join(relative).join("a.model.json");
        let descriptor = trellis_core::SourceDescriptor::from_path(&reported).unwrap();
        assert_eq!(service.pipeline().cache().status(&descriptor), EntryStatus::Fresh);

        assert!(service.handle_event(&WatchEvent::Modified(reported.clone())));
        assert_eq!(service.pipeline().cache().status(&descriptor), EntryStatus::Stale);

        assert!(service.handle_event(&WatchEvent::Removed(reported)));
        assert!(service.pipeline().cache().cached_paths().is_empty());
    }

    #[tokio::test]
    async fn destination_events_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());
        let inside = dir.path().join("_site/copy.model.json");
        assert!(!service.handle_event(&WatchEvent::Created(inside)));
    }

    #[tokio::test]
    async fn start_watching_registers_source_root() {
        let dir = tempfile::tempdir().unwrap();
        let mut service = service(dir.path());
        service.start_watching().unwrap();
        assert!(service.watcher.is_watching(dir.path()));
    }
}
