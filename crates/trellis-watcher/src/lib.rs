//! Watch mode: regenerate the site when model sources change

pub mod watcher;

pub use watcher::{FileWatcher, WatchEvent, WatcherService};
