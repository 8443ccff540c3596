//! Model source discovery, file format readers, and site configuration

pub mod config;
pub mod discovery;
pub mod error;
pub mod formats;


pub use config::{CONFIG_FILE, SiteConfig};
pub use discovery::discover_sources;
pub use error::IndexerError;
pub use formats::{FormatReader, ModelFormat, ModelReader, get_reader};
