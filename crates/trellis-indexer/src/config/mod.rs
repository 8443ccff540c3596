//! Site configuration loaded from `trellis.toml`

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use trellis_core::model::SERVING_WEIGHT;

use crate::error::IndexerError;

/// Name of the configuration file looked up at the site root.
pub const CONFIG_FILE: &str = "trellis.toml";

/// Site generation settings.
///
/// Relative `source` and `destination` paths are resolved against the site
/// root by [`SiteConfig::load`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Directory searched for model sources.
    pub source: PathBuf,
    /// Generated site directory; never searched for sources.
    pub destination: PathBuf,
    /// Glob patterns, relative to `source`, selecting model files.
    pub patterns: Vec<String>,
    /// Glob patterns, relative to `source`, excluded from discovery.
    pub exclude: Vec<String>,
    /// Name of the diagram rasterizer.
    pub rasterizer: String,
    /// Weakest relationship followed when deriving interactions.
    pub min_weight: u32,
}

impl Default for SiteConfig {
    fn default() -> Self {
        SiteConfig {
            source: PathBuf::from("."),
            destination: PathBuf::from("_site"),
            patterns: vec![
                "**/*.model.json".to_string(),
                "**/*.model.yaml".to_string(),
                "**/*.model.yml".to_string(),
            ],
            exclude: Vec::new(),
            rasterizer: "svg".to_string(),
            min_weight: SERVING_WEIGHT,
        }
    }
}

impl SiteConfig {
    /// Load `trellis.toml` from the site root, falling back to defaults when
    /// the file does not exist.
    pub fn load(root: &Path) -> Result<Self, IndexerError> {
        let path = root.join(CONFIG_FILE);
        let config = match std::fs::read_to_string(&path) {
            Ok(content) => Self::from_toml(&path, &content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No {} in {}, using defaults", CONFIG_FILE, root.display());
                SiteConfig::default()
            }
            Err(source) => return Err(IndexerError::Io { path, source }),
        };
        Ok(config.resolved(root))
    }

    /// Parse configuration text; `path` is only used in error messages.
    pub fn from_toml(path: &Path, content: &str) -> Result<Self, IndexerError> {
        toml::from_str(content).map_err(|source| IndexerError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve relative directories against `root`, then against the
    /// working directory, so paths compare equal to the absolute paths
    /// filesystem events report.
    pub fn resolved(mut self, root: &Path) -> Self {
        self.source = resolve(root, &self.source);
        self.destination = resolve(root, &self.destination);
        self
    }
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    let joined = root.join(path);
    let absolute = std::path::absolute(&joined).unwrap_or_else(|e| {
        tracing::warn!("Cannot make {} absolute: {}", joined.display(), e);
        joined
    });
    // Collecting components drops interior `.` segments.
    absolute.components().collect()
}
