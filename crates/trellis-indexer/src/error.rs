//! Errors raised while reading configuration and model files

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum IndexerError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no model reader for {0}")]
    UnsupportedFormat(PathBuf),

    #[error("invalid JSON model in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid YAML model in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid site configuration {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] globset::Error),

    #[error("failed to walk source tree: {0}")]
    Walk(#[from] ignore::Error),
}
