//! YAML model reader

use std::path::Path;

use trellis_core::Model;

use super::FormatReader;
use crate::error::IndexerError;

pub struct YamlReader;

impl FormatReader for YamlReader {
    fn read(&self, path: &Path, content: &str) -> Result<Model, IndexerError> {
        serde_yaml::from_str(content).map_err(|source| IndexerError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }
}
