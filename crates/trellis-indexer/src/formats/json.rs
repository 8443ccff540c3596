//! JSON model reader

use std::path::Path;

use trellis_core::Model;

use super::FormatReader;
use crate::error::IndexerError;

pub struct JsonReader;

impl FormatReader for JsonReader {
    fn read(&self, path: &Path, content: &str) -> Result<Model, IndexerError> {
        serde_json::from_str(content).map_err(|source| IndexerError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}
