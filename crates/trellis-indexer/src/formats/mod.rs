//! Model file readers, selected by file name

pub mod json;
pub mod yaml;

use std::path::Path;

use trellis_core::{BoxError, Model, ModelParser};

use crate::error::IndexerError;

/// Serialization formats a model source can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    Json,
    Yaml,
}

impl ModelFormat {
    /// Determine the format from a `*.model.<ext>` file name.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let (stem, ext) = name.rsplit_once('.')?;
        if !stem.ends_with(".model") {
            return None;
        }
        match ext {
            "json" => Some(ModelFormat::Json),
            "yaml" | "yml" => Some(ModelFormat::Yaml),
            _ => None,
        }
    }
}

/// Decodes one serialization format into a model.
pub trait FormatReader: Send + Sync {
    fn read(&self, path: &Path, content: &str) -> Result<Model, IndexerError>;
}

/// Get the reader for a model file based on its name.
pub fn get_reader(path: &Path) -> Option<Box<dyn FormatReader>> {
    match ModelFormat::from_path(path)? {
        ModelFormat::Json => Some(Box::new(json::JsonReader)),
        ModelFormat::Yaml => Some(Box::new(yaml::YamlReader)),
    }
}

/// Parse boundary used by the model cache: reads the file and dispatches on
/// its name.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelReader;

impl ModelReader {
    pub fn read_path(&self, path: &Path) -> Result<Model, IndexerError> {
        let reader =
            get_reader(path).ok_or_else(|| IndexerError::UnsupportedFormat(path.to_path_buf()))?;
        let content = std::fs::read_to_string(path).map_err(|source| IndexerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let model = reader.read(path, &content)?;
        tracing::debug!(
            "Read model {} ({} elements, {} relationships, {} diagrams) from {}",
            model.id,
            model.elements.len(),
            model.relationships.len(),
            model.diagrams.len(),
            path.display()
        );
        Ok(model)
    }
}

impl ModelParser for ModelReader {
    fn parse(&self, path: &Path) -> Result<Model, BoxError> {
        Ok(self.read_path(path)?)
    }
}
