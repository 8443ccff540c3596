//! Error taxonomy shared by the generation crates

use std::path::PathBuf;

/// Error type produced by the external parse and render collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failures surfaced by cache, writer and pipeline operations.
///
/// None of these abort a generation run: a failed source skips only its own
/// artifacts and a failed artifact skips only itself.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// No model could be resolved for a request.
    #[error("no model source available: {reason}")]
    SourceUnavailable { reason: String },

    /// The parser rejected the source file.
    #[error("failed to load model {path}: {source}")]
    SourceLoadFailure {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    /// An I/O error while checking or writing an artifact.
    #[error("failed to persist {path}: {source}")]
    PersistenceFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The rendering collaborator failed for an artifact.
    #[error("failed to render {artifact}: {source}")]
    ArtifactRenderFailure {
        artifact: String,
        #[source]
        source: BoxError,
    },

    /// A request named an element the model does not contain.
    #[error("no element named {name:?} in model")]
    UnknownElement { name: String },
}

impl GenerationError {
    pub fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GenerationError::PersistenceFailure {
            path: path.into(),
            source,
        }
    }

    /// Short machine-readable name of the failure class.
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::SourceUnavailable { .. } => "source_unavailable",
            GenerationError::SourceLoadFailure { .. } => "source_load_failure",
            GenerationError::PersistenceFailure { .. } => "persistence_failure",
            GenerationError::ArtifactRenderFailure { .. } => "artifact_render_failure",
            GenerationError::UnknownElement { .. } => "unknown_element",
        }
    }
}

pub type Result<T, E = GenerationError> = std::result::Result<T, E>;
