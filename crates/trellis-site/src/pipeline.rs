//! Generation pipeline: load models, then write each source's artifacts

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use rayon::prelude::*;
use trellis_core::{
    GenerationError, ModelCache, ModelHandle, ModelParser, Result, SourceDescriptor, project,
};
use trellis_indexer::{IndexerError, ModelReader, SiteConfig, discover_sources};
use trellis_render::{Rasterizer, RenderError, create_rasterizer};

use crate::catalog::Catalog;
use crate::layout;
use crate::matrix::{InteractionMatrix, MatrixOptions};
use crate::report::RunReport;
use crate::writer::{AssetRegistry, ConditionalWriter, WriteOutcome};

/// Errors assembling a pipeline from configuration.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Index(#[from] IndexerError),
}

/// Owns the model cache for a site and lends it to every artifact.
pub struct GenerationPipeline {
    config: SiteConfig,
    cache: ModelCache,
    rasterizer: Box<dyn Rasterizer>,
    writer: ConditionalWriter,
}

impl std::fmt::Debug for GenerationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationPipeline")
            .field("source", &self.config.source)
            .field("rasterizer", &self.rasterizer.name())
            .field("cache", &self.cache)
            .finish()
    }
}

impl GenerationPipeline {
    /// Build a pipeline reading model files from disk with the configured
    /// rasterizer.
    pub fn from_config(
        config: SiteConfig,
        registry: Arc<dyn AssetRegistry>,
    ) -> std::result::Result<Self, PipelineError> {
        let rasterizer = create_rasterizer(&config.rasterizer)?;
        Ok(Self::with_parts(config, Arc::new(ModelReader), rasterizer, registry))
    }

    pub fn with_parts(
        config: SiteConfig,
        parser: Arc<dyn ModelParser>,
        rasterizer: Box<dyn Rasterizer>,
        registry: Arc<dyn AssetRegistry>,
    ) -> Self {
        let writer = ConditionalWriter::new(config.source.clone(), registry);
        GenerationPipeline {
            config,
            cache: ModelCache::new(parser),
            rasterizer,
            writer,
        }
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn cache(&self) -> &ModelCache {
        &self.cache
    }

    /// Discover the sources configured for this site.
    pub fn discover(&self) -> std::result::Result<Vec<SourceDescriptor>, IndexerError> {
        discover_sources(&self.config)
    }

    /// Generate the index document and diagram images of every source.
    ///
    /// Distinct sources are loaded in parallel first. A source that fails
    /// to load skips only its own artifacts; an artifact that fails to
    /// render or persist skips only itself.
    pub fn run(&self, sources: &[SourceDescriptor]) -> RunReport {
        let mut seen = HashSet::new();
        let distinct: Vec<&SourceDescriptor> =
            sources.iter().filter(|s| seen.insert(&s.path)).collect();

        tracing::info!("Pre-loading {} model sources", distinct.len());
        let loaded: Vec<Result<ModelHandle>> = distinct
            .par_iter()
            .map(|source| self.cache.model(source))
            .collect();

        let mut report = RunReport {
            sources: distinct.len(),
            ..RunReport::default()
        };
        for (source, loaded) in distinct.into_iter().zip(loaded) {
            match loaded {
                Ok(model) => self.generate(source, &model, &mut report),
                Err(e) => {
                    tracing::error!("Skipping {}: {}", source.path.display(), e);
                    report.fail(source.path.clone(), None, &e);
                }
            }
        }

        tracing::info!("{}", report.summary());
        report
    }

    fn generate(&self, source: &SourceDescriptor, model: &ModelHandle, report: &mut RunReport) {
        let dir = layout::artifact_dir(self.writer.root(), source);
        let timestamp = source.timestamp();

        let index = layout::index_path(&dir);
        let outcome = project(model)
            .to_json()
            .map_err(|e| GenerationError::ArtifactRenderFailure {
                artifact: index.display().to_string(),
                source: Box::new(e),
            })
            .and_then(|json| self.writer.write_text(&index, timestamp, &json));
        settle(source, index, outcome, report);

        for diagram in &model.diagrams {
            let svg = layout::svg_path(&dir, diagram);
            let outcome = self.writer.write_binary(&svg, timestamp, || {
                self.rasterizer.rasterize(model, diagram).map_err(|source| {
                    GenerationError::ArtifactRenderFailure {
                        artifact: diagram.id.to_string(),
                        source,
                    }
                })
            });
            settle(source, svg, outcome, report);
        }
    }

    pub fn matrix_options(&self) -> MatrixOptions {
        MatrixOptions {
            min_weight: self.config.min_weight,
        }
    }

    /// Interaction matrix of a plateau in the given source, or in the
    /// default source when none is given.
    pub fn interaction_matrix(
        &self,
        source: Option<&SourceDescriptor>,
        plateau: &str,
        options: &MatrixOptions,
    ) -> Result<InteractionMatrix> {
        let model = self.cache.get(source)?;
        InteractionMatrix::build(&model, plateau, options)
    }

    /// Catalog of the given element types in the given (or default) source.
    pub fn catalog<S: AsRef<str>>(
        &self,
        source: Option<&SourceDescriptor>,
        element_types: &[S],
    ) -> Result<Catalog> {
        let model = self.cache.get(source)?;
        Ok(Catalog::build(&model, element_types))
    }

    /// Remove generated artifacts next to each source. Returns the number
    /// of index documents and image directories removed.
    pub fn clean(&self, sources: &[SourceDescriptor]) -> Result<usize> {
        let mut dirs: Vec<PathBuf> = sources.iter().map(|s| s.dir().to_path_buf()).collect();
        dirs.sort();
        dirs.dedup();

        let mut removed = 0;
        for dir in dirs {
            removed += layout::remove_artifacts(&dir)
                .map_err(|e| GenerationError::persistence(&dir, e))?;
        }
        tracing::info!("Removed {} generated artifacts", removed);
        Ok(removed)
    }
}

fn settle(
    source: &SourceDescriptor,
    artifact: PathBuf,
    outcome: Result<WriteOutcome>,
    report: &mut RunReport,
) {
    match outcome {
        Ok(outcome) => report.record(outcome),
        Err(e) => {
            tracing::warn!("Skipping {}: {}", artifact.display(), e);
            report.fail(source.path.clone(), Some(artifact), &e);
        }
    }
}
