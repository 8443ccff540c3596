//! CLI command implementations

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use trellis_core::SourceDescriptor;
use trellis_indexer::SiteConfig;
use trellis_site::{GenerationPipeline, MatrixOptions, StaticFileRegistry};
use trellis_watcher::WatcherService;

fn pipeline(root: &Path) -> anyhow::Result<GenerationPipeline> {
    let config = SiteConfig::load(root)?;
    tracing::debug!("Site configuration: {:?}", config);
    Ok(GenerationPipeline::from_config(
        config,
        Arc::new(StaticFileRegistry::new()),
    )?)
}

/// The named source, or the first discovered one.
fn resolve_source(
    pipeline: &GenerationPipeline,
    source: Option<PathBuf>,
) -> anyhow::Result<SourceDescriptor> {
    match source {
        Some(path) => SourceDescriptor::from_path(&path)
            .with_context(|| format!("cannot read model source {}", path.display())),
        None => pipeline
            .discover()?
            .into_iter()
            .next()
            .context("no model sources found"),
    }
}

pub fn generate(root: PathBuf, json: bool) -> anyhow::Result<()> {
    tracing::info!("Generating site artifacts in {}", root.display());

    let pipeline = pipeline(&root)?;
    let sources = pipeline.discover()?;
    let report = pipeline.run(&sources);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.summary());
    }

    if !report.is_success() {
        anyhow::bail!("{} generation failures", report.failures.len());
    }
    Ok(())
}

pub async fn watch(root: PathBuf) -> anyhow::Result<()> {
    tracing::info!("Watching {}", root.display());

    let pipeline = Arc::new(pipeline(&root)?);
    let mut service = WatcherService::new(pipeline)?;

    let report = service.regenerate().await?;
    tracing::info!("Initial generation: {}", report.summary());

    service.start_watching()?;
    service.process_events().await
}

pub fn matrix(
    root: PathBuf,
    source: Option<PathBuf>,
    plateau: &str,
    min_weight: Option<u32>,
) -> anyhow::Result<()> {
    let pipeline = pipeline(&root)?;
    let source = resolve_source(&pipeline, source)?;
    let options = MatrixOptions {
        min_weight: min_weight.unwrap_or(pipeline.config().min_weight),
    };

    let matrix = pipeline.interaction_matrix(Some(&source), plateau, &options)?;
    println!("{}", serde_json::to_string_pretty(&matrix)?);
    Ok(())
}

pub fn catalog(root: PathBuf, source: Option<PathBuf>, types: &[String]) -> anyhow::Result<()> {
    if types.is_empty() {
        anyhow::bail!("at least one element type is required");
    }
    let pipeline = pipeline(&root)?;
    let source = resolve_source(&pipeline, source)?;

    let catalog = pipeline.catalog(Some(&source), types)?;
    println!("{}", serde_json::to_string_pretty(&catalog)?);
    Ok(())
}

pub fn clean(root: PathBuf) -> anyhow::Result<()> {
    tracing::info!("Cleaning generated artifacts in {}", root.display());

    let pipeline = pipeline(&root)?;
    let sources = pipeline.discover()?;
    let removed = pipeline.clean(&sources)?;

    tracing::info!("Removed {} artifacts", removed);
    Ok(())
}
