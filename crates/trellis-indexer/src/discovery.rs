//! Model source discovery under the site source root

use std::path::{Component, Path};

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use trellis_core::SourceDescriptor;

use crate::config::SiteConfig;
use crate::error::IndexerError;

fn build_globset(patterns: &[String]) -> Result<GlobSet, IndexerError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

/// Underscore-prefixed directories and files hold partials and are never
/// treated as sources.
fn is_private(relative: &Path) -> bool {
    relative.components().any(|c| match c {
        Component::Normal(name) => name.to_string_lossy().starts_with('_'),
        _ => false,
    })
}

/// Find every model source under `config.source`, sorted by path.
///
/// The destination directory, private `_` paths and `exclude` matches are
/// skipped; remaining files must match one of `patterns`.
pub fn discover_sources(config: &SiteConfig) -> Result<Vec<SourceDescriptor>, IndexerError> {
    let include = build_globset(&config.patterns)?;
    let exclude = build_globset(&config.exclude)?;
    let root = config.source.clone();
    let destination = config.destination.clone();

    let walker = WalkBuilder::new(&root)
        .filter_entry(move |entry| !entry.path().starts_with(&destination))
        .build();

    let mut sources = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(&root).unwrap_or(path);
        if is_private(relative) || exclude.is_match(relative) || !include.is_match(relative) {
            continue;
        }

        match SourceDescriptor::from_path(path) {
            Ok(descriptor) => sources.push(descriptor),
            Err(source) => {
                return Err(IndexerError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        }
    }

    sources.sort_by(|a, b| a.path.cmp(&b.path));
    tracing::info!("Discovered {} model sources in {}", sources.len(), root.display());
    Ok(sources)
}
