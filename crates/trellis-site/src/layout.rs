//! Artifact layout next to each model source

use std::path::{Path, PathBuf};

use trellis_core::{Diagram, SourceDescriptor};

/// Navigable index document, one per source directory.
pub const INDEX_FILE: &str = "index.json";

/// Directory holding one rasterized image per diagram.
pub const SVG_DIR: &str = "svg";

/// Directory of a source relative to the site root. Sources outside the
/// root keep their absolute directory.
pub fn artifact_dir(site_root: &Path, source: &SourceDescriptor) -> PathBuf {
    let dir = source.dir();
    dir.strip_prefix(site_root).unwrap_or(dir).to_path_buf()
}

/// Get index document path
pub fn index_path(dir: &Path) -> PathBuf {
    dir.join(INDEX_FILE)
}

/// Get diagram image directory path
pub fn svg_dir(dir: &Path) -> PathBuf {
    dir.join(SVG_DIR)
}

/// Get the image path of one diagram
pub fn svg_path(dir: &Path, diagram: &Diagram) -> PathBuf {
    svg_dir(dir).join(diagram.svg_filename())
}

/// Remove the index document and image directory under `dir`. Returns how
/// many of the two existed.
pub fn remove_artifacts(dir: &Path) -> std::io::Result<usize> {
    let mut removed = 0;
    let index = index_path(dir);
    if index.exists() {
        std::fs::remove_file(&index)?;
        removed += 1;
    }
    let svg = svg_dir(dir);
    if svg.exists() {
        std::fs::remove_dir_all(&svg)?;
        removed += 1;
    }
    Ok(removed)
}
