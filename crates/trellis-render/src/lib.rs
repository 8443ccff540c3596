//! Diagram rasterization
//!
//! Turning a diagram into image bytes is an external concern; this crate
//! defines the boundary and ships a plain SVG layout used by default.

pub mod svg;

use trellis_core::{BoxError, Diagram, Model};

pub use svg::SvgRasterizer;

/// Renders one diagram of a model to image bytes.
pub trait Rasterizer: Send + Sync {
    /// Short name used in configuration.
    fn name(&self) -> &'static str;

    fn rasterize(&self, model: &Model, diagram: &Diagram) -> Result<Vec<u8>, BoxError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("unknown rasterizer: {0}")]
    UnknownRasterizer(String),
}

/// Factory function to create rasterizers by configured name.
pub fn create_rasterizer(name: &str) -> Result<Box<dyn Rasterizer>, RenderError> {
    match name {
        "svg" => Ok(Box::new(SvgRasterizer::default())),
        _ => Err(RenderError::UnknownRasterizer(name.to_string())),
    }
}
