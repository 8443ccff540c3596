//! Site generation: conditional artifact writing, the generation pipeline,
//! and on-demand matrix and catalog data

pub mod catalog;
pub mod freshness;
pub mod layout;
pub mod matrix;
pub mod pipeline;
pub mod report;
pub mod writer;


pub use catalog::{Catalog, CatalogGroup};
pub use freshness::{Freshness, check_freshness};
pub use matrix::{InteractionMatrix, MatrixCell, MatrixOptions, Participant};
pub use pipeline::{GenerationPipeline, PipelineError};
pub use report::{Failure, RunReport};
pub use writer::{AssetRegistry, ConditionalWriter, StaticFileRegistry, WriteOutcome};
