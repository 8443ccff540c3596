//! Trellis Core — Model types, cache, relationship closure, and index projection

pub mod cache;
pub mod closure;
pub mod error;
pub mod graph;
pub mod model;
pub mod projection;
pub mod source;


#[cfg(test)]
pub mod test_utils;

pub use cache::{EntryStatus, ModelCache, ModelParser};
pub use closure::{
    EdgePredicate, ElementTypeIs, MemberOf, MinWeight, Never, NodePredicate, RelationClosure,
    derive,
};
pub use error::{BoxError, GenerationError, Result};
pub use graph::ModelGraph;
pub use model::{
    Diagram, Element, EntityId, Folder, Model, ModelHandle, Property, Relationship,
    default_weight,
};
pub use projection::{ProjectedDocument, Record, project};
pub use source::SourceDescriptor;
