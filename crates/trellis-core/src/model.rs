//! Core data structures for the architecture model

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Identifier of any model entity (element, relationship, diagram, folder).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        EntityId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        EntityId(id.to_string())
    }
}

/// Shared, read-only reference to a loaded model.
pub type ModelHandle = Arc<Model>;

/// A key/value property attached to an entity. Order is significant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

// ── Relationship weights ────────────────────────────────
//
// Derivation strength, weakest first. A derived relationship is only as
// strong as the weakest link on its path.

pub const ASSOCIATION_WEIGHT: u32 = 0;
pub const INFLUENCE_WEIGHT: u32 = 1;
pub const ACCESS_WEIGHT: u32 = 2;
pub const SERVING_WEIGHT: u32 = 3;
pub const REALIZATION_WEIGHT: u32 = 4;
pub const ASSIGNMENT_WEIGHT: u32 = 5;
pub const AGGREGATION_WEIGHT: u32 = 6;
pub const COMPOSITION_WEIGHT: u32 = 7;

/// Default weight for a relationship type tag such as `"ServingRelationship"`.
pub fn default_weight(relationship_type: &str) -> u32 {
    let kind = relationship_type
        .strip_suffix("Relationship")
        .unwrap_or(relationship_type);
    match kind {
        "Association" => ASSOCIATION_WEIGHT,
        "Influence" | "Flow" | "Triggering" | "Specialization" | "Specialisation" => {
            INFLUENCE_WEIGHT
        }
        "Access" => ACCESS_WEIGHT,
        "Serving" | "UsedBy" => SERVING_WEIGHT,
        "Realization" | "Realisation" => REALIZATION_WEIGHT,
        "Assignment" => ASSIGNMENT_WEIGHT,
        "Aggregation" => AGGREGATION_WEIGHT,
        "Composition" => COMPOSITION_WEIGHT,
        _ => ASSOCIATION_WEIGHT,
    }
}

/// A typed node in the model (e.g. an application component).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub element_type: String,
    #[serde(default)]
    pub documentation: String,
    #[serde(default)]
    pub properties: Vec<Property>,
}

/// A typed, weighted, directed edge between two elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub relationship_type: String,
    pub source: EntityId,
    pub target: EntityId,
    /// Explicit weight; falls back to [`default_weight`] for the type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
    /// Synthesized by the relation closure rather than read from the source.
    #[serde(default)]
    pub derived: bool,
    #[serde(default)]
    pub documentation: String,
    #[serde(default)]
    pub properties: Vec<Property>,
}

impl Relationship {
    pub fn weight(&self) -> u32 {
        self.weight
            .unwrap_or_else(|| default_weight(&self.relationship_type))
    }
}

/// A named view over a subset of elements and relationships.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagram {
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewpoint: Option<String>,
    #[serde(default, rename = "elements")]
    pub element_ids: Vec<EntityId>,
    #[serde(default, rename = "relationships")]
    pub relationship_ids: Vec<EntityId>,
    #[serde(default)]
    pub documentation: String,
    #[serde(default)]
    pub properties: Vec<Property>,
}

impl Diagram {
    /// Output file name of the rasterized diagram.
    pub fn svg_filename(&self) -> String {
        format!("{}.svg", self.id)
    }
}

/// An organizational folder. Children are referenced by id, so the
/// hierarchy described by a source file is not guaranteed to be acyclic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "folders")]
    pub folder_ids: Vec<EntityId>,
    #[serde(default, rename = "items")]
    pub item_ids: Vec<EntityId>,
}

/// The full in-memory graph parsed from one source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Model {
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub documentation: String,
    #[serde(default)]
    pub properties: Vec<Property>,
    #[serde(default)]
    pub elements: Vec<Element>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub diagrams: Vec<Diagram>,
    /// Every folder of the organizational hierarchy.
    #[serde(default)]
    pub folders: Vec<Folder>,
    /// Top-level folders in document order.
    #[serde(default)]
    pub root_folders: Vec<EntityId>,
}

impl Model {
    pub fn element(&self, id: &EntityId) -> Option<&Element> {
        self.elements.iter().find(|e| &e.id == id)
    }

    pub fn relationship(&self, id: &EntityId) -> Option<&Relationship> {
        self.relationships.iter().find(|r| &r.id == id)
    }

    pub fn folder(&self, id: &EntityId) -> Option<&Folder> {
        self.folders.iter().find(|f| &f.id == id)
    }

    /// First element with the given name.
    pub fn element_by_name(&self, name: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.name == name)
    }

    /// The folder the navigator opens on: the last top-level folder.
    ///
    /// When the source lists no top-level folders, the roots are the folders
    /// no other folder claims as a child.
    pub fn top_level_folder(&self) -> Option<&Folder> {
        if let Some(id) = self.root_folders.last() {
            return self.folder(id);
        }
        let children: HashSet<&EntityId> = self
            .folders
            .iter()
            .flat_map(|f| f.folder_ids.iter())
            .collect();
        self.folders
            .iter()
            .rev()
            .find(|f| !children.contains(&f.id))
    }
}
