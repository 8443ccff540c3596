//! Projection of a model into the acyclic index document
//!
//! Every cross-reference in a projected record is a bare id string, so the
//! document is a tree no matter how the model's entities point at each
//! other.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::model::{Diagram, Element, EntityId, Folder, Model, Property, Relationship};

/// One normalized entity or folder record.
pub type Record = Map<String, Value>;

/// The navigable index written next to each model source.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectedDocument {
    pub entities: Vec<Record>,
    pub folders: Vec<Record>,
}

impl ProjectedDocument {
    /// Compact JSON rendering used for `index.json`.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Project the model: the model root, then every element, relationship and
/// diagram, then the top-level folder.
pub fn project(model: &Model) -> ProjectedDocument {
    let mut entities = Vec::with_capacity(
        1 + model.elements.len() + model.relationships.len() + model.diagrams.len(),
    );

    entities.push(model_record(model));
    entities.extend(model.elements.iter().map(|e| element_record(model, e)));
    entities.extend(model.relationships.iter().map(|r| relationship_record(model, r)));
    entities.extend(model.diagrams.iter().map(diagram_record));

    ProjectedDocument {
        entities,
        folders: folder_records(model),
    }
}

/// Remove every field whose value is null, `false`, or an empty string,
/// array or object.
pub fn purge(record: &mut Record) {
    record.retain(|_, value| !is_empty_value(value));
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        Value::Bool(true) | Value::Number(_) => false,
    }
}

fn ids<'a>(ids: impl IntoIterator<Item = &'a EntityId>) -> Value {
    Value::Array(ids.into_iter().map(|id| Value::String(id.0.clone())).collect())
}

fn properties(properties: &[Property]) -> Value {
    Value::Array(
        properties
            .iter()
            .map(|p| json!({ "key": p.key, "value": p.value }))
            .collect(),
    )
}

fn base_record(id: &EntityId, name: &str, documentation: &str, props: &[Property]) -> Record {
    let mut record = Record::new();
    record.insert("id".into(), json!(id));
    record.insert("name".into(), json!(name));
    record.insert("documentation".into(), json!(documentation));
    record.insert("properties".into(), properties(props));
    record
}

fn finish(mut record: Record) -> Record {
    purge(&mut record);
    record
}

fn model_record(model: &Model) -> Record {
    let mut record = base_record(&model.id, &model.name, &model.documentation, &model.properties);
    record.insert("type".into(), json!("Model"));
    finish(record)
}

fn element_record(model: &Model, element: &Element) -> Record {
    let relationships = model
        .relationships
        .iter()
        .filter(|r| r.source == element.id || r.target == element.id)
        .map(|r| &r.id);
    let views = model
        .diagrams
        .iter()
        .filter(|d| d.element_ids.contains(&element.id))
        .map(|d| &d.id);

    let mut record = base_record(
        &element.id,
        &element.name,
        &element.documentation,
        &element.properties,
    );
    record.insert("type".into(), json!("Element"));
    record.insert("element_type".into(), json!(element.element_type));
    record.insert("relationships".into(), ids(relationships));
    record.insert("views".into(), ids(views));
    finish(record)
}

fn relationship_record(model: &Model, relationship: &Relationship) -> Record {
    let views = model
        .diagrams
        .iter()
        .filter(|d| d.relationship_ids.contains(&relationship.id))
        .map(|d| &d.id);

    let mut record = base_record(
        &relationship.id,
        &relationship.name,
        &relationship.documentation,
        &relationship.properties,
    );
    record.insert("type".into(), json!("Relationship"));
    record.insert("relationship_type".into(), json!(relationship.relationship_type));
    record.insert("source".into(), json!(relationship.source));
    record.insert("target".into(), json!(relationship.target));
    record.insert("views".into(), ids(views));
    record.insert("derived".into(), json!(relationship.derived));
    finish(record)
}

fn diagram_record(diagram: &Diagram) -> Record {
    let mut record = base_record(
        &diagram.id,
        &diagram.name,
        &diagram.documentation,
        &diagram.properties,
    );
    record.insert("type".into(), json!("Diagram"));
    record.insert("path".into(), json!(format!("svg/{}", diagram.svg_filename())));
    record.insert("viewpoint".into(), json!(diagram.viewpoint));
    record.insert("elements".into(), ids(&diagram.element_ids));
    record.insert("relationships".into(), ids(&diagram.relationship_ids));
    record.insert("views".into(), json!([]));
    finish(record)
}

/// Walk the folder hierarchy from the top-level folder with an explicit
/// stack. A folder is emitted at most once: a child already reached (cycle
/// or shared child) is dropped with a warning.
fn folder_records(model: &Model) -> Vec<Record> {
    let Some(root) = model.top_level_folder() else {
        return Vec::new();
    };

    let mut visited: HashSet<&EntityId> = HashSet::from([&root.id]);
    let mut preorder: Vec<(&Folder, Vec<&Folder>)> = Vec::new();
    let mut stack = vec![root];

    while let Some(folder) = stack.pop() {
        let mut children = Vec::with_capacity(folder.folder_ids.len());
        for child_id in &folder.folder_ids {
            match model.folder(child_id) {
                None => {
                    tracing::warn!("Folder {} references unknown folder {}", folder.id, child_id);
                }
                Some(child) if !visited.insert(&child.id) => {
                    tracing::warn!(
                        "Folder {} already placed in hierarchy; skipping repeat under {}",
                        child.id,
                        folder.id
                    );
                }
                Some(child) => children.push(child),
            }
        }
        stack.extend(children.iter().rev());
        preorder.push((folder, children));
    }

    // Children follow their parent in preorder, so walking it backwards
    // always finds a folder's child records already built.
    let mut built: HashMap<&EntityId, Record> = HashMap::new();
    for (folder, children) in preorder.into_iter().rev() {
        let child_records: Vec<Value> = children
            .iter()
            .filter_map(|child| built.remove(&child.id))
            .map(Value::Object)
            .collect();

        let mut record = Record::new();
        record.insert("id".into(), json!(folder.id));
        record.insert("name".into(), json!(folder.name));
        record.insert("folders".into(), Value::Array(child_records));
        record.insert("diagrams".into(), ids(&folder.item_ids));
        built.insert(&folder.id, finish(record));
    }

    built.remove(&root.id).into_iter().collect()
}
