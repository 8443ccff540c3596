//! Application interaction matrix for a plateau

use std::collections::HashSet;

use serde::Serialize;
use trellis_core::closure::{ElementTypeIs, MemberOf, MinWeight, derive};
use trellis_core::model::SERVING_WEIGHT;
use trellis_core::{EntityId, GenerationError, Model, ModelGraph, Relationship, Result};

const APPLICATION_COMPONENT: &str = "ApplicationComponent";
const SERVING: &str = "ServingRelationship";
const GROUPING: [&str; 2] = ["CompositionRelationship", "AggregationRelationship"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixOptions {
    /// Weakest relationship followed when deriving interactions.
    pub min_weight: u32,
}

impl Default for MatrixOptions {
    fn default() -> Self {
        MatrixOptions {
            min_weight: SERVING_WEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Participant {
    pub id: EntityId,
    pub name: String,
}

/// Interactions from one caller to one callee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatrixCell {
    pub caller: EntityId,
    pub callee: EntityId,
    pub relationships: Vec<EntityId>,
    /// Every interaction in the cell is derived.
    pub derived: bool,
}

/// Which applications of a plateau serve which others, directly or through
/// intermediate elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InteractionMatrix {
    pub plateau: Participant,
    pub callers: Vec<Participant>,
    pub callees: Vec<Participant>,
    pub cells: Vec<MatrixCell>,
}

impl InteractionMatrix {
    /// Build the matrix for the plateau element named `plateau`.
    pub fn build(model: &Model, plateau: &str, options: &MatrixOptions) -> Result<Self> {
        let plateau = model
            .element_by_name(plateau)
            .ok_or_else(|| GenerationError::UnknownElement {
                name: plateau.to_string(),
            })?;
        let graph = ModelGraph::from_model(model);

        let mut apps: Vec<EntityId> = Vec::new();
        for relationship in graph.outgoing(&plateau.id) {
            if !GROUPING.contains(&relationship.relationship_type.as_str()) {
                continue;
            }
            let is_app = graph
                .element(&relationship.target)
                .is_some_and(|e| e.element_type == APPLICATION_COMPONENT);
            if is_app && !apps.contains(&relationship.target) {
                apps.push(relationship.target.clone());
            }
        }
        let app_set: HashSet<EntityId> = apps.iter().cloned().collect();

        let concrete = model.relationships.iter().filter(|r| {
            r.relationship_type == SERVING
                && app_set.contains(&r.source)
                && app_set.contains(&r.target)
        });
        let derived = derive(
            &graph,
            &apps,
            &MinWeight(options.min_weight),
            &MemberOf(app_set.clone()),
            &ElementTypeIs(APPLICATION_COMPONENT.to_string()),
        );
        let all: Vec<&Relationship> = concrete.chain(derived.iter()).collect();

        let callers = participants(model, all.iter().map(|r| &r.source));
        let callees = participants(model, all.iter().map(|r| &r.target));

        let mut cells = Vec::new();
        for caller in &callers {
            for callee in &callees {
                let rels: Vec<&&Relationship> = all
                    .iter()
                    .filter(|r| r.source == caller.id && r.target == callee.id)
                    .collect();
                if rels.is_empty() {
                    continue;
                }
                cells.push(MatrixCell {
                    caller: caller.id.clone(),
                    callee: callee.id.clone(),
                    relationships: rels.iter().map(|r| r.id.clone()).collect(),
                    derived: rels.iter().all(|r| r.derived),
                });
            }
        }

        tracing::debug!(
            "Interaction matrix for {}: {} applications, {} cells",
            plateau.name,
            apps.len(),
            cells.len()
        );

        Ok(InteractionMatrix {
            plateau: Participant {
                id: plateau.id.clone(),
                name: plateau.name.clone(),
            },
            callers,
            callees,
            cells,
        })
    }

    pub fn cell(&self, caller: &EntityId, callee: &EntityId) -> Option<&MatrixCell> {
        self.cells
            .iter()
            .find(|c| &c.caller == caller && &c.callee == callee)
    }
}

/// Distinct elements sorted by name, then id.
fn participants<'a>(model: &Model, ids: impl Iterator<Item = &'a EntityId>) -> Vec<Participant> {
    let mut seen = HashSet::new();
    let mut participants: Vec<Participant> = ids
        .filter(|id| seen.insert(*id))
        .filter_map(|id| model.element(id))
        .map(|e| Participant {
            id: e.id.clone(),
            name: e.name.clone(),
        })
        .collect();
    participants.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    participants
}
