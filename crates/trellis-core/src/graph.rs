//! Graph view over a loaded model using petgraph::StableDiGraph

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};

use crate::model::{Element, EntityId, Model, Relationship};

/// Read-only directed multigraph of a model's elements and relationships.
///
/// Nodes and edges borrow from the model; the view is cheap to build and
/// safe to share between threads.
pub struct ModelGraph<'m> {
    model: &'m Model,
    inner: StableDiGraph<&'m Element, &'m Relationship>,
    index: HashMap<&'m EntityId, NodeIndex>,
}

impl std::fmt::Debug for ModelGraph<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelGraph")
            .field("model", &self.model.id)
            .field("node_count", &self.inner.node_count())
            .field("edge_count", &self.inner.edge_count())
            .finish()
    }
}

impl<'m> ModelGraph<'m> {
    /// Build the graph. Relationships whose endpoints are not elements
    /// (e.g. relationship-to-relationship links) are left out.
    pub fn from_model(model: &'m Model) -> Self {
        let mut inner = StableDiGraph::new();
        let mut index = HashMap::with_capacity(model.elements.len());

        for element in &model.elements {
            let idx = inner.add_node(element);
            index.insert(&element.id, idx);
        }

        for relationship in &model.relationships {
            match (index.get(&relationship.source), index.get(&relationship.target)) {
                (Some(&source), Some(&target)) => {
                    inner.add_edge(source, target, relationship);
                }
                _ => {
                    tracing::debug!(
                        "Skipping relationship {} with non-element endpoint",
                        relationship.id
                    );
                }
            }
        }

        ModelGraph {
            model,
            inner,
            index,
        }
    }

    /// Total number of elements.
    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    /// Total number of element-to-element relationships.
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Get an element by id.
    pub fn element(&self, id: &EntityId) -> Option<&'m Element> {
        self.index
            .get(id)
            .and_then(|&idx| self.inner.node_weight(idx))
            .copied()
    }

    /// Relationships leaving an element.
    pub fn outgoing<'a>(
        &'a self,
        id: &EntityId,
    ) -> impl Iterator<Item = &'m Relationship> + use<'a, 'm> {
        self.directed(id, Direction::Outgoing)
    }

    /// Relationships arriving at an element.
    pub fn incoming<'a>(
        &'a self,
        id: &EntityId,
    ) -> impl Iterator<Item = &'m Relationship> + use<'a, 'm> {
        self.directed(id, Direction::Incoming)
    }

    fn directed<'a>(
        &'a self,
        id: &EntityId,
        direction: Direction,
    ) -> impl Iterator<Item = &'m Relationship> + use<'a, 'm> {
        let start = self.index.get(id).copied();
        start.into_iter().flat_map(move |idx| {
            self.inner
                .edges_directed(idx, direction)
                .map(|edge_ref| *edge_ref.weight())
        })
    }

    /// Check if a relationship of the given type exists between two elements.
    pub fn has_relationship_between(
        &self,
        source: &EntityId,
        target: &EntityId,
        relationship_type: &str,
    ) -> bool {
        self.outgoing(source)
            .any(|r| &r.target == target && r.relationship_type == relationship_type)
    }

    /// Find an element by name (first match in model order).
    pub fn element_by_name(&self, name: &str) -> Option<&'m Element> {
        self.model.element_by_name(name)
    }

    /// All elements of a type tag, in model order.
    pub fn elements_of_type<'a>(
        &'a self,
        element_type: &'a str,
    ) -> impl Iterator<Item = &'m Element> + 'a {
        self.model
            .elements
            .iter()
            .filter(move |e| e.element_type == element_type)
    }
}
