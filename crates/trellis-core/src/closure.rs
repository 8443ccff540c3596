//! Derived relationships by transitive closure over accepted edges

use std::collections::{HashSet, VecDeque};

use rayon::prelude::*;

use crate::graph::ModelGraph;
use crate::model::{Element, EntityId, Relationship};

/// Decides whether a relationship may be walked.
pub trait EdgePredicate: Sync {
    fn accepts(&self, relationship: &Relationship) -> bool;
}

impl<F> EdgePredicate for F
where
    F: Fn(&Relationship) -> bool + Sync,
{
    fn accepts(&self, relationship: &Relationship) -> bool {
        self(relationship)
    }
}

/// Decides whether an element is a target, or a stop, of the walk.
pub trait NodePredicate: Sync {
    fn matches(&self, element: &Element) -> bool;
}

impl<F> NodePredicate for F
where
    F: Fn(&Element) -> bool + Sync,
{
    fn matches(&self, element: &Element) -> bool {
        self(element)
    }
}

/// Accepts relationships at least as strong as the given weight.
#[derive(Debug, Clone, Copy)]
pub struct MinWeight(pub u32);

impl EdgePredicate for MinWeight {
    fn accepts(&self, relationship: &Relationship) -> bool {
        relationship.weight() >= self.0
    }
}

/// Matches elements of one type tag.
#[derive(Debug, Clone)]
pub struct ElementTypeIs(pub String);

impl NodePredicate for ElementTypeIs {
    fn matches(&self, element: &Element) -> bool {
        element.element_type == self.0
    }
}

/// Matches elements whose id is in the set.
#[derive(Debug, Clone, Default)]
pub struct MemberOf(pub HashSet<EntityId>);

impl NodePredicate for MemberOf {
    fn matches(&self, element: &Element) -> bool {
        self.0.contains(&element.id)
    }
}

/// Matches nothing: the walk never stops early.
#[derive(Debug, Clone, Copy)]
pub struct Never;

impl NodePredicate for Never {
    fn matches(&self, _element: &Element) -> bool {
        false
    }
}

/// Weakest link seen so far on a path: (weight, relationship type).
type Link<'m> = (u32, &'m str);

fn weaker<'m>(current: Option<Link<'m>>, relationship: &'m Relationship) -> Link<'m> {
    let next = (relationship.weight(), relationship.relationship_type.as_str());
    match current {
        Some(link) if link.0 <= next.0 => link,
        _ => next,
    }
}

/// Transitive relationship derivation over a model graph.
///
/// Holds no mutable state; one instance can serve concurrent callers.
#[derive(Debug, Clone, Copy)]
pub struct RelationClosure<'g, 'm> {
    graph: &'g ModelGraph<'m>,
}

impl<'g, 'm> RelationClosure<'g, 'm> {
    pub fn new(graph: &'g ModelGraph<'m>) -> Self {
        RelationClosure { graph }
    }

    /// Derive relationships from every frontier element to the targets it
    /// reaches through accepted relationships.
    ///
    /// Each emitted relationship runs from the original frontier element to
    /// the target, is marked `derived`, and takes the type and weight of the
    /// weakest link on the path that first reached the target. Results are
    /// grouped by frontier element in frontier order.
    pub fn derive<A, T, S>(
        &self,
        frontier: &[EntityId],
        accept_edge: &A,
        is_target: &T,
        is_stop: &S,
    ) -> Vec<Relationship>
    where
        A: EdgePredicate + ?Sized,
        T: NodePredicate + ?Sized,
        S: NodePredicate + ?Sized,
    {
        let mut seen = HashSet::new();
        let origins: Vec<&EntityId> = frontier.iter().filter(|id| seen.insert(*id)).collect();

        origins
            .par_iter()
            .map(|origin| self.derive_from(origin, accept_edge, is_target, is_stop))
            .collect::<Vec<_>>()
            .into_iter()
            .flatten()
            .collect()
    }

    fn derive_from<A, T, S>(
        &self,
        origin: &EntityId,
        accept_edge: &A,
        is_target: &T,
        is_stop: &S,
    ) -> Vec<Relationship>
    where
        A: EdgePredicate + ?Sized,
        T: NodePredicate + ?Sized,
        S: NodePredicate + ?Sized,
    {
        let Some(start) = self.graph.element(origin) else {
            tracing::debug!("Frontier element {} is not in the graph", origin);
            return Vec::new();
        };

        let mut derived = Vec::new();
        let mut emitted: HashSet<&'m EntityId> = HashSet::new();
        let mut visited: HashSet<&'m EntityId> = HashSet::from([&start.id]);
        let mut queue: VecDeque<(&'m EntityId, Option<Link<'m>>)> =
            VecDeque::from([(&start.id, None)]);

        while let Some((current, link)) = queue.pop_front() {
            for relationship in self.graph.outgoing(current) {
                if !accept_edge.accepts(relationship) {
                    continue;
                }
                let Some(dest) = self.graph.element(&relationship.target) else {
                    continue;
                };
                let path_link = weaker(link, relationship);

                if dest.id != start.id && is_target.matches(dest) && emitted.insert(&dest.id) {
                    derived.push(derived_relationship(start, dest, path_link));
                }

                if is_stop.matches(dest) {
                    continue;
                }
                if visited.insert(&dest.id) {
                    queue.push_back((&dest.id, Some(path_link)));
                }
            }
        }

        derived
    }
}

fn derived_relationship(source: &Element, target: &Element, link: Link<'_>) -> Relationship {
    Relationship {
        id: EntityId(format!("{}-{}-derived", source.id, target.id)),
        name: String::new(),
        relationship_type: link.1.to_string(),
        source: source.id.clone(),
        target: target.id.clone(),
        weight: Some(link.0),
        derived: true,
        documentation: String::new(),
        properties: Vec::new(),
    }
}

/// Convenience wrapper around [`RelationClosure::derive`].
pub fn derive<A, T, S>(
    graph: &ModelGraph<'_>,
    frontier: &[EntityId],
    accept_edge: &A,
    is_target: &T,
    is_stop: &S,
) -> Vec<Relationship>
where
    A: EdgePredicate + ?Sized,
    T: NodePredicate + ?Sized,
    S: NodePredicate + ?Sized,
{
    RelationClosure::new(graph).derive(frontier, accept_edge, is_target, is_stop)
}
