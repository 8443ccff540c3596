//! Element catalog grouped by element type

use serde::Serialize;
use trellis_core::{Element, Model};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogGroup {
    pub element_type: String,
    pub elements: Vec<Element>,
}

/// Elements of the requested types, grouped in request order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Catalog {
    pub groups: Vec<CatalogGroup>,
}

impl Catalog {
    pub fn build<S: AsRef<str>>(model: &Model, element_types: &[S]) -> Self {
        let groups = element_types
            .iter()
            .map(|t| {
                let element_type = t.as_ref().trim();
                CatalogGroup {
                    element_type: element_type.to_string(),
                    elements: model
                        .elements
                        .iter()
                        .filter(|e| e.element_type == element_type)
                        .cloned()
                        .collect(),
                }
            })
            .collect();
        Catalog { groups }
    }

    /// Total number of catalogued elements.
    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.elements.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.groups.iter().flat_map(|g| g.elements.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::EntityId;

    fn element(id: &str, element_type: &str) -> Element {
        Element {
            id: EntityId::from(id),
            name: id.to_uppercase(),
            element_type: element_type.to_string(),
            documentation: String::new(),
            properties: Vec::new(),
        }
    }

    #[test]
    fn groups_follow_request_order() {
        let model = Model {
            id: EntityId::from("m"),
            elements: vec![
                element("p1", "Principle"),
                element("g1", "Goal"),
                element("p2", "Principle"),
            ],
            ..Model::default()
        };

        let catalog = Catalog::build(&model, &["Goal", " Principle", "Driver"]);

        let ids: Vec<&str> = catalog.elements().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["g1", "p1", "p2"]);
        assert_eq!(catalog.groups[1].element_type, "Principle");
        assert!(catalog.groups[2].elements.is_empty());
        assert_eq!(catalog.len(), 3);
    }
}
