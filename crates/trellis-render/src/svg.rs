//! Grid-layout SVG rasterizer

use std::collections::HashMap;
use std::fmt::Write;

use trellis_core::{BoxError, Diagram, EntityId, Model};

use crate::Rasterizer;

/// Lays the diagram's elements out on a square grid and connects related
/// elements with straight lines.
#[derive(Debug, Clone)]
pub struct SvgRasterizer {
    pub box_width: u32,
    pub box_height: u32,
    pub gap: u32,
}

impl Default for SvgRasterizer {
    fn default() -> Self {
        SvgRasterizer {
            box_width: 160,
            box_height: 60,
            gap: 40,
        }
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn columns(count: usize) -> usize {
    let mut cols = 0;
    while cols * cols < count {
        cols += 1;
    }
    cols
}

impl SvgRasterizer {
    fn cell_origin(&self, slot: usize, cols: usize) -> (u32, u32) {
        let col = (slot % cols) as u32;
        let row = (slot / cols) as u32;
        (
            self.gap + col * (self.box_width + self.gap),
            self.gap + row * (self.box_height + self.gap),
        )
    }

    /// Render to an SVG document string.
    pub fn render(&self, model: &Model, diagram: &Diagram) -> String {
        let elements: Vec<_> = diagram
            .element_ids
            .iter()
            .filter_map(|id| {
                let element = model.element(id);
                if element.is_none() {
                    tracing::debug!("Diagram {} shows unknown element {}", diagram.id, id);
                }
                element
            })
            .collect();

        let cols = columns(elements.len()).max(1);
        let rows = elements.len().div_ceil(cols) as u32;
        let width = self.gap + cols as u32 * (self.box_width + self.gap);
        let height = self.gap + rows * (self.box_height + self.gap);

        let mut centers: HashMap<&EntityId, (u32, u32)> = HashMap::new();
        let mut boxes = String::new();
        for (slot, element) in elements.iter().enumerate() {
            let (x, y) = self.cell_origin(slot, cols);
            centers.insert(&element.id, (x + self.box_width / 2, y + self.box_height / 2));
            let _ = write!(
                boxes,
                "<g class=\"element {kind}\" id=\"{id}\"><rect x=\"{x}\" y=\"{y}\" width=\"{w}\" height=\"{h}\"/>\
                 <text x=\"{tx}\" y=\"{ty}\" text-anchor=\"middle\">{name}</text></g>",
                kind = escape(&element.element_type),
                id = escape(element.id.as_str()),
                w = self.box_width,
                h = self.box_height,
                tx = x + self.box_width / 2,
                ty = y + self.box_height / 2,
                name = escape(&element.name),
            );
        }

        let mut lines = String::new();
        for relationship in diagram
            .relationship_ids
            .iter()
            .filter_map(|id| model.relationship(id))
        {
            let (Some(&(x1, y1)), Some(&(x2, y2))) = (
                centers.get(&relationship.source),
                centers.get(&relationship.target),
            ) else {
                continue;
            };
            let _ = write!(
                lines,
                "<line class=\"relationship {kind}\" id=\"{id}\" x1=\"{x1}\" y1=\"{y1}\" x2=\"{x2}\" y2=\"{y2}\"/>",
                kind = escape(&relationship.relationship_type),
                id = escape(relationship.id.as_str()),
            );
        }

        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" \
             viewBox=\"0 0 {width} {height}\"><title>{title}</title>{lines}{boxes}</svg>\n",
            title = escape(&diagram.name),
        )
    }
}

impl Rasterizer for SvgRasterizer {
    fn name(&self) -> &'static str {
        "svg"
    }

    fn rasterize(&self, model: &Model, diagram: &Diagram) -> Result<Vec<u8>, BoxError> {
        Ok(self.render(model, diagram).into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::{Element, Relationship};

    fn element(id: &str, name: &str) -> Element {
        Element {
            id: EntityId::from(id),
            name: name.to_string(),
            element_type: "ApplicationComponent".to_string(),
            documentation: String::new(),
            properties: Vec::new(),
        }
    }

    fn sample() -> (Model, Diagram) {
        let model = Model {
            id: EntityId::from("m"),
            elements: vec![element("a", "Orders & Billing"), element("b", "<Ledger>")],
            relationships: vec![Relationship {
                id: EntityId::from("r"),
                name: String::new(),
                relationship_type: "ServingRelationship".to_string(),
                source: EntityId::from("a"),
                target: EntityId::from("b"),
                weight: None,
                derived: false,
                documentation: String::new(),
                properties: Vec::new(),
            }],
            ..Model::default()
        };
        let diagram = Diagram {
            id: EntityId::from("d"),
            name: "Overview".to_string(),
            viewpoint: None,
            element_ids: vec![EntityId::from("a"), EntityId::from("b"), EntityId::from("x")],
            relationship_ids: vec![EntityId::from("r")],
            documentation: String::new(),
            properties: Vec::new(),
        };
        (model, diagram)
    }

    #[test]
    fn grid_is_square_enough() {
        assert_eq!(columns(0), 0);
        assert_eq!(columns(1), 1);
        assert_eq!(columns(2), 2);
        assert_eq!(columns(4), 2);
        assert_eq!(columns(5), 3);
    }

    #[test]
    fn renders_boxes_lines_and_escapes_names() {
        let (model, diagram) = sample();
        let svg = SvgRasterizer::default().render(&model, &diagram);

        assert!(svg.starts_with("<svg "));
        assert!(svg.contains("<title>Overview</title>"));
        assert!(svg.contains("Orders &amp; Billing"));
        assert!(svg.contains("&lt;Ledger&gt;"));
        assert_eq!(svg.matches("<rect ").count(), 2);
        assert_eq!(svg.matches("<line ").count(), 1);
        assert!(svg.contains("x1=\"120\" y1=\"70\" x2=\"320\" y2=\"70\""));
    }

    #[test]
    fn output_is_deterministic() {
        let (model, diagram) = sample();
        let rasterizer = SvgRasterizer::default();
        assert_eq!(
            rasterizer.rasterize(&model, &diagram).unwrap(),
            rasterizer.rasterize(&model, &diagram).unwrap()
        );
    }

    #[test]
    fn empty_diagram_still_renders() {
        let (model, mut diagram) = sample();
        diagram.element_ids.clear();
        let svg = SvgRasterizer::default().render(&model, &diagram);
        assert!(svg.contains("width=\"240\" height=\"40\""));
    }
}
