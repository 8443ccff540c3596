//! Test fixtures for Trellis core

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{TimeZone, Utc};

use crate::cache::ModelParser;
use crate::error::BoxError;
use crate::model::*;
use crate::source::SourceDescriptor;

pub fn element(id: &str, name: &str, element_type: &str) -> Element {
    Element {
        id: EntityId::from(id),
        name: name.to_string(),
        element_type: element_type.to_string(),
        documentation: String::new(),
        properties: Vec::new(),
    }
}

pub fn relationship(id: &str, relationship_type: &str, source: &str, target: &str) -> Relationship {
    Relationship {
        id: EntityId::from(id),
        name: String::new(),
        relationship_type: relationship_type.to_string(),
        source: EntityId::from(source),
        target: EntityId::from(target),
        weight: None,
        derived: false,
        documentation: String::new(),
        properties: Vec::new(),
    }
}

pub fn diagram(id: &str, elements: &[&str], relationships: &[&str]) -> Diagram {
    Diagram {
        id: EntityId::from(id),
        name: format!("View {id}"),
        viewpoint: None,
        element_ids: elements.iter().map(|e| EntityId::from(*e)).collect(),
        relationship_ids: relationships.iter().map(|r| EntityId::from(*r)).collect(),
        documentation: String::new(),
        properties: Vec::new(),
    }
}

pub fn folder(id: &str, name: &str, folders: &[&str], items: &[&str]) -> Folder {
    Folder {
        id: EntityId::from(id),
        name: name.to_string(),
        folder_ids: folders.iter().map(|f| EntityId::from(*f)).collect(),
        item_ids: items.iter().map(|i| EntityId::from(*i)).collect(),
    }
}

pub fn model_with(elements: Vec<Element>, relationships: Vec<Relationship>) -> Model {
    Model {
        id: EntityId::from("model"),
        name: "Test Model".to_string(),
        elements,
        relationships,
        ..Model::default()
    }
}

pub fn descriptor_at(path: &str, secs: i64) -> SourceDescriptor {
    SourceDescriptor::new(path, Utc.timestamp_opt(secs, 0).unwrap())
}

/// Parser double that counts invocations and can be slowed or made to fail.
#[derive(Debug, Default)]
pub struct CountingParser {
    calls: AtomicUsize,
    delay: Duration,
    succeed_times: Option<usize>,
}

impl CountingParser {
    pub fn with_delay(delay: Duration) -> Self {
        CountingParser {
            delay,
            ..Self::default()
        }
    }

    /// Succeeds for the first `n` calls, fails afterwards.
    pub fn failing_after(n: usize) -> Self {
        CountingParser {
            succeed_times: Some(n),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ModelParser for CountingParser {
    fn parse(&self, path: &Path) -> Result<Model, BoxError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        if self.succeed_times.is_some_and(|n| call > n) {
            return Err(format!("cannot parse {}", path.display()).into());
        }
        Ok(Model {
            id: EntityId::from("model"),
            name: format!("generation {call}"),
            ..Model::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counting_parser_counts_and_fails() {
        let parser = CountingParser::failing_after(1);
        assert!(parser.parse(Path::new("a.model.json")).is_ok());
        assert!(parser.parse(Path::new("a.model.json")).is_err());
        assert_eq!(parser.calls(), 2);
    }
}
