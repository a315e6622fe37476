use std::collections::HashMap;

use super::{ElementId, ModelGraph, RelationKind, Value};

#[derive(Debug, Clone, Default)]
struct Node {
    ifc_type: String,
    attributes: HashMap<String, Value>,
    relations: HashMap<RelationKind, Vec<ElementId>>,
}

/// In-memory element graph.
///
/// Elements keep their insertion order per type, so enumeration is stable
/// across runs. Edges may point at ids that were never inserted; such targets
/// simply have no type.
#[derive(Debug, Clone, Default)]
pub struct MemoryModel {
    nodes: HashMap<ElementId, Node>,
    by_type: HashMap<String, Vec<ElementId>>, // uppercase type → ids
}

impl MemoryModel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an element, or retypes an existing one (keeping its attributes and edges).
    pub fn insert(&mut self, id: ElementId, ifc_type: impl Into<String>) -> &mut Self {
        let ifc_type = ifc_type.into();
        let key = ifc_type.to_ascii_uppercase();

        let node = self.nodes.entry(id).or_default();
        if !node.ifc_type.is_empty() {
            let old_key = node.ifc_type.to_ascii_uppercase();
            if let Some(ids) = self.by_type.get_mut(&old_key) {
                ids.retain(|&other| other != id);
            }
        }
        node.ifc_type = ifc_type;
        self.by_type.entry(key).or_default().push(id);
        self
    }

    /// Sets an attribute on an inserted element; ignored for unknown ids.
    pub fn set_attribute(
        &mut self,
        id: ElementId,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> &mut Self {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.attributes.insert(name.into(), value.into());
        }
        self
    }

    /// Adds an edge `from --kind--> to`. The source must be inserted, the target need not be.
    pub fn relate(&mut self, from: ElementId, kind: RelationKind, to: ElementId) -> &mut Self {
        if let Some(node) = self.nodes.get_mut(&from) {
            node.relations.entry(kind).or_default().push(to);
        }
        self
    }

    #[must_use]
    pub fn contains(&self, id: ElementId) -> bool {
        self.nodes.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl ModelGraph for MemoryModel {
    fn elements_of_type(&self, ifc_type: &str) -> Vec<ElementId> {
        self.by_type
            .get(&ifc_type.to_ascii_uppercase())
            .cloned()
            .unwrap_or_default()
    }

    fn type_of(&self, id: ElementId) -> Option<&str> {
        self.nodes
            .get(&id)
            .map(|n| n.ifc_type.as_str())
            .filter(|t| !t.is_empty())
    }

    fn attribute(&self, id: ElementId, name: &str) -> Option<Value> {
        self.nodes.get(&id)?.attributes.get(name).cloned()
    }

    fn relationships(&self, id: ElementId, kind: RelationKind) -> Vec<ElementId> {
        self.nodes
            .get(&id)
            .and_then(|n| n.relations.get(&kind))
            .cloned()
            .unwrap_or_default()
    }
}
