use serde::Serialize;
use std::collections::BTreeMap;

use super::ClassificationResult;
use crate::graph::ElementId;

/// Storey key for results without any location.
pub const UNKNOWN_STOREY: &str = "Unbekanntes Geschoss";

/// Leaf entry of the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElementSummary {
    pub id: ElementId,
    pub name: String,
    pub element_type: String,
    pub bas_code: String,
    pub is_electronic: bool,
}

impl From<&ClassificationResult> for ElementSummary {
    fn from(result: &ClassificationResult) -> Self {
        Self {
            id: result.element_id,
            name: result.element_name.clone(),
            element_type: result.element_type.clone(),
            bas_code: result.bas_code.clone(),
            is_electronic: result.is_electronic,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpaceNode {
    pub id: Option<ElementId>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub elements: BTreeMap<ElementId, ElementSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreyNode {
    pub id: Option<ElementId>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub spaces: BTreeMap<String, SpaceNode>,
    /// Elements on this storey that are not inside a known space.
    pub elements: BTreeMap<ElementId, ElementSummary>,
}

impl StoreyNode {
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.elements.len() + self.spaces.values().map(|s| s.elements.len()).sum::<usize>()
    }
}

/// Results grouped by storey name, then space name.
///
/// Grouping is by display name, not id: two storeys both called "EG" end up in
/// one node. When names collide the node keeps the smallest id seen, so the
/// tree does not depend on the order results were added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Hierarchy {
    pub storeys: BTreeMap<String, StoreyNode>,
}

impl Hierarchy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, result: &ClassificationResult) {
        let location = result.location.as_ref();
        let storey_name = location
            .and_then(|l| l.storey_name.clone())
            .unwrap_or_else(|| UNKNOWN_STOREY.to_string());
        let storey_id = location.and_then(|l| l.storey_id);

        let storey = self
            .storeys
            .entry(storey_name.clone())
            .or_insert_with(|| StoreyNode {
                id: None,
                name: storey_name,
                kind: "storey",
                spaces: BTreeMap::new(),
                elements: BTreeMap::new(),
            });
        keep_smaller(&mut storey.id, storey_id);

        let summary = ElementSummary::from(result);
        match location.and_then(|l| l.space_name.clone()) {
            Some(space_name) => {
                let space = storey
                    .spaces
                    .entry(space_name.clone())
                    .or_insert_with(|| SpaceNode {
                        id: None,
                        name: space_name,
                        kind: "space",
                        elements: BTreeMap::new(),
                    });
                keep_smaller(&mut space.id, location.and_then(|l| l.space_id));
                space.elements.insert(summary.id, summary);
            }
            None => {
                storey.elements.insert(summary.id, summary);
            }
        }
    }

    #[must_use]
    pub fn get(&self, storey_name: &str) -> Option<&StoreyNode> {
        self.storeys.get(storey_name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.storeys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.storeys.is_empty()
    }

    #[must_use]
    pub fn element_count(&self) -> usize {
        self.storeys.values().map(StoreyNode::element_count).sum()
    }
}

fn keep_smaller(slot: &mut Option<ElementId>, candidate: Option<ElementId>) {
    *slot = match (*slot, candidate) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    };
}
