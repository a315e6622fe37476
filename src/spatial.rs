//! Storey and room lookup for elements.
//!
//! The resolver indexes all storeys and spaces once, then answers "where is
//! this element" from several kinds of evidence, strongest first:
//!
//! 1. spatial containment in a space
//! 2. decomposition under a space
//! 3. a space boundary naming the element
//!
//! Without a space it falls back to a storey found through containment or
//! decomposition (one hop of indirection), and finally to the storey whose
//! elevation is the highest one at or below the element's placement height.
//! Finding nothing is a normal outcome.

use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::graph::{attr, ifc, ElementId, ModelGraph, RelationKind};
use crate::model::{Location, Space, Storey};

/// Decomposition parents followed past the first structure when looking for a storey.
pub const MAX_DECOMPOSITION_HOPS: usize = 1;

pub struct SpatialResolver<'m, M: ModelGraph + ?Sized> {
    model: &'m M,
    storeys: BTreeMap<ElementId, Storey>,
    spaces: BTreeMap<ElementId, Space>,
    boundaries: HashMap<ElementId, ElementId>, // bounded element → first bounding space
}

impl<'m, M: ModelGraph + ?Sized> SpatialResolver<'m, M> {
    #[must_use]
    pub fn new(model: &'m M) -> Self {
        let storeys = extract_storeys(model);
        let spaces = extract_spaces(model);
        let boundaries = index_space_boundaries(model);
        debug!(
            storeys = storeys.len(),
            spaces = spaces.len(),
            boundaries = boundaries.len(),
            "spatial index built"
        );
        Self {
            model,
            storeys,
            spaces,
            boundaries,
        }
    }

    #[must_use]
    pub fn storeys(&self) -> &BTreeMap<ElementId, Storey> {
        &self.storeys
    }

    #[must_use]
    pub fn spaces(&self) -> &BTreeMap<ElementId, Space> {
        &self.spaces
    }

    /// Storey and space of an element, `None` if nothing points anywhere.
    #[must_use]
    pub fn resolve_location(&self, element: ElementId) -> Option<Location> {
        if let Some(space) = self.containing_space(element) {
            let storey = match space.storey_id {
                Some(storey_id) => Some(self.storeys.get(&storey_id).map_or_else(
                    || Storey {
                        id: storey_id,
                        name: format!("Geschoss {storey_id}"),
                        elevation: 0.0,
                    },
                    Clone::clone,
                )),
                None => self.containing_storey(element).cloned(),
            };
            let location = storey
                .as_ref()
                .map_or_else(Location::default, Location::in_storey)
                .with_space(space);
            debug!(element, space = space.id, storey = ?location.storey_id, "located in space");
            return Some(location);
        }

        let storey = self.containing_storey(element)?;
        debug!(element, storey = storey.id, "located on storey");
        Some(Location::in_storey(storey))
    }

    fn containing_space(&self, element: ElementId) -> Option<&Space> {
        let model = self.model;
        let space_id = model
            .relationships(element, RelationKind::ContainedInStructure)
            .into_iter()
            .find(|&target| model.is_a(target, ifc::SPACE))
            .or_else(|| {
                // Weaker than containment, but used the same way once matched.
                model
                    .relationships(element, RelationKind::Decomposes)
                    .into_iter()
                    .find(|&parent| model.is_a(parent, ifc::SPACE))
            })
            .or_else(|| self.boundaries.get(&element).copied())?;
        self.spaces.get(&space_id)
    }

    fn containing_storey(&self, element: ElementId) -> Option<&Storey> {
        let model = self.model;
        let related = model
            .relationships(element, RelationKind::ContainedInStructure)
            .into_iter()
            .chain(model.relationships(element, RelationKind::Decomposes));

        for start in related {
            if let Some(storey_id) = self.climb_to_storey(start) {
                return self.storeys.get(&storey_id);
            }
        }

        self.storey_below(model.placement_z(element)?)
    }

    // Walks decomposition parents from `start`, at most MAX_DECOMPOSITION_HOPS levels.
    fn climb_to_storey(&self, start: ElementId) -> Option<ElementId> {
        let mut level = vec![start];
        for hop in 0..=MAX_DECOMPOSITION_HOPS {
            if let Some(&storey) = level
                .iter()
                .find(|&&id| self.model.is_a(id, ifc::BUILDING_STOREY))
            {
                return Some(storey);
            }
            if hop == MAX_DECOMPOSITION_HOPS {
                break;
            }
            level = level
                .iter()
                .flat_map(|&id| self.model.relationships(id, RelationKind::Decomposes))
                .collect();
        }
        None
    }

    /// Highest storey whose elevation is at or below `z`; ties go to the smaller id.
    #[must_use]
    pub fn storey_below(&self, z: f64) -> Option<&Storey> {
        self.storeys
            .values()
            .filter(|s| s.elevation <= z)
            .fold(None, |best: Option<&Storey>, s| match best {
                Some(b) if b.elevation >= s.elevation => Some(b),
                _ => Some(s),
            })
    }
}

fn extract_storeys<M: ModelGraph + ?Sized>(model: &M) -> BTreeMap<ElementId, Storey> {
    model
        .elements_of_type(ifc::BUILDING_STOREY)
        .into_iter()
        .map(|id| {
            let name = model
                .text(id, attr::NAME)
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| format!("Geschoss {id}"));
            let elevation = model
                .attribute(id, attr::ELEVATION)
                .and_then(|v| v.as_f64())
                .unwrap_or(0.0);
            (
                id,
                Storey {
                    id,
                    name,
                    elevation,
                },
            )
        })
        .collect()
}

fn extract_spaces<M: ModelGraph + ?Sized>(model: &M) -> BTreeMap<ElementId, Space> {
    model
        .elements_of_type(ifc::SPACE)
        .into_iter()
        .map(|id| {
            let name = model
                .text(id, attr::NAME)
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| format!("Raum {id}"));
            let storey_id = model
                .relationships(id, RelationKind::Decomposes)
                .into_iter()
                .find(|&parent| model.is_a(parent, ifc::BUILDING_STOREY));
            (
                id,
                Space {
                    id,
                    name,
                    storey_id,
                },
            )
        })
        .collect()
}

// Boundary records are scanned once here instead of once per element.
fn index_space_boundaries<M: ModelGraph + ?Sized>(model: &M) -> HashMap<ElementId, ElementId> {
    let mut index = HashMap::new();
    for boundary in model.elements_of_type(ifc::REL_SPACE_BOUNDARY) {
        let Some(space) = model
            .relationships(boundary, RelationKind::RelatingSpace)
            .into_iter()
            .find(|&s| model.is_a(s, ifc::SPACE))
        else {
            continue;
        };
        for element in model.relationships(boundary, RelationKind::RelatedBuildingElement) {
            index.entry(element).or_insert(space);
        }
    }
    index
}
