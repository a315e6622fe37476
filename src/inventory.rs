//! Inventory of the HVAC elements in a model.
//!
//! Unlike classification this lists every allow-listed element with its
//! metadata, placement and materials, and offers name search and per-type
//! statistics.

use regex::RegexBuilder;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

use crate::classify::{is_electronic, ElementView};
use crate::error::ClassifyError;
use crate::graph::{attr, ifc, ElementId, ModelGraph, RelationKind, Value};
use crate::rules::Rules;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    pub global_id: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialKind {
    Single,
    ListItem,
    Layer,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Material {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: MaterialKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thickness: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementInfo {
    pub element_id: ElementId,
    pub element_name: String,
    pub element_type: String,
    pub is_electronic: bool,
    pub properties: BTreeMap<String, Value>,
    pub metadata: Metadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub materials: Vec<Material>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TypeCount {
    pub total: usize,
    pub electronic: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub total_elements: usize,
    pub electronic_elements: usize,
    pub by_type: BTreeMap<String, TypeCount>,
}

impl Statistics {
    /// Share of electronic elements in percent, rounded to one decimal.
    #[must_use]
    pub fn electronic_percentage(&self) -> f64 {
        if self.total_elements == 0 {
            return 0.0;
        }
        let pct = self.electronic_elements as f64 / self.total_elements as f64 * 100.0;
        (pct * 10.0).round() / 10.0
    }
}

pub struct Inventory<'m, M: ModelGraph + ?Sized> {
    model: &'m M,
    rules: &'m Rules,
}

impl<'m, M: ModelGraph + ?Sized> Inventory<'m, M> {
    #[must_use]
    pub fn new(model: &'m M, rules: &'m Rules) -> Self {
        Self { model, rules }
    }

    /// All allow-listed elements, in allow-list then model order.
    ///
    /// Elements with malformed attributes are logged and left out.
    #[must_use]
    pub fn elements(&self) -> Vec<ElementInfo> {
        self.element_ids()
            .into_iter()
            .filter_map(|(id, ifc_type)| match self.element_info(id, ifc_type) {
                Ok(info) => Some(info),
                Err(err) => {
                    warn!(element = id, error = %err, "skipping element");
                    None
                }
            })
            .collect()
    }

    /// Details of one element, or `None` if it is unknown, not an HVAC type
    /// or has malformed attributes.
    #[must_use]
    pub fn element(&self, id: ElementId) -> Option<ElementInfo> {
        let hvac_type = self.rules.hvac_type(self.model.type_of(id)?)?;
        match self.element_info(id, hvac_type) {
            Ok(info) => Some(info),
            Err(err) => {
                warn!(element = id, error = %err, "skipping element");
                None
            }
        }
    }

    #[must_use]
    pub fn element_by_global_id(&self, global_id: &str) -> Option<ElementInfo> {
        let id = self
            .element_ids()
            .into_iter()
            .map(|(id, _)| id)
            .find(|&id| self.model.text(id, attr::GLOBAL_ID).as_deref() == Some(global_id))?;
        self.element(id)
    }

    #[must_use]
    pub fn electronic_elements(&self) -> Vec<ElementInfo> {
        self.elements()
            .into_iter()
            .filter(|e| e.is_electronic)
            .collect()
    }

    /// Elements whose name matches `pattern`, case-insensitively.
    pub fn search_by_name(&self, pattern: &str) -> Result<Vec<ElementInfo>, regex::Error> {
        let regex = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(self
            .elements()
            .into_iter()
            .filter(|e| {
                self.model
                    .text(e.element_id, attr::NAME)
                    .is_some_and(|name| regex.is_match(&name))
            })
            .collect())
    }

    #[must_use]
    pub fn statistics(&self) -> Statistics {
        let mut stats = Statistics::default();
        for info in self.elements() {
            let count = stats.by_type.entry(info.element_type).or_default();
            count.total += 1;
            stats.total_elements += 1;
            if info.is_electronic {
                count.electronic += 1;
                stats.electronic_elements += 1;
            }
        }
        stats
    }

    fn element_ids(&self) -> Vec<(ElementId, &'m str)> {
        let mut seen = BTreeSet::new();
        let mut ids = Vec::new();
        let rules = self.rules;
        for hvac_type in &rules.hvac_types {
            for id in self.model.elements_of_type(hvac_type) {
                if seen.insert(id) {
                    ids.push((id, hvac_type.as_str()));
                }
            }
        }
        ids
    }

    fn element_info(
        &self,
        id: ElementId,
        ifc_type: &str,
    ) -> Result<ElementInfo, ClassifyError> {
        let view = ElementView::read(self.model, self.rules, id)?;
        let is_electronic = is_electronic(&view, self.rules);
        Ok(ElementInfo {
            element_id: id,
            element_name: view
                .name
                .clone()
                .unwrap_or_else(|| format!("Element_{id}")),
            element_type: ifc_type.to_string(),
            is_electronic,
            metadata: Metadata {
                global_id: self.model.text(id, attr::GLOBAL_ID),
                description: view.description,
            },
            properties: view.properties,
            position: self.position(id),
            materials: self.materials(id),
        })
    }

    fn position(&self, id: ElementId) -> Option<Position> {
        let placement = self.model.attribute(id, attr::PLACEMENT)?;
        match placement.as_list()? {
            [x, y, z, ..] => Some(Position {
                x: x.as_f64()?,
                y: y.as_f64()?,
                z: z.as_f64()?,
            }),
            _ => None,
        }
    }

    fn materials(&self, id: ElementId) -> Vec<Material> {
        let model = self.model;
        let mut materials = Vec::new();

        for material in model.relationships(id, RelationKind::AssociatedMaterial) {
            if model.is_a(material, ifc::MATERIAL) {
                materials.push(Material {
                    name: model.text(material, attr::NAME),
                    kind: MaterialKind::Single,
                    thickness: None,
                });
            } else if model.is_a(material, ifc::MATERIAL_LIST) {
                for item in model.relationships(material, RelationKind::MaterialConstituents) {
                    materials.push(Material {
                        name: model.text(item, attr::NAME),
                        kind: MaterialKind::ListItem,
                        thickness: None,
                    });
                }
            } else if model.is_a(material, ifc::MATERIAL_LAYER_SET_USAGE)
                || model.is_a(material, ifc::MATERIAL_LAYER_SET)
            {
                for layer in model.relationships(material, RelationKind::MaterialConstituents) {
                    let Some(layer_material) = model
                        .relationships(layer, RelationKind::MaterialConstituents)
                        .into_iter()
                        .next()
                    else {
                        continue;
                    };
                    materials.push(Material {
                        name: model.text(layer_material, attr::NAME),
                        kind: MaterialKind::Layer,
                        thickness: model
                            .attribute(layer, attr::LAYER_THICKNESS)
                            .and_then(|v| v.as_f64()),
                    });
                }
            }
        }

        materials
    }
}
