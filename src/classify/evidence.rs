//! Evidence that an element is electronically controlled.
//!
//! Each source of evidence is an independent predicate over an [`ElementView`].
//! They are tried in order, cheapest first, and the first hit decides. Adding a
//! new kind of evidence means adding a predicate to [`EVIDENCE`].

use std::collections::BTreeMap;

use super::properties::extract_properties;
use crate::error::ClassifyError;
use crate::graph::{attr, ElementId, ModelGraph, RelationKind, Value};
use crate::rules::Rules;

/// Everything the predicates look at, read from the model once.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementView {
    pub id: ElementId,
    pub ifc_type: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub properties: BTreeMap<String, Value>,
    /// Types of the elements this one is connected to.
    pub connected_types: Vec<String>,
}

impl ElementView {
    pub fn read<M: ModelGraph + ?Sized>(
        model: &M,
        rules: &Rules,
        id: ElementId,
    ) -> Result<Self, ClassifyError> {
        let ifc_type = model
            .type_of(id)
            .ok_or(ClassifyError::DanglingElement { id })?
            .to_string();

        let connected_types = model
            .relationships(id, RelationKind::ConnectedTo)
            .into_iter()
            .filter_map(|other| model.type_of(other).map(str::to_string))
            .collect();

        Ok(Self {
            id,
            ifc_type,
            name: text_attribute(model, id, attr::NAME)?,
            description: text_attribute(model, id, attr::DESCRIPTION)?,
            properties: extract_properties(model, rules, id),
            connected_types,
        })
    }
}

// Absent and empty both read as None; any non-text value is a data fault.
fn text_attribute<M: ModelGraph + ?Sized>(
    model: &M,
    id: ElementId,
    attribute: &'static str,
) -> Result<Option<String>, ClassifyError> {
    match model.attribute(id, attribute) {
        None => Ok(None),
        Some(Value::Text(s)) if s.is_empty() => Ok(None),
        Some(Value::Text(s)) => Ok(Some(s)),
        Some(other) => Err(ClassifyError::MalformedAttribute {
            id,
            attribute,
            found: other.kind().to_string(),
        }),
    }
}

pub type Evidence = fn(&ElementView, &Rules) -> bool;

/// Evidence sources in evaluation order.
pub const EVIDENCE: &[(&str, Evidence)] = &[
    ("electronic type", electronic_type),
    ("name keyword", name_keyword),
    ("description keyword", description_keyword),
    ("property name keyword", property_name_keyword),
    ("property value keyword", property_value_keyword),
    ("connected electronic element", connected_electronic),
];

/// Name of the first evidence source that matches, if any.
#[must_use]
pub fn electronic_evidence(view: &ElementView, rules: &Rules) -> Option<&'static str> {
    EVIDENCE
        .iter()
        .find(|(_, matches)| matches(view, rules))
        .map(|(name, _)| *name)
}

#[must_use]
pub fn is_electronic(view: &ElementView, rules: &Rules) -> bool {
    electronic_evidence(view, rules).is_some()
}

fn electronic_type(view: &ElementView, rules: &Rules) -> bool {
    rules.is_electronic_type(&view.ifc_type)
}

fn name_keyword(view: &ElementView, rules: &Rules) -> bool {
    view.name.as_deref().is_some_and(|n| rules.mentions_keyword(n))
}

fn description_keyword(view: &ElementView, rules: &Rules) -> bool {
    view.description
        .as_deref()
        .is_some_and(|d| rules.mentions_keyword(d))
}

fn property_name_keyword(view: &ElementView, rules: &Rules) -> bool {
    view.properties.keys().any(|k| rules.mentions_keyword(k))
}

fn property_value_keyword(view: &ElementView, rules: &Rules) -> bool {
    view.properties
        .values()
        .filter_map(Value::as_text)
        .any(|v| rules.mentions_keyword(v))
}

fn connected_electronic(view: &ElementView, rules: &Rules) -> bool {
    view.connected_types
        .iter()
        .any(|t| rules.is_electronic_type(t))
}
