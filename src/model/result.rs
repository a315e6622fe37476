use serde::Serialize;
use std::collections::BTreeMap;

use super::{Hierarchy, Location};
use crate::bas::{self, Standard};
use crate::graph::{ElementId, Value};

/// Classification of one HVAC element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub element_id: ElementId,
    pub element_name: String,
    pub element_type: String,
    pub is_electronic: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    pub bas_code: String,
    pub standard: Standard,
    pub properties: BTreeMap<String, Value>,
}

impl ClassificationResult {
    /// Ordering used for the flat result list: storey, space, element name, id.
    #[must_use]
    pub fn sort_key(&self) -> (&str, &str, &str, ElementId) {
        let (storey, space) = self
            .location
            .as_ref()
            .map_or(("", ""), |l| (l.storey_name_or_empty(), l.space_name_or_empty()));
        (storey, space, &self.element_name, self.element_id)
    }
}

/// An element skipped during a batch run, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub element_id: ElementId,
    pub message: String,
}

/// Output of a batch classification.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClassificationRun {
    pub flat_results: Vec<ClassificationResult>,
    pub hierarchy: Hierarchy,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl ClassificationRun {
    #[must_use]
    pub fn electronic_count(&self) -> usize {
        self.flat_results.iter().filter(|r| r.is_electronic).count()
    }
}

/// Answer of the code conversion entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conversion {
    pub original_code: String,
    pub converted_code: String,
    pub from_standard: Standard,
    pub to_standard: Standard,
}

impl Conversion {
    #[must_use]
    pub fn new(code: &str, from: Standard, to: Standard) -> Self {
        Self {
            original_code: code.to_string(),
            converted_code: bas::convert(code, from, to),
            from_standard: from,
            to_standard: to,
        }
    }
}
