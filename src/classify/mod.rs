//! HVAC element classification.
//!
//! For each allow-listed element the [`Classifier`] decides whether it is
//! electronically controlled, collects its properties, resolves its location
//! and derives a BAS code. A batch run returns a sorted flat list plus the
//! storey/space hierarchy of the same results.

pub mod evidence;
pub mod properties;

use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use crate::bas::{self, CodeParts, Standard};
use crate::error::ClassifyError;
use crate::graph::{ElementId, ModelGraph};
use crate::model::{ClassificationResult, ClassificationRun, Diagnostic, Hierarchy, Location};
use crate::rules::Rules;
use crate::spatial::SpatialResolver;

pub use evidence::{electronic_evidence, is_electronic, ElementView};
pub use properties::extract_properties;

/// Classifies the elements of one model.
///
/// Builds its own spatial index on construction; create one per model.
pub struct Classifier<'m, M: ModelGraph + ?Sized> {
    model: &'m M,
    rules: &'m Rules,
    resolver: SpatialResolver<'m, M>,
}

impl<'m, M: ModelGraph + ?Sized> Classifier<'m, M> {
    #[must_use]
    pub fn new(model: &'m M, rules: &'m Rules) -> Self {
        Self {
            model,
            rules,
            resolver: SpatialResolver::new(model),
        }
    }

    #[must_use]
    pub fn resolver(&self) -> &SpatialResolver<'m, M> {
        &self.resolver
    }

    /// Classifies one element.
    ///
    /// Returns `Ok(None)` when the element's type is not an HVAC type, or when
    /// `electronic_only` is set and the element is not electronically controlled.
    pub fn classify(
        &self,
        element: ElementId,
        standard: Standard,
        electronic_only: bool,
    ) -> Result<Option<ClassificationResult>, ClassifyError> {
        let ifc_type = self
            .model
            .type_of(element)
            .ok_or(ClassifyError::DanglingElement { id: element })?;
        let Some(hvac_type) = self.rules.hvac_type(ifc_type) else {
            return Ok(None);
        };

        let view = ElementView::read(self.model, self.rules, element)?;
        let evidence = electronic_evidence(&view, self.rules);
        if electronic_only && evidence.is_none() {
            return Ok(None);
        }
        if let Some(source) = evidence {
            debug!(element, evidence = source, "electronically controlled");
        }

        let location = self.resolver.resolve_location(element);
        let bas_code = self.bas_code(&view, hvac_type, location.as_ref(), standard);

        Ok(Some(ClassificationResult {
            element_id: element,
            element_name: view
                .name
                .clone()
                .unwrap_or_else(|| format!("Element_{element}")),
            element_type: hvac_type.to_string(),
            is_electronic: evidence.is_some(),
            location,
            bas_code,
            standard,
            properties: view.properties,
        }))
    }

    /// Classifies every allow-listed element of the model.
    ///
    /// Elements that fail are skipped and reported in `diagnostics`; they never
    /// abort the run. Output order does not depend on the model's enumeration order.
    #[must_use]
    pub fn classify_all(&self, standard: Standard, electronic_only: bool) -> ClassificationRun {
        let mut seen = BTreeSet::new();
        let mut results = Vec::new();
        let mut diagnostics = Vec::new();

        for hvac_type in &self.rules.hvac_types {
            for element in self.model.elements_of_type(hvac_type) {
                if !seen.insert(element) {
                    continue;
                }
                match self.classify(element, standard, electronic_only) {
                    Ok(Some(result)) => results.push(result),
                    Ok(None) => {}
                    Err(err) => {
                        warn!(element, error = %err, "skipping element");
                        diagnostics.push(Diagnostic {
                            element_id: element,
                            message: err.to_string(),
                        });
                    }
                }
            }
        }

        results.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

        let mut hierarchy = Hierarchy::new();
        for result in &results {
            hierarchy.add(result);
        }

        info!(
            %standard,
            electronic_only,
            classified = results.len(),
            skipped = diagnostics.len(),
            "classification finished"
        );

        ClassificationRun {
            flat_results: results,
            hierarchy,
            diagnostics,
        }
    }

    fn bas_code(
        &self,
        view: &ElementView,
        hvac_type: &str,
        location: Option<&Location>,
        standard: Standard,
    ) -> String {
        let parts = CodeParts::new(
            self.rules.trade_code(hvac_type),
            &bas::installation_index(view.name.as_deref(), view.id),
            &bas::location_code(location.and_then(|l| l.storey_name.as_deref())),
            &bas::location_code(location.and_then(|l| l.space_name.as_deref())),
        );
        bas::generate(standard, &parts)
    }
}
