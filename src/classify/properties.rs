use std::collections::BTreeMap;

use crate::graph::{attr, ElementId, ModelGraph, RelationKind, Value};
use crate::rules::Rules;

/// Key prefix for the marker entry of a standard property set.
pub const PROPERTY_SET_MARKER: &str = "PropertySet_";

/// Collects the single-value properties attached to an element.
///
/// Every property with a name and a nominal value becomes `name → value`.
/// A property set whose name starts with a standard prefix (`Pset_`) also adds
/// `PropertySet_<set name> → true`, so callers can see which standard sets
/// were present without walking the graph again.
pub fn extract_properties<M: ModelGraph + ?Sized>(
    model: &M,
    rules: &Rules,
    element: ElementId,
) -> BTreeMap<String, Value> {
    let mut properties = BTreeMap::new();

    for definition in model.relationships(element, RelationKind::DefinedBy) {
        for property in model.relationships(definition, RelationKind::HasProperties) {
            let Some(name) = model.text(property, attr::NAME) else {
                continue;
            };
            if let Some(value) = model.attribute(property, attr::NOMINAL_VALUE) {
                properties.insert(name, value);
            }
        }

        if let Some(set_name) = model.text(definition, attr::NAME) {
            if rules.is_standard_property_set(&set_name) {
                properties.insert(format!("{PROPERTY_SET_MARKER}{set_name}"), Value::Boolean(true));
            }
        }
    }

    properties
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::MemoryModel;
    use pretty_assertions::assert_eq;

    #[test]
    fn collects_named_values_and_marks_standard_sets() {
        let mut m = MemoryModel::new();
        m.insert(1, "IfcValve")
            .relate(1, RelationKind::DefinedBy, 10)
            .relate(1, RelationKind::DefinedBy, 20);
        m.insert(10, "IfcPropertySet")
            .set_attribute(10, attr::NAME, "Pset_ValveTypeCommon")
            .relate(10, RelationKind::HasProperties, 11)
            .relate(10, RelationKind::HasProperties, 12)
            .relate(10, RelationKind::HasProperties, 13);
        m.insert(11, "IfcPropertySingleValue")
            .set_attribute(11, attr::NAME, "Size")
            .set_attribute(11, attr::NOMINAL_VALUE, 50_i64);
        // No nominal value: skipped.
        m.insert(12, "IfcPropertySingleValue")
            .set_attribute(12, attr::NAME, "Reference");
        // No name: skipped.
        m.insert(13, "IfcPropertySingleValue")
            .set_attribute(13, attr::NOMINAL_VALUE, "orphan");
        m.insert(20, "IfcPropertySet")
            .set_attribute(20, attr::NAME, "Hersteller")
            .relate(20, RelationKind::HasProperties, 21);
        m.insert(21, "IfcPropertySingleValue")
            .set_attribute(21, attr::NAME, "Antrieb")
            .set_attribute(21, attr::NOMINAL_VALUE, "Belimo LM24A");

        let properties = extract_properties(&m, &Rules::default(), 1);

        let expected: BTreeMap<String, Value> = [
            ("Antrieb".to_string(), Value::from("Belimo LM24A")),
            ("PropertySet_Pset_ValveTypeCommon".to_string(), Value::Boolean(true)),
            ("Size".to_string(), Value::Integer(50)),
        ]
        .into_iter()
        .collect();
        assert_eq!(properties, expected);
    }

    #[test]
    fn element_without_definitions_has_no_properties() {
        let mut m = MemoryModel::new();
        m.insert(1, "IfcPump");

        assert!(extract_properties(&m, &Rules::default(), 1).is_empty());
    }
}
