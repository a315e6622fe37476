//! Read-only access to an IFC model as an element graph.
//!
//! The classifier never touches a file format directly. Everything it needs
//! goes through [`ModelGraph`]: enumerate elements by type, read an attribute,
//! follow a relationship edge. Attribute reads return `None` for anything
//! missing so callers can degrade instead of failing.

pub mod memory;

use serde::Serialize;
use std::fmt;

pub use memory::MemoryModel;

/// Identity of an element in the model (the STEP instance number).
pub type ElementId = u64;

/// Well-known attribute names.
pub mod attr {
    pub const GLOBAL_ID: &str = "GlobalId";
    pub const NAME: &str = "Name";
    pub const DESCRIPTION: &str = "Description";
    pub const ELEVATION: &str = "Elevation";
    /// Placement origin as a list of coordinates (x, y, z).
    pub const PLACEMENT: &str = "Placement";
    pub const NOMINAL_VALUE: &str = "NominalValue";
    pub const LAYER_THICKNESS: &str = "LayerThickness";
}

/// IFC entity names the resolver and extractors look for.
pub mod ifc {
    pub const BUILDING_STOREY: &str = "IfcBuildingStorey";
    pub const SPACE: &str = "IfcSpace";
    pub const REL_SPACE_BOUNDARY: &str = "IfcRelSpaceBoundary";
    pub const PROPERTY_SET: &str = "IfcPropertySet";
    pub const PROPERTY_SINGLE_VALUE: &str = "IfcPropertySingleValue";
    pub const MATERIAL: &str = "IfcMaterial";
    pub const MATERIAL_LIST: &str = "IfcMaterialList";
    pub const MATERIAL_LAYER: &str = "IfcMaterialLayer";
    pub const MATERIAL_LAYER_SET: &str = "IfcMaterialLayerSet";
    pub const MATERIAL_LAYER_SET_USAGE: &str = "IfcMaterialLayerSetUsage";
}

/// Outgoing edge kinds between elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RelationKind {
    /// Element → spatial structure it is contained in.
    ContainedInStructure,
    /// Part → the whole it decomposes (aggregation or nesting).
    Decomposes,
    /// Element → property definition (property set).
    DefinedBy,
    /// Property set → its properties.
    HasProperties,
    /// Element → element it is connected to.
    ConnectedTo,
    /// Element → material definition.
    AssociatedMaterial,
    /// Material list / layer set → its members.
    MaterialConstituents,
    /// Space boundary record → bounding space.
    RelatingSpace,
    /// Space boundary record → bounded element.
    RelatedBuildingElement,
}

/// Attribute value as read from the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Integer(i64),
    Real(f64),
    Boolean(bool),
    List(Vec<Value>),
}

impl Value {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view; integers widen to `f64`.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Real(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Short kind name used in diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Text(_) => "text",
            Value::Integer(_) => "integer",
            Value::Real(_) => "real",
            Value::Boolean(_) => "boolean",
            Value::List(_) => "list",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::Boolean(b) => f.write_str(if *b { "true" } else { "false" }),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Real(f)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

/// Read-only element graph.
///
/// Implementations must never panic on unknown ids or missing attributes:
/// lookups of anything that is not there return `None` or an empty list.
/// Type names compare case-insensitively (`IFCSPACE` is an `IfcSpace`).
pub trait ModelGraph {
    /// All elements whose type is exactly `ifc_type`, in a stable order.
    fn elements_of_type(&self, ifc_type: &str) -> Vec<ElementId>;

    /// Type name of an element, `None` if the id is unknown.
    fn type_of(&self, id: ElementId) -> Option<&str>;

    /// Attribute value, `None` if the element or attribute is absent.
    fn attribute(&self, id: ElementId, name: &str) -> Option<Value>;

    /// Targets of the outgoing edges of one kind, in a stable order.
    fn relationships(&self, id: ElementId, kind: RelationKind) -> Vec<ElementId>;

    fn is_a(&self, id: ElementId, ifc_type: &str) -> bool {
        self.type_of(id)
            .is_some_and(|t| t.eq_ignore_ascii_case(ifc_type))
    }

    /// Text attribute, `None` when absent or not text.
    fn text(&self, id: ElementId, name: &str) -> Option<String> {
        match self.attribute(id, name) {
            Some(Value::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// Z coordinate of the placement origin, when it has at least three coordinates.
    fn placement_z(&self, id: ElementId) -> Option<f64> {
        let placement = self.attribute(id, attr::PLACEMENT)?;
        placement.as_list()?.get(2)?.as_f64()
    }
}
