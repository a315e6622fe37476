//! Classification tables.
//!
//! A [`Rules`] value is built once, either from the built-in defaults or from
//! a JSON override file, and handed by reference to the components that read
//! it. Nothing here is mutated after construction.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use crate::error::RulesError;

/// Trade code for types without a mapping.
pub const UNKNOWN_TRADE: &str = "XXX";

// (type, trade). Generic IFC2x3 families first, then their IFC4 subtypes.
const HVAC_TYPES: &[(&str, &str)] = &[
    // Regelung
    ("IfcFlowController", "REG"),
    ("IfcValve", "REG"),
    ("IfcDamper", "REG"),
    ("IfcFlowMeter", "REG"),
    ("IfcAirTerminalBox", "REG"),
    ("IfcSensor", "REG"),
    ("IfcActuator", "REG"),
    ("IfcController", "REG"),
    ("IfcUnitaryControlElement", "REG"),
    // Lueftung
    ("IfcFlowMovingDevice", "LTA"),
    ("IfcFan", "LTA"),
    ("IfcPump", "LTA"),
    ("IfcCompressor", "LTA"),
    ("IfcFlowTerminal", "LTA"),
    ("IfcAirTerminal", "LTA"),
    // Heizung
    ("IfcEnergyConversionDevice", "HEI"),
    ("IfcBoiler", "HEI"),
    ("IfcChiller", "HEI"),
    ("IfcCoolingTower", "HEI"),
    ("IfcHeatExchanger", "HEI"),
    ("IfcHumidifier", "HEI"),
    ("IfcUnitaryEquipment", "HEI"),
    // Sanitaer
    ("IfcFlowFitting", "SAN"),
    ("IfcDuctFitting", "SAN"),
    ("IfcPipeFitting", "SAN"),
    // Klima
    ("IfcFlowSegment", "KLI"),
    ("IfcDuctSegment", "KLI"),
    ("IfcPipeSegment", "KLI"),
    ("IfcFlowStorageDevice", "KLI"),
    ("IfcTank", "KLI"),
    ("IfcFlowTreatmentDevice", "KLI"),
    ("IfcFilter", "KLI"),
    ("IfcDuctSilencer", "KLI"),
];

const ELECTRONIC_TYPES: &[&str] = &[
    "IfcActuator",
    "IfcAlarm",
    "IfcController",
    "IfcSensor",
    "IfcUnitaryControlElement",
    "IfcProtectiveDeviceTrippingUnit",
    "IfcFlowMeter",
    "IfcElectricDistributionBoard",
];

const ELECTRONIC_KEYWORDS: &[&str] = &[
    "steuerung",
    "regler",
    "sensor",
    "fühler",
    "messer",
    "aktor",
    "stellantrieb",
    "thermostat",
    "kontroller",
    "regelgerät",
    "bediengerät",
    "zähler",
    "motor",
    "ventil",
    "klappe",
    "antrieb",
    "control",
    "electronic",
    "regulate",
    "device",
];

const PROPERTY_SET_PREFIXES: &[&str] = &["Pset_", "PSet_"];

/// Tables that drive type gating, electronic detection and trade lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rules {
    /// Types that are classified at all, in enumeration order.
    pub hvac_types: Vec<String>,
    /// Types that are electronically controlled by definition.
    pub electronic_types: Vec<String>,
    /// Lower-case keywords that mark control, sensing or actuation.
    pub electronic_keywords: Vec<String>,
    /// Type → three-letter trade code.
    pub trade_codes: BTreeMap<String, String>,
    /// Property set names starting with one of these count as standard sets.
    pub property_set_prefixes: Vec<String>,
}

/// On-disk override file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RulesFile {
    hvac_types: Option<Vec<String>>,
    electronic_types: Option<Vec<String>>,
    electronic_keywords: Option<Vec<String>>,
    trade_codes: BTreeMap<String, String>,
    property_set_prefixes: Option<Vec<String>>,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            hvac_types: HVAC_TYPES.iter().map(|(t, _)| (*t).to_string()).collect(),
            electronic_types: to_strings(ELECTRONIC_TYPES),
            electronic_keywords: to_strings(ELECTRONIC_KEYWORDS),
            trade_codes: HVAC_TYPES
                .iter()
                .map(|(t, trade)| ((*t).to_string(), (*trade).to_string()))
                .collect(),
            property_set_prefixes: to_strings(PROPERTY_SET_PREFIXES),
        }
    }
}

impl Rules {
    /// Loads overrides from a JSON file on top of the defaults.
    ///
    /// Lists in the file replace the default list; `trade_codes` entries are
    /// merged over the default table.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RulesError> {
        let path_ref = path.as_ref();
        let content = std::fs::read_to_string(path_ref).map_err(|source| RulesError::FileRead {
            path: path_ref.to_path_buf(),
            source,
        })?;
        let rules = Self::from_json(&content).map_err(|source| RulesError::Json {
            path: path_ref.to_path_buf(),
            source,
        })?;
        info!(path = %path_ref.display(), types = rules.hvac_types.len(), "loaded classification rules");
        Ok(rules)
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        let file: RulesFile = serde_json::from_str(content)?;
        Ok(Self::default().merged(file))
    }

    fn merged(mut self, file: RulesFile) -> Self {
        if let Some(types) = file.hvac_types {
            self.hvac_types = types;
        }
        if let Some(types) = file.electronic_types {
            self.electronic_types = types;
        }
        if let Some(keywords) = file.electronic_keywords {
            self.electronic_keywords = keywords.iter().map(|k| k.to_lowercase()).collect();
        }
        self.trade_codes.extend(file.trade_codes);
        if let Some(prefixes) = file.property_set_prefixes {
            self.property_set_prefixes = prefixes;
        }
        self
    }

    /// Allow-list entry matching `ifc_type`, in its canonical spelling.
    #[must_use]
    pub fn hvac_type(&self, ifc_type: &str) -> Option<&str> {
        self.hvac_types
            .iter()
            .find(|t| t.eq_ignore_ascii_case(ifc_type))
            .map(String::as_str)
    }

    #[must_use]
    pub fn is_electronic_type(&self, ifc_type: &str) -> bool {
        self.electronic_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(ifc_type))
    }

    /// Trade code for a type, [`UNKNOWN_TRADE`] when unmapped.
    #[must_use]
    pub fn trade_code(&self, ifc_type: &str) -> &str {
        self.trade_codes
            .iter()
            .find(|(t, _)| t.eq_ignore_ascii_case(ifc_type))
            .map_or(UNKNOWN_TRADE, |(_, code)| code.as_str())
    }

    /// Whether `text` contains any keyword, ignoring case.
    #[must_use]
    pub fn mentions_keyword(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.electronic_keywords
            .iter()
            .any(|k| text.contains(k.as_str()))
    }

    #[must_use]
    pub fn is_standard_property_set(&self, name: &str) -> bool {
        self.property_set_prefixes
            .iter()
            .any(|p| name.starts_with(p.as_str()))
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}
