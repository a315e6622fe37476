//! BAS (building automation) code generation and conversion.
//!
//! Two fixed, underscore-delimited layouts are supported:
//!
//! - AMEV: `TRADE_IDX_ERH_HZV_Sxxx_Ryyy_T~~01_MW-01_TL` (9 fields)
//! - VDI 3814: `TRADE_IDX_Sxx_Ryy_U1_101` (6 fields)
//!
//! Field counts and the fixed defaults are a wire contract with external
//! tooling and must not change.

mod convert;

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::StandardError;
use crate::graph::ElementId;

pub use convert::{convert, convert_named};

pub const DELIMITER: char = '_';

/// AMEV defaults for fields that are not derived from the element.
pub mod amev {
    pub const BAUGRUPPE: &str = "ERH";
    pub const MEDIUM: &str = "HZV";
    pub const BETRIEBSMITTEL: &str = "T~~01";
    pub const FUNKTION: &str = "MW-01";
    pub const ERW_FUNKTION: &str = "TL";
    pub const FIELD_COUNT: usize = 9;
    pub const MIN_FIELDS: usize = 5;
}

/// VDI 3814 defaults for fields that are not derived from the element.
pub mod vdi {
    pub const FUNKTION: &str = "U1";
    pub const ZUSATZ: &str = "101";
    pub const FIELD_COUNT: usize = 6;
    pub const MIN_FIELDS: usize = 4;
}

/// Code for an unresolved storey or room.
pub const NO_LOCATION: &str = "000";

/// Supported numbering standards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Standard {
    Amev,
    Vdi,
}

impl Standard {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Standard::Amev => "amev",
            Standard::Vdi => "vdi",
        }
    }

    /// Fewest fields a code must have to be converted from this standard.
    #[must_use]
    pub fn min_fields(self) -> usize {
        match self {
            Standard::Amev => amev::MIN_FIELDS,
            Standard::Vdi => vdi::MIN_FIELDS,
        }
    }
}

impl fmt::Display for Standard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Standard {
    type Err = StandardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "amev" => Ok(Standard::Amev),
            "vdi" => Ok(Standard::Vdi),
            _ => Err(StandardError::Unsupported {
                name: s.to_string(),
            }),
        }
    }
}

/// The element-derived parts of a code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeParts {
    /// Three-letter trade (Gewerk), e.g. `HEI`.
    pub trade: String,
    /// Two-digit installation index.
    pub installation: String,
    /// Storey number, at least three digits.
    pub storey: String,
    /// Room number, at least three digits.
    pub room: String,
}

impl CodeParts {
    #[must_use]
    pub fn new(trade: &str, installation: &str, storey: &str, room: &str) -> Self {
        Self {
            trade: trade.to_string(),
            installation: installation.to_string(),
            storey: storey.to_string(),
            room: room.to_string(),
        }
    }
}

/// Lays the parts out in the field order of `standard`.
#[must_use]
pub fn generate(standard: Standard, parts: &CodeParts) -> String {
    let storey_marker;
    let room_marker;
    let fields: Vec<&str> = match standard {
        Standard::Amev => {
            storey_marker = format!("S{}", parts.storey);
            room_marker = format!("R{}", parts.room);
            vec![
                parts.trade.as_str(),
                parts.installation.as_str(),
                amev::BAUGRUPPE,
                amev::MEDIUM,
                storey_marker.as_str(),
                room_marker.as_str(),
                amev::BETRIEBSMITTEL,
                amev::FUNKTION,
                amev::ERW_FUNKTION,
            ]
        }
        Standard::Vdi => {
            storey_marker = format!("S{}", leading(&parts.storey, 2));
            room_marker = format!("R{}", leading(&parts.room, 2));
            vec![
                parts.trade.as_str(),
                parts.installation.as_str(),
                storey_marker.as_str(),
                room_marker.as_str(),
                vdi::FUNKTION,
                vdi::ZUSATZ,
            ]
        }
    };
    fields.join("_")
}

/// First run of ASCII digits in `s`.
#[must_use]
pub fn first_number(s: &str) -> Option<&str> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    let rest = &s[start..];
    let len = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    Some(&rest[..len])
}

/// Two-digit installation index.
///
/// Taken from the first number in the element name modulo 100, else from the
/// element id modulo 100. Different elements can share an index.
#[must_use]
pub fn installation_index(name: Option<&str>, id: ElementId) -> String {
    let value = name
        .and_then(first_number)
        .map_or(id % 100, digits_mod_100);
    format!("{value:02}")
}

/// Storey or room number from a display name, zero-padded to three digits.
///
/// `"OG 2"` gives `"002"`; a missing name or one without digits gives `"000"`.
#[must_use]
pub fn location_code(name: Option<&str>) -> String {
    name.and_then(first_number)
        .map_or_else(|| NO_LOCATION.to_string(), |digits| format!("{digits:0>3}"))
}

// The last two digits are the value modulo 100, which sidesteps overflow on long runs.
fn digits_mod_100(digits: &str) -> u64 {
    let tail = &digits[digits.len().saturating_sub(2)..];
    tail.parse().unwrap_or(0)
}

// First `n` characters; markers are ASCII so this never splits a char in practice.
fn leading(s: &str, n: usize) -> &str {
    s.char_indices().nth(n).map_or(s, |(i, _)| &s[..i])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn standard_names_are_case_insensitive() {
        assert_eq!("AMEV".parse::<Standard>(), Ok(Standard::Amev));
        assert_eq!("Vdi".parse::<Standard>(), Ok(Standard::Vdi));
        assert_eq!(
            "din276".parse::<Standard>(),
            Err(StandardError::Unsupported {
                name: "din276".to_string()
            })
        );
        assert!("".parse::<Standard>().is_err());
    }

    #[test]
    fn amev_layout_has_nine_fields_with_three_digit_markers() {
        let code = generate(Standard::Amev, &CodeParts::new("HEI", "12", "002", "005"));

        assert_eq!(code, "HEI_12_ERH_HZV_S002_R005_T~~01_MW-01_TL");
        let fields: Vec<&str> = code.split(DELIMITER).collect();
        assert_eq!(fields.len(), amev::FIELD_COUNT);
        assert_eq!(fields[4], "S002");
        assert_eq!(fields[5], "R005");
    }

    #[test]
    fn vdi_layout_truncates_markers_to_two_digits() {
        let code = generate(Standard::Vdi, &CodeParts::new("HEI", "12", "002", "105"));

        assert_eq!(code, "HEI_12_S00_R10_U1_101");
        assert_eq!(code.split(DELIMITER).count(), vdi::FIELD_COUNT);
    }

    #[test]
    fn installation_index_prefers_name_digits() {
        assert_eq!(installation_index(Some("Regelventil 12"), 4711), "12");
        assert_eq!(installation_index(Some("Pumpe 7"), 4711), "07");
        assert_eq!(installation_index(Some("Kessel 1234 Nord 5"), 1), "34");
        assert_eq!(installation_index(Some("Pumpe 100"), 1), "00");
    }

    #[test]
    fn installation_index_falls_back_to_id() {
        assert_eq!(installation_index(Some("Pumpe"), 4711), "11");
        assert_eq!(installation_index(None, 305), "05");
        assert_eq!(installation_index(None, 42), "42");
    }

    #[test]
    fn installation_index_survives_huge_numbers() {
        assert_eq!(
            installation_index(Some("Serie 123456789012345678901234567899"), 1),
            "99"
        );
    }

    #[test]
    fn location_code_pads_first_number() {
        assert_eq!(location_code(Some("OG 2")), "002");
        assert_eq!(location_code(Some("Raum 5")), "005");
        assert_eq!(location_code(Some("Raum 1.14")), "001");
        assert_eq!(location_code(Some("Geschoss 1234")), "1234");
        assert_eq!(location_code(Some("Erdgeschoss")), "000");
        assert_eq!(location_code(None), "000");
    }

    #[test]
    fn first_number_finds_leading_run() {
        assert_eq!(first_number("abc"), None);
        assert_eq!(first_number("R2D2"), Some("2"));
        assert_eq!(first_number("42x"), Some("42"));
    }
}
