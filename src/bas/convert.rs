use tracing::debug;

use super::{generate, CodeParts, Standard, DELIMITER, NO_LOCATION};
use crate::error::StandardError;

/// Converts `code` from one standard's layout to the other's.
///
/// Only trade, installation index and the storey/room markers survive; every
/// other field of the target layout is filled with that standard's defaults,
/// so AMEV → VDI → AMEV does not give back the original AMEV-only fields.
///
/// Codes with fewer fields than the source standard needs, and conversions
/// where source and target are the same, return `code` unchanged.
#[must_use]
pub fn convert(code: &str, from: Standard, to: Standard) -> String {
    if from == to {
        return code.to_string();
    }

    let fields: Vec<&str> = code.split(DELIMITER).collect();
    if code.is_empty() || fields.len() < from.min_fields() {
        debug!(code, %from, "too few fields to convert, returning code unchanged");
        return code.to_string();
    }

    // Trade and installation index are positional; markers may sit anywhere after them.
    let markers = &fields[2..];
    let storey = find_marker(markers, 'S');
    let room = find_marker(markers, 'R');

    let parts = match to {
        Standard::Vdi => CodeParts::new(
            fields[0],
            fields[1],
            &vdi_digits(storey),
            &vdi_digits(room),
        ),
        Standard::Amev => CodeParts::new(
            fields[0],
            fields[1],
            &amev_digits(storey),
            &amev_digits(room),
        ),
    };
    generate(to, &parts)
}

/// [`convert`] with standard names as given by a caller.
///
/// Unknown names are rejected rather than defaulted.
pub fn convert_named(code: &str, from: &str, to: &str) -> Result<String, StandardError> {
    let from: Standard = from.parse()?;
    let to: Standard = to.parse()?;
    Ok(convert(code, from, to))
}

// Digits of the first field that is `prefix` followed only by ASCII digits.
// AMEV fields such as `RLT` or `SPE` start with the same letters.
fn find_marker<'a>(fields: &[&'a str], prefix: char) -> Option<&'a str> {
    fields.iter().find_map(|field| {
        field
            .strip_prefix(prefix)
            .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
    })
}

// AMEV markers carry three digits; VDI keeps the first two.
fn vdi_digits(marker: Option<&str>) -> String {
    match marker {
        Some(digits) if digits.chars().count() >= 2 => digits.chars().take(2).collect(),
        _ => "00".to_string(),
    }
}

fn amev_digits(marker: Option<&str>) -> String {
    match marker {
        Some(digits) if !digits.is_empty() => format!("{digits:0>3}"),
        _ => NO_LOCATION.to_string(),
    }
}
