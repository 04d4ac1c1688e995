//! Sensor payload handling
//!
//! An act string may arrive wrapped in a full sensor payload. The payload
//! delimits the act string with two fixed markers.

use regex::Regex;
use std::sync::OnceLock;

/// Marker preceding the act string inside a sensor payload.
pub const SENSOR_KACT_START: &str = "-1,2,-94,-108,";
/// Marker following the act string inside a sensor payload.
pub const SENSOR_KACT_END: &str = "-1,2,-94,-110,";

fn extract_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)-1,2,-94,-108,(?P<kact>.*?)-1,2,-94,-110,")
            .expect("Invalid regex pattern")
    })
}

fn shape_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[,;]*[^\s,;]+(?:[,;]+[^\s,;]+)*[,;]*$").expect("Invalid regex pattern")
    })
}

/// Check if `raw` carries both sensor markers.
pub fn is_sensor_payload(raw: &str) -> bool {
    raw.contains(SENSOR_KACT_START) && raw.contains(SENSOR_KACT_END)
}

/// Extract the act string embedded between the sensor markers.
pub fn extract(raw: &str) -> Option<&str> {
    extract_pattern()
        .captures(raw)
        .and_then(|caps| caps.name("kact"))
        .map(|m| m.as_str())
}

/// Gross lexical check: tokens without whitespace joined by `,` / `;` runs.
pub fn is_well_formed(act: &str) -> bool {
    shape_pattern().is_match(act)
}
