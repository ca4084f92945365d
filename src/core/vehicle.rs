// logsift - core/vehicle.rs
//
// Derives a human vehicle name for a serial from the content or filename
// of its most recent readout log.
//
// The heuristics are an ordered list of named strategies, each a pure
// function from (filename, content) to an optional name. The order and the
// "Unknown" fallback are part of the contract: they must stay stable so
// vehicle naming remains backward compatible across versions. New filename
// conventions are added as new strategies at the end of the list.

use crate::core::model::LogSource;
use regex::Regex;
use std::sync::OnceLock;

/// Placeholder name when no strategy produces a hit.
pub const UNKNOWN_VEHICLE: &str = "Unknown";

/// A pure extraction strategy: (file name, file content) -> optional name.
pub type Strategy = fn(&str, &str) -> Option<String>;

/// The fixed, documented strategy order.
pub const STRATEGIES: &[(&str, Strategy)] = &[
    ("config-line", from_config_line),
    ("bev3-token", from_bev3_token),
    ("filename", from_filename),
];

/// "Configuration file: Axlerod_BEV3_r4.icf" -> "Axlerod".
fn from_config_line(_file_name: &str, content: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"Configuration file:\s*([^_\\/ \t]+)_").expect("static regex")
    });
    re.captures(content).map(|c| c[1].to_string())
}

/// "... Axlerod_BEV3 ..." anywhere in the content -> "Axlerod".
fn from_bev3_token(_file_name: &str, content: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\b([A-Za-z0-9]+)_BEV3").expect("static regex"));
    re.captures(content).map(|c| c[1].to_string())
}

/// "Axlerod_20251118_T123000.LOG" -> "Axlerod".
fn from_filename(file_name: &str, _content: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^([A-Za-z0-9]+)_\d{8}_T").expect("static regex"));
    re.captures(file_name).map(|c| c[1].to_string())
}

/// Run the strategies in order; the first hit wins. Deterministic for
/// identical input.
pub fn extract(file_name: &str, content: &str) -> String {
    for (name, strategy) in STRATEGIES {
        if let Some(vehicle) = strategy(file_name, content) {
            tracing::trace!(strategy = name, vehicle, "Vehicle name extracted");
            return vehicle;
        }
    }
    UNKNOWN_VEHICLE.to_string()
}

/// The most recent source for a serial: greatest parsed date, ties broken
/// by lexically greatest display name. This is the source the extractor
/// inspects (and the one reported as "latest available log").
pub fn most_recent(sources: &[LogSource]) -> Option<&LogSource> {
    sources
        .iter()
        .max_by(|a, b| match (a.date, b.date) {
            (Some(da), Some(db)) => da.cmp(&db),
            (Some(_), None) => std::cmp::Ordering::Greater,
            (None, Some(_)) => std::cmp::Ordering::Less,
            (None, None) => std::cmp::Ordering::Equal,
        }
        .then_with(|| a.display_name().cmp(&b.display_name())))
}

// =============================================================================
// Tests
// =============================================================================
