// logsift - core/model.rs
//
// Core data model types. Pure data definitions with no I/O.
// These types are the shared vocabulary across resolution, classification,
// aggregation, and report rendering.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;

// =============================================================================
// Classification tag
// =============================================================================

/// Outcome of applying the keyword rules to one line of log text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tag {
    /// A protocol line reporting agreement (e.g. "Protocols: CCP match").
    Match,
    /// A protocol line reporting disagreement.
    Mismatch,
    /// A configuration line (e.g. "Configuration file: ...").
    Config,
    /// No rule matched. Plain lines are not retained in run results.
    Plain,
}

impl Tag {
    /// Human-readable label for display.
    pub fn label(&self) -> &'static str {
        match self {
            Tag::Match => "match",
            Tag::Mismatch => "mismatch",
            Tag::Config => "config",
            Tag::Plain => "plain",
        }
    }

    /// CSS class used by the HTML reports.
    pub fn css_class(&self) -> &'static str {
        match self {
            Tag::Match => "match",
            Tag::Mismatch => "mismatch",
            Tag::Config => "configuration",
            Tag::Plain => "plain",
        }
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Keyword rule
// =============================================================================

/// One configured keyword rule: a literal substring pattern, the tag a
/// matching line receives, and the highlight colour used in HTML output.
///
/// Rules are evaluated in configured order and the first match wins, so a
/// rule for "mismatch" must precede a rule for "match" (the latter pattern
/// is a substring of the former).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordRule {
    /// Literal substring to search for in each line.
    pub pattern: String,

    /// Classification applied when the pattern is found.
    pub tag: Tag,

    /// CSS colour for highlighted output (e.g. "#CC0000").
    pub color: String,
}

// =============================================================================
// Log source
// =============================================================================

/// Whether a source is a plain file on disk or an entry inside an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// A plain `.LOG` file; `path` points at it directly.
    Plain,
    /// A `.LOG` entry inside a `.ZIP`; `path` points at the archive.
    ZipEntry { entry: String },
}

/// One physical log source discovered during resolution. Immutable once
/// created; the parsed date never changes for the lifetime of a run.
#[derive(Debug, Clone)]
pub struct LogSource {
    /// Path of the on-disk file (the archive itself for zip entries).
    pub path: PathBuf,

    /// Serial number of the logger folder this source was found under.
    pub serial: String,

    /// Plain file or archive entry.
    pub kind: SourceKind,

    /// Date parsed from the filename token. `None` when no token parsed;
    /// such sources are admitted only by an unbounded date window.
    pub date: Option<NaiveDate>,
}

impl LogSource {
    /// Base name of the on-disk file.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Display name used in reports: the file base name, with the inner
    /// entry appended for archive sources ("READOUT.ZIP!inner.LOG").
    pub fn display_name(&self) -> String {
        match &self.kind {
            SourceKind::Plain => self.file_name(),
            SourceKind::ZipEntry { entry } => {
                let inner = entry.rsplit(['/', '\\']).next().unwrap_or(entry);
                format!("{}!{inner}", self.file_name())
            }
        }
    }
}

// =============================================================================
// Classified line
// =============================================================================

/// One line of log text that matched a keyword rule. The atomic unit
/// aggregated into reports; immutable and scoped to the run that produced it.
#[derive(Debug, Clone)]
pub struct ClassifiedLine {
    /// Display name of the originating source (see `LogSource::display_name`).
    pub source_file: String,

    /// Date parsed from the originating source's filename, if any.
    pub source_date: Option<NaiveDate>,

    /// Serial of the logger folder the line came from.
    pub serial: String,

    /// Vehicle name resolved for the originating serial.
    pub vehicle: String,

    /// 1-based line number within the source.
    pub line_number: u64,

    /// Trimmed line text.
    pub text: String,

    /// Classification outcome (never `Plain` in a run result).
    pub tag: Tag,

    /// Highlight colour of the rule that matched, carried through to the
    /// HTML report so two same-tag rules keep their own colours.
    pub color: String,
}

// =============================================================================
// Run result
// =============================================================================

/// Output of one filter run. Line order is file discovery order, then
/// in-file order; both report formats render from this same structure.
#[derive(Debug, Default)]
pub struct RunResult {
    /// Classified lines in discovery order.
    pub lines: Vec<ClassifiedLine>,

    /// Serials for which resolution yielded zero sources.
    pub serials_without_logs: Vec<String>,

    /// Non-fatal per-source failures accumulated during the run.
    pub diagnostics: Vec<String>,
}

// =============================================================================
// Vehicle group (summary mode)
// =============================================================================

/// Normalisation key used for per-vehicle de-duplication: trimmed,
/// lowercased, with runs of inner whitespace collapsed to single spaces.
pub fn dedup_key(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Per-vehicle aggregation bucket for the daily summary. Configuration and
/// protocol lines are kept in first-seen order and de-duplicated on
/// `dedup_key` — per vehicle, never across vehicles.
#[derive(Debug, Clone)]
pub struct VehicleGroup {
    /// Display name of the vehicle.
    pub name: String,

    /// Display names of every source that contributed a line.
    pub sources: BTreeSet<String>,

    /// De-duplicated configuration lines, first-seen order.
    pub config_lines: Vec<String>,

    /// De-duplicated protocol lines with their tags, first-seen order.
    pub protocol_lines: Vec<(String, Tag)>,

    /// True once any protocol line carried the mismatch tag.
    pub has_mismatch: bool,

    /// Most recent log file name across the full store, when requested.
    pub latest_source: Option<String>,

    config_seen: HashSet<String>,
    protocol_seen: HashSet<String>,
}

impl VehicleGroup {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            sources: BTreeSet::new(),
            config_lines: Vec::new(),
            protocol_lines: Vec::new(),
            has_mismatch: false,
            latest_source: None,
            config_seen: HashSet::new(),
            protocol_seen: HashSet::new(),
        }
    }

    /// Insert a configuration line; returns false if it was a duplicate.
    pub fn add_config(&mut self, text: &str) -> bool {
        if self.config_seen.insert(dedup_key(text)) {
            self.config_lines.push(text.to_string());
            true
        } else {
            false
        }
    }

    /// Insert a protocol line; returns false if it was a duplicate.
    /// A duplicate still updates `has_mismatch` — the flag reflects content
    /// seen, not content stored.
    pub fn add_protocol(&mut self, text: &str, tag: Tag) -> bool {
        if tag == Tag::Mismatch {
            self.has_mismatch = true;
        }
        if self.protocol_seen.insert(dedup_key(text)) {
            self.protocol_lines.push((text.to_string(), tag));
            true
        } else {
            false
        }
    }
}

// =============================================================================
// Summary result
// =============================================================================

/// Output of one daily-summary run: one group per vehicle (mismatch
/// vehicles first, then alphabetical), plus the serials that produced no
/// classified line anywhere in the window.
#[derive(Debug, Default)]
pub struct SummaryResult {
    pub vehicles: Vec<VehicleGroup>,
    pub serials_without_logs: Vec<String>,
    pub diagnostics: Vec<String>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_key_normalises_case_and_whitespace() {
        assert_eq!(
            dedup_key("  Protocols:   CCP  match "),
            dedup_key("protocols: ccp MATCH")
        );
        assert_ne!(dedup_key("CCP match"), dedup_key("CCP mismatch"));
    }

    #[test]
    fn test_vehicle_group_dedup_is_idempotent() {
        let mut group = VehicleGroup::new("Miguel");
        assert!(group.add_config("Configuration file: Miguel_BEV3_r12"));
        assert!(!group.add_config("configuration  file: miguel_bev3_r12"));
        assert_eq!(group.config_lines.len(), 1);

        assert!(group.add_protocol("Protocols: CCP mismatch", Tag::Mismatch));
        assert!(!group.add_protocol("Protocols: CCP mismatch", Tag::Mismatch));
        assert_eq!(group.protocol_lines.len(), 1);
        assert!(group.has_mismatch);
    }

    #[test]
    fn test_mismatch_flag_set_even_for_duplicate() {
        let mut group = VehicleGroup::new("Torne");
        group.add_protocol("Protocols: CCP mismatch", Tag::Match);
        assert!(!group.has_mismatch);
        group.add_protocol("Protocols: CCP mismatch", Tag::Mismatch);
        assert!(group.has_mismatch, "duplicate insert must still raise flag");
    }

    #[test]
    fn test_zip_source_display_name() {
        let source = LogSource {
            path: PathBuf::from("/base/ipelog2_1/READOUT_20251112_T090000.ZIP"),
            serial: "1".to_string(),
            kind: SourceKind::ZipEntry {
                entry: "logs/Miguel_20251112_T090000_LOG_1.LOG".to_string(),
            },
            date: None,
        };
        assert_eq!(
            source.display_name(),
            "READOUT_20251112_T090000.ZIP!Miguel_20251112_T090000_LOG_1.LOG"
        );
    }
}
