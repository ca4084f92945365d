// logsift - core/resolver.rs
//
// Maps a base path + serial number to the ordered set of candidate log
// sources, with inclusive date-range filtering parsed from filename tokens.
//
// Failure policy:
//   - A missing/invalid base path is a fatal ResolveError (caller mistake).
//   - A serial with no matching folder yields Ok with an empty set; the
//     caller reports "no logs found" for that serial and continues.
//   - Unreadable archives and traversal failures are collected as warning
//     strings, never errors.

use crate::core::archive;
use crate::core::model::{LogSource, SourceKind};
use crate::util::constants;
use crate::util::error::ResolveError;
use chrono::NaiveDate;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

// =============================================================================
// Date window
// =============================================================================

/// Inclusive date range; either bound may be absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateWindow {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateWindow {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    /// A window with no bounds; admits every source, dated or not.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Whether a source with the given parsed date belongs to the window.
    /// Sources with no parseable date are admitted only by an unbounded
    /// window (a date filter must never surface undatable files).
    pub fn admits(&self, date: Option<NaiveDate>) -> bool {
        match date {
            Some(d) => {
                self.from.map_or(true, |from| from <= d) && self.to.map_or(true, |to| d <= to)
            }
            None => self.is_unbounded(),
        }
    }
}

// =============================================================================
// Filename date tokens
// =============================================================================

/// Old logger convention: `Miguel_20251112_T090000_LOG_1.LOG`.
fn compact_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"_(\d{8})_T\d{6}").expect("static regex"))
}

/// FT convention: `2025-11-25_08_05_36_MEA_4711.ZIP`.
fn dashed_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d{4}-\d{2}-\d{2})_\d{2}_\d{2}_\d{2}").expect("static regex")
    })
}

/// Logger folder naming: `ipelog2_82902308`, `IPELOG_82902554`, ...
fn serial_folder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(?:ipelog|ipelog2|ipelogger|logger|ipelog3|arcos2)_?(\d+)$")
            .expect("static regex")
    })
}

/// Best-effort date extraction from one file or directory name.
/// Tries the compact token first, then the dashed token; the first token
/// that parses wins. Returns `None` when no token is present or parseable.
pub fn date_from_name(name: &str) -> Option<NaiveDate> {
    for caps in compact_date_re().captures_iter(name) {
        if let Ok(d) = NaiveDate::parse_from_str(&caps[1], "%Y%m%d") {
            return Some(d);
        }
    }
    for caps in dashed_date_re().captures_iter(name) {
        if let Ok(d) = NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d") {
            return Some(d);
        }
    }
    None
}

/// Date for a full path: the filename token wins; otherwise parent
/// components are scanned (readouts are sometimes grouped in dated folders).
pub fn date_for_path(path: &Path) -> Option<NaiveDate> {
    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        if let Some(d) = date_from_name(name) {
            return Some(d);
        }
    }
    path.components()
        .rev()
        .skip(1)
        .find_map(|c| c.as_os_str().to_str().and_then(date_from_name))
}

// =============================================================================
// Resolution
// =============================================================================

/// Whether a directory name belongs to the given serial: either a
/// recognised logger-folder prefix with a matching number, or (tolerance
/// rule) any name containing the selector token, case-folded so vehicle
/// name folders match regardless of casing ("VISKAN" vs "viskan").
fn folder_matches_serial(name: &str, serial: &str) -> bool {
    if let Some(caps) = serial_folder_re().captures(name) {
        return &caps[1] == serial;
    }
    name.to_lowercase().contains(&serial.to_lowercase())
}

/// Resolve the ordered set of log sources for one serial under `base`,
/// restricted to `window`. `.LOG` files are always candidates; `.ZIP`
/// archives only when `include_zip` is set, in which case each archive is
/// expanded into its inner `.LOG` entries.
///
/// Returns the sources in deterministic discovery order (folders sorted by
/// name, files sorted within each folder) plus non-fatal warnings.
pub fn resolve(
    base: &Path,
    serial: &str,
    window: &DateWindow,
    include_zip: bool,
) -> Result<(Vec<LogSource>, Vec<String>), ResolveError> {
    let meta = std::fs::metadata(base).map_err(|_| ResolveError::BaseNotFound {
        path: base.to_path_buf(),
    })?;
    if !meta.is_dir() {
        return Err(ResolveError::NotADirectory {
            path: base.to_path_buf(),
        });
    }

    let mut warnings: Vec<String> = Vec::new();

    // Folders at the top level whose name belongs to this serial.
    let mut folders: Vec<std::path::PathBuf> = Vec::new();
    match std::fs::read_dir(base) {
        Ok(entries) => {
            for entry in entries.flatten() {
                let path = entry.path();
                if !path.is_dir() {
                    continue;
                }
                let name = entry.file_name();
                let Some(name) = name.to_str() else { continue };
                if folder_matches_serial(name, serial) {
                    folders.push(path);
                }
            }
        }
        Err(e) => {
            tracing::warn!(base = %base.display(), error = %e, "Cannot list base path");
            return Err(ResolveError::BaseNotFound {
                path: base.to_path_buf(),
            });
        }
    }
    folders.sort();

    if folders.is_empty() {
        tracing::debug!(serial, base = %base.display(), "No logger folder for serial");
        return Ok((Vec::new(), warnings));
    }

    let log_suffix = format!(".{}", constants::LOG_EXTENSION);
    let zip_suffix = format!(".{}", constants::ZIP_EXTENSION);
    let mut sources: Vec<LogSource> = Vec::new();

    for folder in &folders {
        let walker = walkdir::WalkDir::new(folder)
            .max_depth(constants::MAX_SCAN_DEPTH)
            .follow_links(false)
            .sort_by_file_name();

        for entry_result in walker {
            let entry = match entry_result {
                Ok(e) => e,
                Err(e) => {
                    warnings.push(format!("Cannot access entry under '{}': {e}", folder.display()));
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let upper = name.to_uppercase();

            if upper.ends_with(&log_suffix) {
                let date = date_for_path(path);
                if window.admits(date) {
                    sources.push(LogSource {
                        path: path.to_path_buf(),
                        serial: serial.to_string(),
                        kind: SourceKind::Plain,
                        date,
                    });
                }
            } else if include_zip && upper.ends_with(&zip_suffix) {
                let archive_date = date_for_path(path);
                // Skip opening archives whose own date token already falls
                // outside a bounded window.
                if let Some(d) = archive_date {
                    if !window.admits(Some(d)) {
                        continue;
                    }
                }
                match archive::zip_log_entries(path) {
                    Ok(entries) => {
                        for inner in entries {
                            let date = date_from_name(&inner).or(archive_date);
                            if window.admits(date) {
                                sources.push(LogSource {
                                    path: path.to_path_buf(),
                                    serial: serial.to_string(),
                                    kind: SourceKind::ZipEntry { entry: inner },
                                    date,
                                });
                            }
                        }
                    }
                    Err(e) => {
                        tracing::warn!(archive = %path.display(), error = %e, "Skipping archive");
                        warnings.push(e.to_string());
                    }
                }
            }
        }
    }

    tracing::debug!(
        serial,
        folders = folders.len(),
        sources = sources.len(),
        warnings = warnings.len(),
        "Resolution complete"
    );
    Ok((sources, warnings))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_compact_date_token() {
        assert_eq!(
            date_from_name("Miguel_20251112_T090000_LOG_1.LOG"),
            Some(d("2025-11-12"))
        );
    }

    #[test]
    fn test_dashed_date_token() {
        assert_eq!(
            date_from_name("2025-11-25_08_05_36_MEA_4711.ZIP"),
            Some(d("2025-11-25"))
        );
    }

    #[test]
    fn test_unparseable_name_has_no_date() {
        assert_eq!(date_from_name("notes.LOG"), None);
        // Token shape present but impossible date.
        assert_eq!(date_from_name("X_20251399_T090000.LOG"), None);
    }

    #[test]
    fn test_date_from_parent_component() {
        let path = Path::new("/base/ipelog2_1/dump_20251112_T090000/session.LOG");
        assert_eq!(date_for_path(path), Some(d("2025-11-12")));
    }

    #[test]
    fn test_window_inclusive_bounds() {
        let w = DateWindow::new(Some(d("2025-11-10")), Some(d("2025-11-12")));
        assert!(w.admits(Some(d("2025-11-10"))));
        assert!(w.admits(Some(d("2025-11-12"))));
        assert!(!w.admits(Some(d("2025-11-13"))));
        assert!(!w.admits(None), "undated excluded by bounded window");

        let half_open = DateWindow::new(Some(d("2025-11-10")), None);
        assert!(half_open.admits(Some(d("2099-01-01"))));
        assert!(!half_open.admits(None));

        assert!(DateWindow::unbounded().admits(None));
    }

    #[test]
    fn test_folder_matching() {
        assert!(folder_matches_serial("ipelog2_82902308", "82902308"));
        assert!(folder_matches_serial("IPELOG_82902554", "82902554"));
        assert!(folder_matches_serial("arcos2_123", "123"));
        // Prefix recognised but number differs: the regex verdict is final.
        assert!(!folder_matches_serial("ipelog2_82902308", "82902"));
        // Unrecognised prefix falls back to the contains rule.
        assert!(folder_matches_serial("backup_82902308_old", "82902308"));
        assert!(!folder_matches_serial("VISKAN", "82902308"));
    }

    #[test]
    fn test_folder_tolerance_rule_is_case_insensitive() {
        assert!(folder_matches_serial("VISKAN", "viskan"));
        assert!(folder_matches_serial("viskan_archive", "VISKAN"));
        assert!(!folder_matches_serial("TORNE", "viskan"));
    }

    #[test]
    fn test_missing_serial_folder_is_empty_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let (sources, warnings) =
            resolve(dir.path(), "99999999", &DateWindow::unbounded(), true).unwrap();
        assert!(sources.is_empty());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_missing_base_path_is_error() {
        let result = resolve(
            Path::new("/nonexistent/logsift-base"),
            "1",
            &DateWindow::unbounded(),
            true,
        );
        assert!(matches!(result, Err(ResolveError::BaseNotFound { .. })));
    }

    #[test]
    fn test_resolves_log_files_with_date_filter() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("ipelog2_82902554");
        fs::create_dir(&folder).unwrap();
        fs::write(folder.join("Miguel_20251112_T090000_LOG_1.LOG"), "a\n").unwrap();
        fs::write(folder.join("Miguel_20251113_T090000_LOG_1.LOG"), "b\n").unwrap();
        fs::write(folder.join("undated.LOG"), "c\n").unwrap();

        let day = DateWindow::new(Some(d("2025-11-12")), Some(d("2025-11-12")));
        let (sources, _) = resolve(dir.path(), "82902554", &day, false).unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].file_name(), "Miguel_20251112_T090000_LOG_1.LOG");
        assert_eq!(sources[0].date, Some(d("2025-11-12")));

        // No date filter: all three, including the undated file.
        let (all, _) = resolve(dir.path(), "82902554", &DateWindow::unbounded(), false).unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_zip_candidates_gated_by_toggle() {
        use std::io::Write;
        use zip::write::SimpleFileOptions;

        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("ipelog2_82902554");
        fs::create_dir(&folder).unwrap();

        let zip_path = folder.join("READOUT_20251112_T090000.ZIP");
        let file = fs::File::create(&zip_path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        writer
            .start_file("Miguel_20251112_T090000_LOG_1.LOG", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"Protocols: CCP match\n").unwrap();
        writer.finish().unwrap();

        let window = DateWindow::unbounded();
        let (without, _) = resolve(dir.path(), "82902554", &window, false).unwrap();
        assert!(without.is_empty(), "zip excluded when toggle is off");

        let (with, _) = resolve(dir.path(), "82902554", &window, true).unwrap();
        assert_eq!(with.len(), 1);
        assert!(matches!(with[0].kind, SourceKind::ZipEntry { .. }));
        assert_eq!(with[0].date, Some(d("2025-11-12")));
    }

    #[test]
    fn test_corrupt_zip_is_warning_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("ipelog2_1");
        fs::create_dir(&folder).unwrap();
        fs::write(folder.join("bad.ZIP"), b"not a zip").unwrap();

        let (sources, warnings) =
            resolve(dir.path(), "1", &DateWindow::unbounded(), true).unwrap();
        assert!(sources.is_empty());
        assert_eq!(warnings.len(), 1);
    }
}
