// logsift - core/engine.rs
//
// Orchestrates one filter run: resolution, reading, classification, and
// vehicle tagging across N serials and a date range.
//
// The engine is synchronous and single-threaded: serials are processed
// sequentially and files within a serial sequentially. It is a one-shot
// batch operation per call; callers that want responsiveness run it on a
// worker of their own and must serialize calls.
//
// Failure policy:
//   - A serial resolving to zero sources is recorded in
//     `serials_without_logs`, never an error.
//   - A source that cannot be read is skipped; the failure is pushed onto
//     `RunResult.diagnostics` and the run continues.
//   - Only a bad base path aborts the run.

use crate::cache::VehicleCache;
use crate::core::archive;
use crate::core::classify::Classifier;
use crate::core::model::{ClassifiedLine, LogSource, RunResult};
use crate::core::resolver::{self, DateWindow};
use crate::core::vehicle;
use crate::util::error::Result;
use chrono::{NaiveDate, Utc};
use std::path::PathBuf;

// =============================================================================
// Run parameters
// =============================================================================

/// The complete parameter surface of one engine invocation. How a caller
/// collects these (CLI flags, GUI fields) is out of scope.
#[derive(Debug, Clone)]
pub struct RunParams {
    /// Root directory holding the per-serial logger folders.
    pub base_path: PathBuf,

    /// Serials to scan, in reporting order.
    pub serials: Vec<String>,

    /// Inclusive lower date bound; `None` = unbounded.
    pub from: Option<NaiveDate>,

    /// Inclusive upper date bound; `None` = unbounded.
    pub to: Option<NaiveDate>,

    /// Whether `.ZIP` archives are inspected for inner `.LOG` entries.
    pub include_zip: bool,

    /// Prefix for the generated report files.
    pub output_prefix: String,
}

impl RunParams {
    pub fn window(&self) -> DateWindow {
        DateWindow::new(self.from, self.to)
    }
}

// =============================================================================
// Filter run
// =============================================================================

/// Execute one filter run. For each serial: resolve sources, read lines,
/// classify them, and tag each kept line with the vehicle name resolved
/// for that serial (cache lookup first, extraction as fallback).
///
/// Lines classified `Plain` are not retained: the engine reports keyword
/// hits, and the absence of a hit carries no information for the reports.
pub fn run(
    params: &RunParams,
    classifier: &Classifier,
    cache: &mut VehicleCache,
) -> Result<RunResult> {
    let window = params.window();
    let mut result = RunResult::default();

    tracing::info!(
        base = %params.base_path.display(),
        serials = params.serials.len(),
        from = ?params.from,
        to = ?params.to,
        include_zip = params.include_zip,
        "Filter run starting"
    );

    for serial in &params.serials {
        let serial = serial.trim();
        if serial.is_empty() {
            continue;
        }

        let (sources, warnings) =
            resolver::resolve(&params.base_path, serial, &window, params.include_zip)?;
        result.diagnostics.extend(warnings);

        if sources.is_empty() {
            tracing::debug!(serial, "No logs found");
            result.serials_without_logs.push(serial.to_string());
            continue;
        }

        let vehicle_name = vehicle_for_serial(serial, &sources, cache, &mut result.diagnostics);

        for source in &sources {
            scan_source(
                source,
                &vehicle_name,
                classifier,
                &mut result.lines,
                &mut result.diagnostics,
            );
        }
    }

    tracing::info!(
        lines = result.lines.len(),
        without_logs = result.serials_without_logs.len(),
        diagnostics = result.diagnostics.len(),
        "Filter run complete"
    );
    Ok(result)
}

/// Classify every line of one source, appending keyword hits to `lines`.
/// Read failures are recorded as diagnostics and the source is skipped.
fn scan_source(
    source: &LogSource,
    vehicle_name: &str,
    classifier: &Classifier,
    lines: &mut Vec<ClassifiedLine>,
    diagnostics: &mut Vec<String>,
) {
    let content = match archive::read_lines(source) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(source = %source.display_name(), error = %e, "Skipping source");
            diagnostics.push(format!("Skipped '{}': {e}", source.display_name()));
            return;
        }
    };

    let display = source.display_name();
    for (idx, raw) in content.iter().enumerate() {
        let Some(rule) = classifier.matching_rule(raw) else {
            continue;
        };
        lines.push(ClassifiedLine {
            source_file: display.clone(),
            source_date: source.date,
            serial: source.serial.clone(),
            vehicle: vehicle_name.to_string(),
            line_number: (idx + 1) as u64,
            text: raw.trim().to_string(),
            tag: rule.tag,
            color: rule.color.clone(),
        });
    }
}

/// Vehicle name for a serial: cache lookup first; otherwise extract from
/// the most recent source's content and upsert the cache. The cache is an
/// accelerator only — a missing or failed cache never changes the result,
/// just the amount of reading.
fn vehicle_for_serial(
    serial: &str,
    sources: &[LogSource],
    cache: &mut VehicleCache,
    diagnostics: &mut Vec<String>,
) -> String {
    if let Some(name) = cache.lookup(serial) {
        return name.to_string();
    }

    let Some(latest) = vehicle::most_recent(sources) else {
        return vehicle::UNKNOWN_VEHICLE.to_string();
    };

    let content = match archive::read_lines(latest) {
        Ok(lines) => lines.join("\n"),
        Err(e) => {
            // Filename heuristics can still apply; record the read failure.
            diagnostics.push(format!(
                "Vehicle lookup could not read '{}': {e}",
                latest.display_name()
            ));
            String::new()
        }
    };

    let name = vehicle::extract(&latest.file_name(), &content);
    if name != vehicle::UNKNOWN_VEHICLE {
        cache.upsert(serial, &name, Utc::now());
    }
    name
}

// =============================================================================
// Tests
// =============================================================================
