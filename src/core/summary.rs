// logsift - core/summary.rs
//
// Cross-vehicle daily summary: runs the filter pipeline over a date
// window, then groups classified lines per vehicle with per-vehicle
// de-duplication of configuration and protocol lines.
//
// "No logs" semantics differ from the plain filter run on purpose: a
// serial lands on the summary's no-logs list when it produced zero
// classified lines across the ENTIRE window, even if files existed.

use crate::cache::VehicleCache;
use crate::core::classify::Classifier;
use crate::core::engine::{self, RunParams};
use crate::core::model::{dedup_key, SummaryResult, Tag, VehicleGroup};
use crate::core::resolver::{self, DateWindow};
use crate::core::vehicle;
use crate::util::error::Result;
use std::collections::{HashMap, HashSet};

/// Build the per-vehicle summary for the window described by `params`.
///
/// When `include_latest` is set, each vehicle group additionally carries
/// the name of its most recent log file across the FULL store, not limited
/// to the window (the "latest available log" column).
pub fn summarize(
    params: &RunParams,
    classifier: &Classifier,
    cache: &mut VehicleCache,
    include_latest: bool,
) -> Result<SummaryResult> {
    let run = engine::run(params, classifier, cache)?;

    let mut groups: Vec<VehicleGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    // Serial -> vehicle, as resolved during the run; drives the latest-log
    // column and the no-logs list.
    let mut serial_vehicle: HashMap<String, String> = HashMap::new();

    for line in &run.lines {
        serial_vehicle
            .entry(line.serial.clone())
            .or_insert_with(|| line.vehicle.clone());

        let key = dedup_key(&line.vehicle);
        let idx = *index.entry(key).or_insert_with(|| {
            groups.push(VehicleGroup::new(&line.vehicle));
            groups.len() - 1
        });
        let group = &mut groups[idx];

        group.sources.insert(line.source_file.clone());
        match line.tag {
            Tag::Config => {
                group.add_config(&line.text);
            }
            Tag::Match | Tag::Mismatch => {
                group.add_protocol(&line.text, line.tag);
            }
            Tag::Plain => {}
        }
    }

    let mut diagnostics = run.diagnostics;

    if include_latest {
        attach_latest_sources(params, &serial_vehicle, &mut groups, &index, &mut diagnostics)?;
    }

    // Vehicles with a mismatch first, then alphabetically.
    groups.sort_by(|a, b| {
        b.has_mismatch
            .cmp(&a.has_mismatch)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });

    let with_lines: HashSet<&String> = serial_vehicle.keys().collect();
    let serials_without_logs = params
        .serials
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && !with_lines.contains(s))
        .collect();

    Ok(SummaryResult {
        vehicles: groups,
        serials_without_logs,
        diagnostics,
    })
}

/// Resolve each contributing serial over an unbounded window and record
/// the most recent source name on the serial's vehicle group.
fn attach_latest_sources(
    params: &RunParams,
    serial_vehicle: &HashMap<String, String>,
    groups: &mut [VehicleGroup],
    index: &HashMap<String, usize>,
    diagnostics: &mut Vec<String>,
) -> Result<()> {
    // (date, name) per group so a later serial only wins with newer data.
    let mut best: HashMap<usize, (Option<chrono::NaiveDate>, String)> = HashMap::new();

    for (serial, vehicle_name) in serial_vehicle {
        let Some(&idx) = index.get(&dedup_key(vehicle_name)) else {
            continue;
        };
        let (sources, warnings) = resolver::resolve(
            &params.base_path,
            serial,
            &DateWindow::unbounded(),
            params.include_zip,
        )?;
        diagnostics.extend(warnings);

        if let Some(latest) = vehicle::most_recent(&sources) {
            let candidate = (latest.date, latest.display_name());
            let slot = best.entry(idx).or_insert_with(|| candidate.clone());
            if candidate.0 > slot.0 || (candidate.0 == slot.0 && candidate.1 > slot.1) {
                *slot = candidate;
            }
        }
    }

    for (idx, (_, name)) in best {
        groups[idx].latest_source = Some(name);
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::KeywordRule;
    use std::fs;
    use std::path::Path;

    fn classifier() -> Classifier {
        Classifier::new(
            vec![
                KeywordRule {
                    pattern: "mismatch".to_string(),
                    tag: Tag::Mismatch,
                    color: "#CC0000".to_string(),
                },
                KeywordRule {
                    pattern: "match".to_string(),
                    tag: Tag::Match,
                    color: "#008800".to_string(),
                },
                KeywordRule {
                    pattern: "Configuration file:".to_string(),
                    tag: Tag::Config,
                    color: "#0066CC".to_string(),
                },
            ],
            true,
        )
    }

    fn params(base: &Path, serials: &[&str], day: &str) -> RunParams {
        let date = chrono::NaiveDate::parse_from_str(day, "%Y-%m-%d").ok();
        RunParams {
            base_path: base.to_path_buf(),
            serials: serials.iter().map(|s| s.to_string()).collect(),
            from: date,
            to: date,
            include_zip: true,
            output_prefix: "out".to_string(),
        }
    }

    fn write_log(base: &Path, folder: &str, file: &str, content: &str) {
        let dir = base.join(folder);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(file), content).unwrap();
    }

    #[test]
    fn test_dedup_is_per_vehicle_not_global() {
        let dir = tempfile::tempdir().unwrap();
        let config_line = "Configuration file: Shared_BEV3_r1.icf\n";
        // Two serials, two vehicles, identical config line content. The
        // config-line strategy names both vehicles "Shared", so force
        // distinct vehicles via the cache instead.
        write_log(
            dir.path(),
            "ipelog2_100",
            "Miguel_20251112_T090000_LOG_1.LOG",
            config_line,
        );
        write_log(
            dir.path(),
            "ipelog2_200",
            "Torne_20251112_T090000_LOG_1.LOG",
            config_line,
        );

        let mut cache = VehicleCache::in_memory();
        cache.upsert("100", "Miguel", chrono::Utc::now());
        cache.upsert("200", "Torne", chrono::Utc::now());

        let summary = summarize(
            &params(dir.path(), &["100", "200"], "2025-11-12"),
            &classifier(),
            &mut cache,
            false,
        )
        .unwrap();

        assert_eq!(summary.vehicles.len(), 2);
        for group in &summary.vehicles {
            assert_eq!(
                group.config_lines.len(),
                1,
                "each vehicle keeps its own copy exactly once"
            );
        }
    }

    #[test]
    fn test_same_line_from_two_sources_folded_once() {
        let dir = tempfile::tempdir().unwrap();
        let content = "Configuration file: Miguel_BEV3_r1.icf\nProtocols: CCP match\n";
        write_log(
            dir.path(),
            "ipelog2_100",
            "Miguel_20251112_T090000_LOG_1.LOG",
            content,
        );
        write_log(
            dir.path(),
            "ipelog2_100",
            "Miguel_20251112_T110000_LOG_2.LOG",
            content,
        );

        let mut cache = VehicleCache::in_memory();
        let summary = summarize(
            &params(dir.path(), &["100"], "2025-11-12"),
            &classifier(),
            &mut cache,
            false,
        )
        .unwrap();

        assert_eq!(summary.vehicles.len(), 1);
        let group = &summary.vehicles[0];
        assert_eq!(group.config_lines.len(), 1);
        assert_eq!(group.protocol_lines.len(), 1);
        assert_eq!(group.sources.len(), 2, "both sources still listed");
    }

    #[test]
    fn test_mismatch_vehicles_sort_first() {
        let dir = tempfile::tempdir().unwrap();
        write_log(
            dir.path(),
            "ipelog2_100",
            "Alpha_20251112_T090000_LOG_1.LOG",
            "Protocols: CCP match\n",
        );
        write_log(
            dir.path(),
            "ipelog2_200",
            "Zulu_20251112_T090000_LOG_1.LOG",
            "Protocols: CCP mismatch\n",
        );

        let mut cache = VehicleCache::in_memory();
        let summary = summarize(
            &params(dir.path(), &["100", "200"], "2025-11-12"),
            &classifier(),
            &mut cache,
            false,
        )
        .unwrap();

        let names: Vec<_> = summary.vehicles.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Zulu", "Alpha"], "mismatch vehicle first");
    }

    #[test]
    fn test_no_logs_means_zero_classified_lines() {
        let dir = tempfile::tempdir().unwrap();
        write_log(
            dir.path(),
            "ipelog2_100",
            "Alpha_20251112_T090000_LOG_1.LOG",
            "Protocols: CCP match\n",
        );
        // Serial 200 has a file but no keyword hits; serial 300 has no folder.
        write_log(
            dir.path(),
            "ipelog2_200",
            "Beta_20251112_T090000_LOG_1.LOG",
            "quiet boot, nothing to report\n",
        );

        let mut cache = VehicleCache::in_memory();
        let summary = summarize(
            &params(dir.path(), &["100", "200", "300"], "2025-11-12"),
            &classifier(),
            &mut cache,
            false,
        )
        .unwrap();

        let mut missing = summary.serials_without_logs.clone();
        missing.sort();
        assert_eq!(missing, vec!["200".to_string(), "300".to_string()]);
    }

    #[test]
    fn test_latest_source_spans_full_store() {
        let dir = tempfile::tempdir().unwrap();
        write_log(
            dir.path(),
            "ipelog2_100",
            "Alpha_20251112_T090000_LOG_1.LOG",
            "Protocols: CCP match\n",
        );
        // Newer file outside the summarised day.
        write_log(
            dir.path(),
            "ipelog2_100",
            "Alpha_20251120_T090000_LOG_1.LOG",
            "nothing relevant\n",
        );

        let mut cache = VehicleCache::in_memory();
        let summary = summarize(
            &params(dir.path(), &["100"], "2025-11-12"),
            &classifier(),
            &mut cache,
            true,
        )
        .unwrap();

        assert_eq!(
            summary.vehicles[0].latest_source.as_deref(),
            Some("Alpha_20251120_T090000_LOG_1.LOG")
        );
    }
}
