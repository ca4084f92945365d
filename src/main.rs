// logsift - main.rs
//
// Command-line entry point. Handles:
// 1. CLI argument parsing and config merging (flags win over file)
// 2. Logging initialisation (debug mode support)
// 3. Vehicle cache loading / refresh
// 4. Filter run or daily summary, plus report file generation

use chrono::NaiveDate;
use clap::Parser;
use logsift::cache::VehicleCache;
use logsift::config::Config;
use logsift::core::classify::Classifier;
use logsift::core::engine::{self, RunParams};
use logsift::core::{report, summary};
use logsift::util::{constants, logging};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "logsift", version, about = "Keyword scanner for vehicle logger archives")]
struct Cli {
    /// Root directory holding the per-serial logger folders.
    #[arg(short = 'b', long = "base-path")]
    base_path: Option<PathBuf>,

    /// Logger serial to scan; repeatable. Falls back to the config file's
    /// default serials when omitted.
    #[arg(short = 's', long = "serial")]
    serials: Vec<String>,

    /// Restrict the scan to a single day (YYYY-MM-DD).
    #[arg(short = 'D', long = "date", conflicts_with_all = ["from", "to"])]
    date: Option<NaiveDate>,

    /// Earliest day to include (YYYY-MM-DD).
    #[arg(long = "from")]
    from: Option<NaiveDate>,

    /// Latest day to include (YYYY-MM-DD).
    #[arg(long = "to")]
    to: Option<NaiveDate>,

    /// Inspect `.ZIP` archives for inner `.LOG` entries.
    #[arg(long = "include-zip", conflicts_with = "no_zip")]
    include_zip: bool,

    /// Skip `.ZIP` archives even when the config enables them.
    #[arg(long = "no-zip")]
    no_zip: bool,

    /// Prefix for the generated report files.
    #[arg(short = 'o', long = "output-prefix")]
    output_prefix: Option<String>,

    /// Configuration file path.
    #[arg(short = 'c', long = "config", default_value = constants::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Write a starter configuration file and exit.
    #[arg(long = "create-config")]
    create_config: bool,

    /// Produce the per-vehicle daily summary instead of the flat reports.
    #[arg(long = "summary")]
    summary: bool,

    /// Include each vehicle's most recent log across the full store in the
    /// summary (implies --summary).
    #[arg(long = "latest-log")]
    latest_log: bool,

    /// Rebuild the serial -> vehicle cache from the newest logs and exit.
    #[arg(long = "refresh-cache")]
    refresh_cache: bool,

    /// Vehicle cache file path (defaults to the platform data directory).
    #[arg(long = "cache")]
    cache: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.debug);

    tracing::info!(
        version = constants::APP_VERSION,
        debug = cli.debug,
        "logsift starting"
    );

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> logsift::util::error::Result<()> {
    if cli.create_config {
        Config::write_default(&cli.config)?;
        println!("Wrote {}", cli.config.display());
        return Ok(());
    }

    let config = Config::load(&cli.config)?;
    let params = merge_params(&cli, &config)?;
    let mut cache = open_cache(cli.cache.clone());

    if cli.refresh_cache {
        let diagnostics = cache.refresh(&params.base_path, &params.serials, params.include_zip)?;
        for diag in &diagnostics {
            eprintln!("warning: {diag}");
        }
        if let Err(e) = cache.save() {
            tracing::warn!(error = %e, "Cache not persisted");
        }
        println!("Cache refreshed for {} serial(s)", params.serials.len());
        return Ok(());
    }

    let classifier = Classifier::new(config.keywords.clone(), config.case_sensitive);

    if cli.summary || cli.latest_log {
        let result = summary::summarize(&params, &classifier, &mut cache, cli.latest_log)?;
        for diag in &result.diagnostics {
            eprintln!("warning: {diag}");
        }
        let path = report::write_summary_file(&result, &params, &summary_title(&params))?;
        println!(
            "Summarised {} vehicle(s); report written to {}",
            result.vehicles.len(),
            path.display()
        );
    } else {
        let result = engine::run(&params, &classifier, &mut cache)?;
        for diag in &result.diagnostics {
            eprintln!("warning: {diag}");
        }
        let (text_path, html_path) = report::write_report_files(&result, &params)?;
        println!(
            "Found {} matching line(s); reports written to {} and {}",
            result.lines.len(),
            text_path.display(),
            html_path.display()
        );
    }

    if let Err(e) = cache.save() {
        tracing::warn!(error = %e, "Cache not persisted");
    }
    Ok(())
}

/// Heading for the summary page, naming the day when the window is one day.
fn summary_title(params: &RunParams) -> String {
    match (params.from, params.to) {
        (Some(from), Some(to)) if from == to => format!("Daily Vehicle Summary {from}"),
        _ => "Daily Vehicle Summary".to_string(),
    }
}

/// Merge CLI flags over the config file into engine parameters.
fn merge_params(cli: &Cli, config: &Config) -> logsift::util::error::Result<RunParams> {
    let base_path = cli
        .base_path
        .clone()
        .or_else(|| config.base_path.clone())
        .ok_or_else(|| {
            logsift::util::error::ConfigError::MissingField {
                field: "base_path",
            }
        })?;

    let serials = if cli.serials.is_empty() {
        config.default_serials.clone()
    } else {
        cli.serials.clone()
    };
    if serials.iter().all(|s| s.trim().is_empty()) {
        return Err(logsift::util::error::ConfigError::MissingField {
            field: "serials",
        }
        .into());
    }

    let (from, to) = match cli.date {
        Some(day) => (Some(day), Some(day)),
        None => (cli.from, cli.to),
    };

    let include_zip = if cli.include_zip {
        true
    } else if cli.no_zip {
        false
    } else {
        config.include_zip
    };

    Ok(RunParams {
        base_path,
        serials,
        from,
        to,
        include_zip,
        output_prefix: cli
            .output_prefix
            .clone()
            .unwrap_or_else(|| config.output_prefix.clone()),
    })
}

/// Open the vehicle cache, degrading to an in-memory cache when the file
/// cannot be used. The cache only accelerates vehicle naming, so failure
/// here never aborts a run.
fn open_cache(explicit: Option<PathBuf>) -> VehicleCache {
    let path = explicit.or_else(VehicleCache::default_path);
    match path {
        Some(path) => VehicleCache::load(path).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Vehicle cache unusable, continuing without");
            VehicleCache::in_memory()
        }),
        None => VehicleCache::in_memory(),
    }
}
