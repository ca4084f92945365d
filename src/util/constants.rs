// logsift - util/constants.rs
//
// Single source of truth for named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "logsift";

/// Application identifier used for the platform data directory.
pub const APP_ID: &str = "logsift";

/// Current application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Resolution
// =============================================================================

/// Uppercased extension of plain readout log files.
pub const LOG_EXTENSION: &str = "LOG";

/// Uppercased extension of packaged readout archives.
pub const ZIP_EXTENSION: &str = "ZIP";

/// Maximum directory recursion depth inside one serial folder. Logger
/// folders are shallow in practice; the bound guards against cyclic mounts.
pub const MAX_SCAN_DEPTH: usize = 6;

// =============================================================================
// Defaults
// =============================================================================

/// Default prefix for the generated report files.
pub const DEFAULT_OUTPUT_PREFIX: &str = "filtered_log_results";

/// Default configuration file name (JSON, resolved against the working directory).
pub const DEFAULT_CONFIG_FILE: &str = "logsift_config.json";

/// File name of the persisted serial -> vehicle cache.
pub const CACHE_FILE_NAME: &str = "vehicle_cache.json";

/// Default tracing level when neither RUST_LOG nor --debug is given.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// =============================================================================
// Report colours (defaults for the built-in keyword rules)
// =============================================================================

pub const COLOR_MATCH: &str = "#008800";
pub const COLOR_MISMATCH: &str = "#CC0000";
pub const COLOR_CONFIG: &str = "#0066CC";
