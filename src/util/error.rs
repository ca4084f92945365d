// logsift - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// All errors carry the path they relate to so diagnostics stay actionable
// when a run spans dozens of logger folders.
//
// Failure policy (mirrors the run semantics):
//   - ResolveError: fatal only for a bad base path; a missing serial folder
//     is NOT an error (the resolver returns an empty set).
//   - ReadError: never fatal for a run; callers record the source as
//     skipped and continue.
//   - ConfigError / CacheError / ReportError: fatal to the operation that
//     needs the file in question.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all logsift operations, categorised by the
/// subsystem that produced them.
#[derive(Debug)]
pub enum LogSiftError {
    /// Configuration loading or validation failed.
    Config(ConfigError),

    /// Logger directory resolution failed.
    Resolve(ResolveError),

    /// A log source could not be read.
    Read(ReadError),

    /// A report file could not be written.
    Report(ReportError),

    /// The vehicle cache could not be loaded or persisted.
    Cache(CacheError),
}

impl fmt::Display for LogSiftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Resolve(e) => write!(f, "Resolution error: {e}"),
            Self::Read(e) => write!(f, "Read error: {e}"),
            Self::Report(e) => write!(f, "Report error: {e}"),
            Self::Cache(e) => write!(f, "Cache error: {e}"),
        }
    }
}

impl std::error::Error for LogSiftError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Resolve(e) => Some(e),
            Self::Read(e) => Some(e),
            Self::Report(e) => Some(e),
            Self::Cache(e) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors related to the JSON configuration document.
#[derive(Debug)]
pub enum ConfigError {
    /// The configuration file exists but is not valid JSON.
    JsonParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// I/O error reading or writing the configuration file.
    Io { path: PathBuf, source: io::Error },

    /// A required setting is absent from both the CLI and the config file.
    MissingField { field: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::JsonParse { path, source } => {
                write!(f, "Failed to parse '{}': {source}", path.display())
            }
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
            Self::MissingField { field } => {
                write!(f, "No {field} given on the command line or in the config file")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::JsonParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            Self::MissingField { .. } => None,
        }
    }
}

impl From<ConfigError> for LogSiftError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Resolution errors
// ---------------------------------------------------------------------------

/// Errors related to mapping a base path + serial to log sources.
///
/// A serial with no matching folder is not represented here; the resolver
/// reports that as an empty source set so a multi-serial run continues.
#[derive(Debug)]
pub enum ResolveError {
    /// The base path does not exist.
    BaseNotFound { path: PathBuf },

    /// The base path exists but is not a directory.
    NotADirectory { path: PathBuf },
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BaseNotFound { path } => {
                write!(f, "Base path '{}' does not exist", path.display())
            }
            Self::NotADirectory { path } => {
                write!(f, "Base path '{}' is not a directory", path.display())
            }
        }
    }
}

impl std::error::Error for ResolveError {}

impl From<ResolveError> for LogSiftError {
    fn from(e: ResolveError) -> Self {
        Self::Resolve(e)
    }
}

// ---------------------------------------------------------------------------
// Read errors
// ---------------------------------------------------------------------------

/// Errors related to reading one log source (plain file or zip entry).
#[derive(Debug)]
pub enum ReadError {
    /// I/O error reading a plain file or archive.
    Io { path: PathBuf, source: io::Error },

    /// The archive could not be opened or is corrupt.
    ZipOpen {
        path: PathBuf,
        source: zip::result::ZipError,
    },

    /// The named entry does not exist inside the archive.
    EntryNotFound { archive: PathBuf, entry: String },
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "Cannot read '{}': {source}", path.display())
            }
            Self::ZipOpen { path, source } => {
                write!(f, "Cannot open archive '{}': {source}", path.display())
            }
            Self::EntryNotFound { archive, entry } => {
                write!(f, "Entry '{entry}' not found in '{}'", archive.display())
            }
        }
    }
}

impl std::error::Error for ReadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::ZipOpen { source, .. } => Some(source),
            Self::EntryNotFound { .. } => None,
        }
    }
}

impl From<ReadError> for LogSiftError {
    fn from(e: ReadError) -> Self {
        Self::Read(e)
    }
}

// ---------------------------------------------------------------------------
// Report errors
// ---------------------------------------------------------------------------

/// Errors related to writing the report artefacts.
#[derive(Debug)]
pub enum ReportError {
    /// I/O error writing a report file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "Cannot write report '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
        }
    }
}

impl From<ReportError> for LogSiftError {
    fn from(e: ReportError) -> Self {
        Self::Report(e)
    }
}

// ---------------------------------------------------------------------------
// Cache errors
// ---------------------------------------------------------------------------

/// Errors related to the persisted serial -> vehicle cache.
#[derive(Debug)]
pub enum CacheError {
    /// The cache file exists but is not valid JSON.
    JsonParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// I/O error reading or writing the cache file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::JsonParse { path, source } => {
                write!(f, "Failed to parse cache '{}': {source}", path.display())
            }
            Self::Io { path, source } => {
                write!(f, "Cache I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::JsonParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
        }
    }
}

impl From<CacheError> for LogSiftError {
    fn from(e: CacheError) -> Self {
        Self::Cache(e)
    }
}

/// Convenience type alias for logsift results.
pub type Result<T> = std::result::Result<T, LogSiftError>;
