// logsift - config.rs
//
// JSON configuration document. Every recognised field is optional with a
// documented default; unknown keys are ignored for forward compatibility.
// A missing file falls back to built-in defaults; a malformed file is a
// fatal ConfigError — the caller decides whether to abort or retry with
// defaults before invoking the engine.

use crate::core::model::{KeywordRule, Tag};
use crate::util::constants;
use crate::util::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The configuration document consumed by the engine's callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root directory holding the per-serial logger folders.
    pub base_path: Option<PathBuf>,

    /// Serials scanned when the caller passes none explicitly.
    pub default_serials: Vec<String>,

    /// Ordered keyword rules; order is the classification tie-break.
    pub keywords: Vec<KeywordRule>,

    /// Whether `.ZIP` archives are inspected for inner `.LOG` entries.
    pub include_zip: bool,

    /// Prefix for the generated report files.
    pub output_prefix: String,

    /// Keyword matching is case-sensitive unless this is set to false.
    pub case_sensitive: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_path: None,
            default_serials: Vec::new(),
            keywords: default_rules(),
            include_zip: true,
            output_prefix: constants::DEFAULT_OUTPUT_PREFIX.to_string(),
            case_sensitive: true,
        }
    }
}

/// Built-in rule set. "mismatch" precedes "match" deliberately: the latter
/// is a substring of the former and first-match order is the tie-break.
pub fn default_rules() -> Vec<KeywordRule> {
    vec![
        KeywordRule {
            pattern: "mismatch".to_string(),
            tag: Tag::Mismatch,
            color: constants::COLOR_MISMATCH.to_string(),
        },
        KeywordRule {
            pattern: "match".to_string(),
            tag: Tag::Match,
            color: constants::COLOR_MATCH.to_string(),
        },
        KeywordRule {
            pattern: "Configuration file:".to_string(),
            tag: Tag::Config,
            color: constants::COLOR_CONFIG.to_string(),
        },
        KeywordRule {
            pattern: "CCP: EPK".to_string(),
            tag: Tag::Match,
            color: constants::COLOR_MATCH.to_string(),
        },
    ]
}

impl Config {
    /// Load a configuration file. A missing file yields the defaults;
    /// malformed JSON is fatal.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|e| ConfigError::JsonParse {
            path: path.to_path_buf(),
            source: e,
        })?;
        tracing::debug!(path = %path.display(), rules = config.keywords.len(), "Config loaded");
        Ok(config)
    }

    /// Write a starter configuration file with the built-in defaults.
    pub fn write_default(path: &Path) -> Result<(), ConfigError> {
        let text = serde_json::to_string_pretty(&Self::default())
            .map_err(|e| ConfigError::JsonParse {
                path: path.to_path_buf(),
                source: e,
            })?;
        std::fs::write(path, text).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
