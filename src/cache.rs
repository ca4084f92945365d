// logsift - cache.rs
//
// Disk-persisted serial -> vehicle name cache. Purely an accelerator:
// its absence changes lookup speed, never filtering correctness.
//
// Persistence contract is read/merge/write with last-writer-wins per
// entry (newer `last_seen` survives). Concurrent writers are the caller's
// responsibility to avoid; the engine itself never spawns background
// refreshes — `refresh` is an explicit, synchronous operation.

use crate::core::{archive, resolver, vehicle};
use crate::core::resolver::DateWindow;
use crate::util::constants;
use crate::util::error::{CacheError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// One cached mapping for a serial.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Vehicle display name.
    pub vehicle: String,

    /// When this mapping was last confirmed.
    pub last_seen: DateTime<Utc>,
}

/// The serial -> vehicle cache. Backed by a JSON file when constructed
/// with `load`; `in_memory` gives a non-persisted cache for one-shot runs
/// and tests.
#[derive(Debug)]
pub struct VehicleCache {
    path: Option<PathBuf>,
    entries: HashMap<String, CacheEntry>,
}

impl VehicleCache {
    /// A cache with no backing file; `save` is a no-op.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: HashMap::new(),
        }
    }

    /// Load the cache from `path`. A missing file yields an empty cache;
    /// malformed JSON is a CacheError.
    pub fn load(path: PathBuf) -> std::result::Result<Self, CacheError> {
        let entries = if path.exists() {
            read_entries(&path)?
        } else {
            HashMap::new()
        };
        tracing::debug!(path = %path.display(), entries = entries.len(), "Cache loaded");
        Ok(Self {
            path: Some(path),
            entries,
        })
    }

    /// Platform-appropriate default location for the cache file.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", constants::APP_ID)
            .map(|dirs| dirs.data_dir().join(constants::CACHE_FILE_NAME))
    }

    /// Synchronous lookup of a cached vehicle name.
    pub fn lookup(&self, serial: &str) -> Option<&str> {
        self.entries.get(serial).map(|e| e.vehicle.as_str())
    }

    /// Insert or replace the mapping for a serial.
    pub fn upsert(&mut self, serial: &str, vehicle: &str, last_seen: DateTime<Utc>) {
        self.entries.insert(
            serial.to_string(),
            CacheEntry {
                vehicle: vehicle.to_string(),
                last_seen,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Persist the cache: re-read the backing file, merge entry-wise with
    /// the in-memory state (newer `last_seen` wins), and write the result.
    pub fn save(&self) -> std::result::Result<(), CacheError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let mut merged = if path.exists() {
            read_entries(path).unwrap_or_else(|e| {
                // A cache too corrupt to merge is rebuilt from memory.
                tracing::warn!(error = %e, "Discarding unreadable cache file");
                HashMap::new()
            })
        } else {
            HashMap::new()
        };

        for (serial, entry) in &self.entries {
            match merged.get(serial) {
                Some(existing) if existing.last_seen > entry.last_seen => {}
                _ => {
                    merged.insert(serial.clone(), entry.clone());
                }
            }
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CacheError::Io {
                path: path.clone(),
                source: e,
            })?;
        }
        let text =
            serde_json::to_string_pretty(&merged).map_err(|e| CacheError::JsonParse {
                path: path.clone(),
                source: e,
            })?;
        std::fs::write(path, text).map_err(|e| CacheError::Io {
            path: path.clone(),
            source: e,
        })?;
        tracing::debug!(path = %path.display(), entries = merged.len(), "Cache saved");
        Ok(())
    }

    /// Recompute the vehicle name for each serial from its most recent log
    /// and upsert the result. Returns non-fatal per-serial diagnostics;
    /// only a bad base path is an error.
    pub fn refresh(
        &mut self,
        base: &Path,
        serials: &[String],
        include_zip: bool,
    ) -> Result<Vec<String>> {
        let mut diagnostics = Vec::new();
        let window = DateWindow::unbounded();

        for serial in serials {
            let serial = serial.trim();
            if serial.is_empty() {
                continue;
            }
            let (sources, warnings) = resolver::resolve(base, serial, &window, include_zip)?;
            diagnostics.extend(warnings);

            let Some(latest) = vehicle::most_recent(&sources) else {
                diagnostics.push(format!("{serial}: no logs to derive a vehicle name from"));
                continue;
            };
            let content = match archive::read_lines(latest) {
                Ok(lines) => lines.join("\n"),
                Err(e) => {
                    diagnostics.push(format!("{serial}: {e}"));
                    String::new()
                }
            };
            let name = vehicle::extract(&latest.file_name(), &content);
            if name != vehicle::UNKNOWN_VEHICLE {
                self.upsert(serial, &name, Utc::now());
            }
        }
        Ok(diagnostics)
    }
}

fn read_entries(path: &Path) -> std::result::Result<HashMap<String, CacheEntry>, CacheError> {
    let text = std::fs::read_to_string(path).map_err(|e| CacheError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&text).map_err(|e| CacheError::JsonParse {
        path: path.to_path_buf(),
        source: e,
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_lookup_and_upsert() {
        let mut cache = VehicleCache::in_memory();
        assert_eq!(cache.lookup("1"), None);
        cache.upsert("1", "Miguel", ts(100));
        assert_eq!(cache.lookup("1"), Some("Miguel"));
        cache.upsert("1", "Torne", ts(200));
        assert_eq!(cache.lookup("1"), Some("Torne"));
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");

        let mut cache = VehicleCache::load(path.clone()).unwrap();
        cache.upsert("82902554", "Miguel", ts(100));
        cache.save().unwrap();

        let reloaded = VehicleCache::load(path).unwrap();
        assert_eq!(reloaded.lookup("82902554"), Some("Miguel"));
    }

    #[test]
    fn test_save_merges_newer_disk_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");

        // Another writer persisted a newer mapping for serial 1.
        let mut other = VehicleCache::load(path.clone()).unwrap();
        other.upsert("1", "Newer", ts(500));
        other.upsert("2", "Keep", ts(100));
        other.save().unwrap();

        let mut mine = VehicleCache::in_memory();
        mine.path = Some(path.clone());
        mine.upsert("1", "Older", ts(100));
        mine.upsert("3", "Mine", ts(100));
        mine.save().unwrap();

        let merged = VehicleCache::load(path).unwrap();
        assert_eq!(merged.lookup("1"), Some("Newer"), "newer last_seen wins");
        assert_eq!(merged.lookup("2"), Some("Keep"));
        assert_eq!(merged.lookup("3"), Some("Mine"));
    }

    #[test]
    fn test_corrupt_cache_file_is_error_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "{ nope").unwrap();
        assert!(matches!(
            VehicleCache::load(path),
            Err(CacheError::JsonParse { .. })
        ));
    }

    #[test]
    fn test_refresh_derives_names() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("ipelog2_42");
        std::fs::create_dir(&folder).unwrap();
        std::fs::write(
            folder.join("Viskan_20251112_T090000_LOG_1.LOG"),
            "anything\n",
        )
        .unwrap();

        let mut cache = VehicleCache::in_memory();
        let diagnostics = cache
            .refresh(dir.path(), &["42".to_string(), "404".to_string()], false)
            .unwrap();
        assert_eq!(cache.lookup("42"), Some("Viskan"));
        assert_eq!(cache.lookup("404"), None);
        assert_eq!(diagnostics.len(), 1, "missing serial reported, not fatal");
    }
}
