// logsift - core/archive.rs
//
// Uniform line access for log sources, whether stored as a plain file or
// as an entry inside a zip archive. Each call reopens the source; nothing
// is cached between calls.
//
// Decoding is tolerant: logger firmware occasionally emits stray bytes, so
// content is decoded lossily rather than failing the whole source. A
// corrupt archive or missing entry is a `ReadError` the caller records as
// a skipped source — never fatal for a run.

use crate::core::model::{LogSource, SourceKind};
use crate::util::constants;
use crate::util::error::ReadError;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Read all text lines of a source. Plain files are read from disk;
/// archive entries are located by name and decompressed in memory.
pub fn read_lines(source: &LogSource) -> Result<Vec<String>, ReadError> {
    match &source.kind {
        SourceKind::Plain => read_plain(&source.path),
        SourceKind::ZipEntry { entry } => read_zip_entry(&source.path, entry),
    }
}

/// Read a plain file with lossy UTF-8 decoding.
fn read_plain(path: &Path) -> Result<Vec<String>, ReadError> {
    let bytes = std::fs::read(path).map_err(|e| ReadError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(to_lines(&bytes))
}

/// Read one named entry out of a zip archive with lossy UTF-8 decoding.
fn read_zip_entry(archive_path: &Path, entry: &str) -> Result<Vec<String>, ReadError> {
    let file = File::open(archive_path).map_err(|e| ReadError::Io {
        path: archive_path.to_path_buf(),
        source: e,
    })?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| ReadError::ZipOpen {
        path: archive_path.to_path_buf(),
        source: e,
    })?;

    let mut entry_file = match archive.by_name(entry) {
        Ok(f) => f,
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(ReadError::EntryNotFound {
                archive: archive_path.to_path_buf(),
                entry: entry.to_string(),
            })
        }
        Err(e) => {
            return Err(ReadError::ZipOpen {
                path: archive_path.to_path_buf(),
                source: e,
            })
        }
    };

    let mut bytes = Vec::new();
    entry_file
        .read_to_end(&mut bytes)
        .map_err(|e| ReadError::Io {
            path: archive_path.to_path_buf(),
            source: e,
        })?;
    Ok(to_lines(&bytes))
}

/// List the `.LOG`-like entry names inside an archive (case-insensitive
/// extension match). Used by the resolver to expand `.ZIP` candidates.
pub fn zip_log_entries(archive_path: &Path) -> Result<Vec<String>, ReadError> {
    let file = File::open(archive_path).map_err(|e| ReadError::Io {
        path: archive_path.to_path_buf(),
        source: e,
    })?;
    let archive = zip::ZipArchive::new(file).map_err(|e| ReadError::ZipOpen {
        path: archive_path.to_path_buf(),
        source: e,
    })?;

    let suffix = format!(".{}", constants::LOG_EXTENSION);
    let mut entries: Vec<String> = archive
        .file_names()
        .filter(|name| name.to_uppercase().ends_with(&suffix))
        .map(str::to_string)
        .collect();
    entries.sort();
    Ok(entries)
}

/// Split raw bytes into trimmed-of-terminator lines, replacing undecodable
/// bytes instead of failing.
fn to_lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(str::to_string)
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
