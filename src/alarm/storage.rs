//! Alarm document persistence.
//!
//! The document is a JSON array of alarm objects. Every save writes the full
//! collection to a temporary file in the target directory, syncs it, then
//! renames it over the canonical file, so the canonical file is always either
//! absent or a complete snapshot.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tracing::{debug, warn};

use super::error::{AlarmError, Result};
use crate::types::Alarm;

/// Loads the alarm collection from `path`.
///
/// A missing, unreadable or malformed document yields an empty collection.
/// The device must still boot, so none of these are errors. Records are
/// decoded one at a time: an entry that is not an alarm object is skipped
/// and the rest still load.
pub fn load(path: &Path) -> Vec<Alarm> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("No alarm document at {:?}, starting empty", path);
            return Vec::new();
        }
        Err(e) => {
            warn!("Failed to read alarm document {:?}: {}", path, e);
            return Vec::new();
        }
    };

    let records = match serde_json::from_str::<Vec<serde_json::Value>>(&contents) {
        Ok(records) => records,
        Err(e) => {
            warn!("Alarm document {:?} is malformed, ignoring it: {}", path, e);
            return Vec::new();
        }
    };

    let alarms: Vec<Alarm> = records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match serde_json::from_value(record) {
            Ok(alarm) => Some(alarm),
            Err(e) => {
                warn!("Skipping alarm record {} in {:?}: {}", index, path, e);
                None
            }
        })
        .collect();
    debug!("Loaded {} alarm(s) from {:?}", alarms.len(), path);
    alarms
}

/// Persists the full collection to `path` with write-then-rename.
///
/// # Errors
///
/// Returns `AlarmError::Serialize` if encoding fails and
/// `AlarmError::Storage` if `path` has no file name or the directory,
/// temporary file, sync or rename fails. On error the canonical file is left
/// untouched.
pub fn save(path: &Path, alarms: &[Alarm]) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            AlarmError::Storage(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("alarm document path {:?} has no file name", path),
            ))
        })?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(AlarmError::Storage)?;

    let json = serde_json::to_vec(alarms).map_err(AlarmError::Serialize)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(&format!(".{}.", file_name))
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(AlarmError::Storage)?;

    tmp.write_all(&json).map_err(AlarmError::Storage)?;
    tmp.flush().map_err(AlarmError::Storage)?;
    tmp.as_file().sync_all().map_err(AlarmError::Storage)?;
    tmp.persist(path).map_err(|e| AlarmError::Storage(e.error))?;

    sync_dir(dir);
    debug!("Persisted {} alarm(s) to {:?}", alarms.len(), path);
    Ok(())
}

/// Flushes the directory entry so the rename itself is durable.
#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Err(e) = fs::File::open(dir).and_then(|d| d.sync_all()) {
        debug!("Directory sync of {:?} failed: {}", dir, e);
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}
