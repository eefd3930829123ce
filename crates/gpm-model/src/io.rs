//! JSON file I/O for snapshots and mappings.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Result, SnapshotError};
use crate::mapping::{IdentifierMapping, IssueLinkMapping};
use crate::snapshot::ProjectSnapshot;

/// Write `value` as pretty JSON.
///
/// Uses atomic write (temp file + rename) so readers never observe a
/// half-written file.
pub fn write_json_atomic<T: Serialize>(value: &T, what: &'static str, path: &Path) -> Result<()> {
    let mut bytes = serde_json::to_vec_pretty(value)
        .map_err(|source| SnapshotError::Serialization { what, source })?;
    bytes.push(b'\n');

    let temp_path = temp_path_for(path);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| SnapshotError::Io {
            operation: "create directory",
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let mut file = File::create(&temp_path).map_err(|e| SnapshotError::Io {
        operation: "create",
        path: temp_path.clone(),
        source: e,
    })?;

    file.write_all(&bytes).map_err(|e| SnapshotError::Io {
        operation: "write",
        path: temp_path.clone(),
        source: e,
    })?;

    file.sync_all().map_err(|e| SnapshotError::Io {
        operation: "sync",
        path: temp_path.clone(),
        source: e,
    })?;
    drop(file);

    fs::rename(&temp_path, path).map_err(|e| SnapshotError::AtomicWriteFailed {
        temp_path: temp_path.clone(),
        target_path: path.to_path_buf(),
        source: e,
    })?;

    tracing::debug!("Wrote {} to {}", what, path.display());
    Ok(())
}

/// Read and decode a JSON file. Decode failures are format errors.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).map_err(|e| SnapshotError::Io {
        operation: "read",
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_slice(&bytes).map_err(|e| SnapshotError::Format {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Load a snapshot and check it is safe to import.
pub fn load_snapshot(path: &Path) -> Result<ProjectSnapshot> {
    let snapshot: ProjectSnapshot = read_json(path)?;
    let problems = snapshot.validate();
    if !problems.is_empty() {
        return Err(SnapshotError::Format {
            path: path.to_path_buf(),
            reason: problems.join("; "),
        });
    }
    tracing::debug!(
        org = %snapshot.org,
        project_type = %snapshot.project_type(),
        projects = snapshot.project_count(),
        "Loaded snapshot from {}",
        path.display()
    );
    Ok(snapshot)
}

pub fn save_snapshot(snapshot: &ProjectSnapshot, path: &Path) -> Result<()> {
    write_json_atomic(snapshot, "snapshot", path)
}

pub fn load_mapping(path: &Path) -> Result<IdentifierMapping> {
    read_json(path)
}

pub fn save_mapping(mapping: &IdentifierMapping, path: &Path) -> Result<()> {
    write_json_atomic(mapping, "mapping", path)
}

pub fn save_issue_links(mapping: &IssueLinkMapping, path: &Path) -> Result<()> {
    write_json_atomic(mapping, "issue link mapping", path)
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}
