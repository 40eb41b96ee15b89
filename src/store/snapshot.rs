//! Whole-state snapshot file.
//!
//! Every successful mutation rewrites the file in full. The write goes to a
//! temporary sibling which is fsynced and then renamed over the target, so a
//! crash leaves either the previous or the new complete state on disk.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

use super::tables::Tables;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed snapshot {}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("inconsistent snapshot {}: {reason}", .path.display())]
    Inconsistent { path: PathBuf, reason: String },

    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

impl SnapshotError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Reads a snapshot. A missing file yields `Ok(None)`; anything unreadable,
/// unparsable or structurally inconsistent is an error.
pub fn load(path: &Path) -> Result<Option<Tables>, SnapshotError> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(SnapshotError::io(path, e)),
    };

    let tables: Tables = serde_json::from_slice(&data).map_err(|source| SnapshotError::Malformed {
        path: path.to_path_buf(),
        source,
    })?;

    tables
        .check_integrity()
        .map_err(|reason| SnapshotError::Inconsistent {
            path: path.to_path_buf(),
            reason,
        })?;

    Ok(Some(tables))
}

/// Atomically replaces the snapshot at `path`. Returns the number of bytes
/// written.
pub fn save(path: &Path, tables: &Tables) -> Result<usize, SnapshotError> {
    let data = serde_json::to_vec_pretty(tables)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|e| SnapshotError::io(&dir, e))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "snapshot".to_string());
    let tmp_path = dir.join(format!(".{file_name}.tmp-{}", Uuid::new_v4()));

    if let Err(e) = write_synced(&tmp_path, &data) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(SnapshotError::io(path, e));
    }

    fsync_dir(&dir)?;
    Ok(data.len())
}

fn write_synced(path: &Path, data: &[u8]) -> Result<(), SnapshotError> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path).map_err(|e| SnapshotError::io(path, e))?;
    file.write_all(data).map_err(|e| SnapshotError::io(path, e))?;
    file.sync_all().map_err(|e| SnapshotError::io(path, e))
}

#[cfg(unix)]
fn fsync_dir(dir: &Path) -> Result<(), SnapshotError> {
    File::open(dir)
        .and_then(|d| d.sync_all())
        .map_err(|e| SnapshotError::io(dir, e))
}

// Directories cannot be opened for syncing here; the rename is the best we get.
#[cfg(not(unix))]
fn fsync_dir(_dir: &Path) -> Result<(), SnapshotError> {
    Ok(())
}
