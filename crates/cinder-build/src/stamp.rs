//! Per-target stamp records backing the incremental skip decision
//!
//! One JSON document per `(target, mode, platform)` triple, written only
//! after a target's invocation succeeded and its declared outputs were
//! verified. Read-only at the start of the next build.

use crate::environment::Environment;
use crate::error::{BuildError, BuildResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::warn;

/// Snapshot of a target's resolved inputs and outputs from its most recent
/// successful build.
///
/// Serializes as `{"inputs": [[absPath, mtimeMillis], ...], "outputs":
/// [absPath, ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stamp {
    /// `(absolute path, modification time in millis since the Unix epoch)`
    /// per input
    pub inputs: Vec<(String, u64)>,
    /// Absolute output paths
    pub outputs: Vec<String>,
}

impl Stamp {
    /// Read a stamp record, returning `None` when the file is missing.
    ///
    /// A stamp that exists but cannot be parsed (truncated write, format
    /// change) is discarded the same way: the caller re-runs the target and
    /// overwrites it.
    pub fn read(path: &Path) -> Option<Self> {
        let raw = fs::read_to_string(path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(stamp) => Some(stamp),
            Err(error) => {
                warn!(stamp = %path.display(), %error, "discarding unreadable stamp record");
                None
            }
        }
    }

    /// Serialize this record to `path`, creating the file and any missing
    /// parent directories
    pub fn write(&self, path: &Path) -> BuildResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
        }
        let json = serde_json::to_string(self)
            .map_err(|e| BuildError::StampError(e.to_string()))?;
        fs::write(path, json).map_err(|e| BuildError::io(path, e))
    }
}

/// Stamp file location for a target under the given environment:
/// `<stamp_dir>/<name>.<mode>.<platform>`
pub fn stamp_path(target_name: &str, env: &Environment) -> PathBuf {
    env.stamp_dir().join(format!(
        "{}.{}.{}",
        target_name,
        env.mode_name(),
        env.platform_name()
    ))
}

/// Modification time of `path` in milliseconds since the Unix epoch
pub(crate) fn mtime_millis(path: &Path) -> BuildResult<u64> {
    let metadata = fs::metadata(path).map_err(|e| BuildError::io(path, e))?;
    let modified = metadata.modified().map_err(|e| BuildError::io(path, e))?;
    let duration = modified.duration_since(UNIX_EPOCH).unwrap_or_default();
    Ok(duration.as_millis() as u64)
}
