use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors reading or writing the frontier snapshot
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Snapshot IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse snapshot: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The frontier left over at the end of a run
///
/// Stored as `{"links": [...]}`; order is the order the links will be
/// visited in by the next run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSnapshot {
    pub links: Vec<String>,
}

impl RunSnapshot {
    pub fn new(links: Vec<String>) -> Self {
        Self { links }
    }

    /// Loads the snapshot written by the previous run
    ///
    /// A missing file or one holding only whitespace is an empty snapshot
    /// (the first run). Anything else that does not parse is an error: the
    /// frontier it held would otherwise be lost silently.
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        Ok(serde_json::from_str(&content)?)
    }

    /// Replaces the snapshot on disk
    ///
    /// The document is written to a temporary file next to `path`, synced,
    /// and renamed over the old snapshot, so an interrupted save leaves the
    /// previous snapshot intact.
    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp_path = temp_path_for(path);
        let json = serde_json::to_vec_pretty(self)?;

        let mut file = File::create(&temp_path)?;
        file.write_all(&json)?;
        file.sync_all()?;
        drop(file);

        if let Err(e) = fs::rename(&temp_path, path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }

        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "snapshot".into());
    name.push(".tmp");
    path.with_file_name(name)
}
