//! Persists encoded sidecars and stamps them with the upload date.

use std::fs::{self, File, FileTimes};
use std::path::Path;
use std::time::SystemTime;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::artifacts::ArtifactKind;

/// Whether a written artifact carries the upload timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileTime {
    Stamped,
    /// No timestamp was given, or setting it failed after the contents were
    /// already on disk.
    Unchanged,
}

pub struct ArtifactWriter {
    timestamp: Option<SystemTime>,
}

impl ArtifactWriter {
    /// `timestamp` becomes both mtime and atime of every file written. With
    /// `None` the files keep the time they were written at.
    pub fn new(timestamp: Option<SystemTime>) -> Self {
        Self { timestamp }
    }

    /// Errors only when the contents could not be written. A failure to set
    /// the file time is logged and reported as [`FileTime::Unchanged`].
    pub fn write(&self, kind: ArtifactKind, path: &Path, contents: &[u8]) -> Result<FileTime> {
        fs::write(path, contents).with_context(|| format!("writing {}", path.display()))?;
        info!(artifact = %kind, path = %path.display(), "wrote artifact");
        let Some(timestamp) = self.timestamp else {
            return Ok(FileTime::Unchanged);
        };
        match stamp(path, timestamp) {
            Ok(()) => Ok(FileTime::Stamped),
            Err(err) => {
                warn!(artifact = %kind, path = %path.display(), "{err:#}");
                Ok(FileTime::Unchanged)
            }
        }
    }
}

fn stamp(path: &Path, timestamp: SystemTime) -> Result<()> {
    let file = File::options()
        .write(true)
        .open(path)
        .with_context(|| format!("opening {} to set its time", path.display()))?;
    let times = FileTimes::new()
        .set_accessed(timestamp)
        .set_modified(timestamp);
    file.set_times(times)
        .with_context(|| format!("setting file time on {}", path.display()))
}
