//! # Process Marker
//!
//! A file that exists while the collector runs, for external supervisors.
//! Holds an advisory `fs2` lock and is removed on drop (RAII).

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use shared_types::{Classify, ErrorClass};
use thiserror::Error;
use tracing::{debug, warn};

/// Marker file contents.
pub const MARKER_CONTENTS: &str = "started";

#[derive(Debug, Error)]
pub enum MarkerError {
    /// Marker file could not be created
    #[error("failed to create marker {path}: {source}")]
    CreateFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Another collector holds the marker lock
    #[error("marker {0} is locked by another process")]
    AlreadyLocked(PathBuf),

    /// Marker contents could not be written
    #[error("failed to write marker {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Marker failures are environment problems; `main` logs them and carries on.
impl Classify for MarkerError {
    fn class(&self) -> ErrorClass {
        ErrorClass::Fatal
    }
}

/// Locked marker file, removed when dropped.
#[derive(Debug)]
pub struct ProcessMarker {
    /// Kept open to hold the lock
    file: File,
    path: PathBuf,
}

impl ProcessMarker {
    /// Create `path`, lock it and write [`MARKER_CONTENTS`].
    pub fn create(path: &Path) -> Result<Self, MarkerError> {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(|source| MarkerError::CreateFailed {
                path: path.to_path_buf(),
                source,
            })?;

        if file.try_lock_exclusive().is_err() {
            return Err(MarkerError::AlreadyLocked(path.to_path_buf()));
        }

        let write = |file: &mut File| -> io::Result<()> {
            file.set_len(0)?;
            file.write_all(MARKER_CONTENTS.as_bytes())?;
            file.sync_all()
        };
        write(&mut file).map_err(|source| MarkerError::WriteFailed {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(path = %path.display(), "[runtime] process marker written");
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ProcessMarker {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "[runtime] failed to remove process marker");
        }
        let _ = FileExt::unlock(&self.file);
    }
}
