//! Once-per-boot guard.
//!
//! The marker lives on a filesystem that is emptied at boot (`/dev/shm` by
//! default), so its presence means a report already went out since the last
//! boot. The marker is only a flag, not a lock: two runs started before
//! either writes it will both report.

use crate::config::RunConfig;
use crate::error::{ReporterError, Result};
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

/// Marker-file guard for one script name.
#[derive(Debug, Clone)]
pub struct BootGuard {
    marker: PathBuf,
    buffer: PathBuf,
}

impl BootGuard {
    /// Create a guard for the given marker and buffer paths.
    pub fn new(marker: impl Into<PathBuf>, buffer: impl Into<PathBuf>) -> Self {
        Self {
            marker: marker.into(),
            buffer: buffer.into(),
        }
    }

    /// Create a guard using the paths derived from a run configuration.
    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(config.marker_path(), config.buffer_path())
    }

    /// Marker file path.
    pub fn marker_path(&self) -> &Path {
        &self.marker
    }

    /// Buffer file path.
    pub fn buffer_path(&self) -> &Path {
        &self.buffer
    }

    /// Whether a run already completed since boot.
    pub fn has_run(&self) -> bool {
        self.marker.exists()
    }

    /// When the marker was written, if it exists.
    pub fn marked_at(&self) -> Result<Option<SystemTime>> {
        match fs::metadata(&self.marker) {
            Ok(meta) => Ok(Some(meta.modified()?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ReporterError::guard_error(format!(
                "cannot stat marker {}: {}",
                self.marker.display(),
                e
            ))),
        }
    }

    /// Record a completed run: drop the buffer file and write the empty marker.
    pub fn mark_done(&self) -> Result<()> {
        match fs::remove_file(&self.buffer) {
            Ok(()) => debug!("Removed buffer {}", self.buffer.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(ReporterError::guard_error(format!(
                    "cannot remove buffer {}: {}",
                    self.buffer.display(),
                    e
                )))
            }
        }

        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.marker)
            .map_err(|e| {
                ReporterError::guard_error(format!(
                    "cannot create marker {}: {}",
                    self.marker.display(),
                    e
                ))
            })?;
        debug!("Wrote marker {}", self.marker.display());

        Ok(())
    }
}
