//! Categorized errors for the snapshot-diff engine.
//!
//! Per-file failures (unreadable entries during a scan, copy failures while
//! staging) are collected and surfaced in the run summary; the variants here
//! cover the failures that change control flow for a whole folder or
//! operation.

use std::fmt;
use std::path::PathBuf;

/// Categorized backup engine errors.
#[derive(Debug)]
pub enum BackupError {
    /// Folder root does not exist or is not readable as a directory
    Scan {
        /// The folder that could not be scanned
        folder: PathBuf,
        /// Underlying reason
        reason: String,
    },
    /// Backup requested for a folder that was never initialized
    SnapshotMissing {
        /// The folder lacking a snapshot
        folder: PathBuf,
    },
    /// Atomic snapshot commit failed
    SnapshotWrite {
        /// The folder whose snapshot could not be written
        folder: PathBuf,
        /// Underlying reason
        reason: String,
    },
    /// Source file vanished or became unreadable while staging
    Copy {
        /// The source path that failed to copy
        path: PathBuf,
        /// Underlying reason
        reason: String,
    },
    /// Registry bookkeeping violation (duplicate add, remove of untracked)
    Registry(String),
}

impl BackupError {
    /// Get a short description of the error category.
    #[must_use]
    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::Scan { .. } => "Scan Error",
            Self::SnapshotMissing { .. } => "Snapshot Missing",
            Self::SnapshotWrite { .. } => "Snapshot Write Error",
            Self::Copy { .. } => "Copy Error",
            Self::Registry(_) => "Registry Error",
        }
    }

    /// Whether a retry of the same run could succeed without user action.
    ///
    /// `SnapshotMissing` and `Registry` need the user to change something
    /// first; the I/O categories may be transient.
    #[must_use]
    pub const fn should_retry(&self) -> bool {
        matches!(
            self,
            Self::Scan { .. } | Self::SnapshotWrite { .. } | Self::Copy { .. }
        )
    }
}

impl fmt::Display for BackupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scan { folder, reason } => {
                write!(f, "Failed to scan {}: {reason}", folder.display())
            }
            Self::SnapshotMissing { folder } => {
                write!(
                    f,
                    "No snapshot for {} (run 'bbud init' for this folder first)",
                    folder.display()
                )
            }
            Self::SnapshotWrite { folder, reason } => {
                write!(
                    f,
                    "Failed to commit snapshot for {}: {reason}",
                    folder.display()
                )
            }
            Self::Copy { path, reason } => {
                write!(f, "Failed to copy {}: {reason}", path.display())
            }
            Self::Registry(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for BackupError {}
