//! Folder tree scanning into file records.
//!
//! The scanner enumerates every regular file under a tracked folder root and
//! produces one [`FileRecord`] per file, with the path relative to the root.
//! Directories contribute no records, so empty directories are invisible to
//! snapshots. Symlinks are skipped unless `follow_symlinks` is set; the
//! chosen policy applies uniformly to a whole run.
//!
//! An unreadable root fails the scan outright. Individual entries that fail
//! mid-walk (permission errors, files vanishing between enumeration and
//! stat) are collected and reported without aborting the rest of the scan.

use crate::config::ScanConfig;
use crate::errors::BackupError;
use crate::snapshot::FileRecord;
use crate::utils::{should_ignore, system_time_to_unix};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// A file the scanner listed but could not fully read metadata for.
#[derive(Debug, Clone)]
pub struct SkippedFile {
    /// Path of the entry that failed
    pub path: PathBuf,
    /// Why it was skipped
    pub reason: String,
}

/// Result of scanning one folder: the current listing plus any per-file
/// failures encountered along the way.
#[derive(Debug, Clone)]
pub struct Listing {
    /// The scanned folder root
    pub root: PathBuf,
    /// One record per readable regular file
    pub records: Vec<FileRecord>,
    /// Entries skipped because of per-file errors
    pub skipped: Vec<SkippedFile>,
}

/// Scanner for enumerating regular files under tracked folder roots.
pub struct FolderScanner {
    /// Patterns to exclude during scanning
    ignore_patterns: Vec<String>,
    /// Whether to follow symbolic links
    follow_symlinks: bool,
}

impl FolderScanner {
    /// Create a scanner with explicit settings.
    #[must_use]
    pub const fn new(ignore_patterns: Vec<String>, follow_symlinks: bool) -> Self {
        Self {
            ignore_patterns,
            follow_symlinks,
        }
    }

    /// Create a scanner from the scan section of the configuration.
    #[must_use]
    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new(config.ignore_patterns.clone(), config.follow_symlinks)
    }

    /// Scan a folder and return its current listing.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::Scan`] if the root does not exist, is not a
    /// directory, or cannot be opened at all. Per-file failures land in
    /// [`Listing::skipped`] instead.
    pub fn scan(&self, root: &Path) -> Result<Listing, BackupError> {
        if !root.exists() {
            return Err(BackupError::Scan {
                folder: root.to_path_buf(),
                reason: "folder does not exist".to_string(),
            });
        }
        if !root.is_dir() {
            return Err(BackupError::Scan {
                folder: root.to_path_buf(),
                reason: "not a directory".to_string(),
            });
        }
        // Surface an unreadable root as a scan failure rather than an empty
        // listing, which would diff as "everything deleted"
        if let Err(e) = std::fs::read_dir(root) {
            return Err(BackupError::Scan {
                folder: root.to_path_buf(),
                reason: e.to_string(),
            });
        }

        let mut records = Vec::new();
        let mut skipped = Vec::new();

        for entry in WalkDir::new(root)
            .follow_links(self.follow_symlinks)
            .into_iter()
            .filter_entry(|e| {
                let relative = e.path().strip_prefix(root).unwrap_or(e.path());
                !should_ignore(relative, &self.ignore_patterns)
            })
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| root.to_path_buf(), Path::to_path_buf);
                    skipped.push(SkippedFile {
                        path,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let relative_path = match entry.path().strip_prefix(root) {
                Ok(rel) => rel.to_path_buf(),
                Err(e) => {
                    skipped.push(SkippedFile {
                        path: entry.path().to_path_buf(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            match entry.metadata() {
                Ok(metadata) => {
                    let modified = metadata
                        .modified()
                        .map_or(0, system_time_to_unix);
                    records.push(FileRecord {
                        relative_path,
                        size: metadata.len(),
                        modified,
                    });
                }
                Err(e) => {
                    skipped.push(SkippedFile {
                        path: entry.path().to_path_buf(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        debug!(
            root = %root.display(),
            files = records.len(),
            skipped = skipped.len(),
            "scan complete"
        );

        Ok(Listing {
            root: root.to_path_buf(),
            records,
            skipped,
        })
    }

    /// Scan several independent folders, optionally in parallel.
    ///
    /// Folders share no mutable state, so fan-out is safe; results come
    /// back in input order either way.
    #[must_use]
    pub fn scan_many(
        &self,
        folders: &[PathBuf],
        parallel: bool,
    ) -> Vec<(PathBuf, Result<Listing, BackupError>)> {
        if parallel {
            folders
                .par_iter()
                .map(|folder| (folder.clone(), self.scan(folder)))
                .collect()
        } else {
            folders
                .iter()
                .map(|folder| (folder.clone(), self.scan(folder)))
                .collect()
        }
    }
}
