//! Transfer package staging.
//!
//! A transfer package is the on-disk bundle the user manually copies to the
//! backup destination:
//!
//! ```text
//! <backups_root>/<location>/<timestamp>/
//!     to_transfer/
//!         additions/<folderName>/<relativePath...>   byte-identical copies
//!         <folderName>_deleted_paths.txt             one relative path per line
//!     run.log
//! ```
//!
//! Staging reads source files and writes only under the package directory;
//! the destination is never touched. Applying the deletion manifests on the
//! destination side is the `apply-deletions` command's job.

use crate::diff::Changeset;
use crate::errors::BackupError;
use crate::utils::{ensure_parent_dirs, package_dir_name};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Result of staging one folder's changeset into the package.
#[derive(Debug, Default)]
pub struct StageOutcome {
    /// Files successfully copied into the additions tree
    pub copied: usize,
    /// Total bytes copied
    pub bytes_copied: u64,
    /// Copy failures; any entry here blocks the folder's snapshot commit
    pub copy_errors: Vec<BackupError>,
}

impl StageOutcome {
    /// Whether every file copy succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.copy_errors.is_empty()
    }
}

/// One timestamped transfer package under a location directory.
pub struct TransferPackage {
    /// Package root (the timestamped directory)
    root: PathBuf,
}

impl TransferPackage {
    /// Create a new timestamped package under a location directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the package directories cannot be created.
    pub fn create(location_dir: &Path) -> Result<Self> {
        let root = location_dir.join(package_dir_name());
        Self::create_at(root)
    }

    /// Create a package at an explicit root. Exposed for tests that need a
    /// predictable path.
    ///
    /// # Errors
    ///
    /// Returns an error if the package directories cannot be created.
    pub fn create_at(root: PathBuf) -> Result<Self> {
        let to_transfer = root.join(crate::TO_TRANSFER_DIR);
        std::fs::create_dir_all(&to_transfer).with_context(|| {
            format!("Failed to create package directory: {}", to_transfer.display())
        })?;
        Ok(Self { root })
    }

    /// Package root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The `to_transfer` payload directory.
    #[must_use]
    pub fn to_transfer_dir(&self) -> PathBuf {
        self.root.join(crate::TO_TRANSFER_DIR)
    }

    /// Additions subtree for a folder.
    #[must_use]
    pub fn additions_dir(&self, folder_name: &str) -> PathBuf {
        self.to_transfer_dir()
            .join(crate::ADDITIONS_DIR)
            .join(folder_name)
    }

    /// Deletion manifest path for a folder.
    #[must_use]
    pub fn manifest_path(&self, folder_name: &str) -> PathBuf {
        self.to_transfer_dir()
            .join(format!("{folder_name}{}", crate::DELETED_PATHS_SUFFIX))
    }

    /// Stage one folder's changeset: copy added/modified files into the
    /// additions tree and write the deletion manifest.
    ///
    /// Copy failures are collected per file and returned in the outcome
    /// rather than aborting the folder; the caller must withhold the
    /// snapshot commit when the outcome is not clean.
    ///
    /// # Errors
    ///
    /// Returns an error if the package structure itself cannot be written
    /// (directories, manifest file). Per-file copy failures never error.
    pub fn stage_folder(
        &self,
        folder_root: &Path,
        folder_name: &str,
        changeset: &Changeset,
    ) -> Result<StageOutcome> {
        let additions_root = self.additions_dir(folder_name);
        let mut outcome = StageOutcome::default();

        for record in changeset.files_to_copy() {
            let source = folder_root.join(&record.relative_path);
            let destination = additions_root.join(&record.relative_path);

            let copy_result = ensure_parent_dirs(&destination)
                .map_err(|e| e.to_string())
                .and_then(|()| std::fs::copy(&source, &destination).map_err(|e| e.to_string()));

            match copy_result {
                Ok(bytes) => {
                    outcome.copied += 1;
                    outcome.bytes_copied += bytes;
                    debug!(
                        source = %source.display(),
                        destination = %destination.display(),
                        "staged file"
                    );
                }
                Err(reason) => {
                    outcome.copy_errors.push(BackupError::Copy {
                        path: source,
                        reason,
                    });
                }
            }
        }

        self.write_manifest(folder_name, &changeset.deleted)?;

        Ok(outcome)
    }

    /// Write the deletion manifest for a folder: one relative path per line,
    /// newline-terminated, no quoting or escaping. Written even when empty
    /// so the destination pass sees every folder explicitly.
    fn write_manifest(&self, folder_name: &str, deleted: &[PathBuf]) -> Result<()> {
        let path = self.manifest_path(folder_name);
        let mut file = std::fs::File::create(&path)
            .with_context(|| format!("Failed to create deletion manifest: {}", path.display()))?;

        for relative_path in deleted {
            writeln!(file, "{}", relative_path.display())
                .with_context(|| format!("Failed to write deletion manifest: {}", path.display()))?;
        }

        Ok(())
    }

    /// Write the plain-text run log into the package root.
    ///
    /// # Errors
    ///
    /// Returns an error if the log file cannot be written.
    pub fn write_run_log(&self, contents: &str) -> Result<()> {
        let path = self.root.join(crate::RUN_LOG_FILE);
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write run log: {}", path.display()))
    }
}
