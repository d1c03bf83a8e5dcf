//! Tracked-folder registry for a backup location.
//!
//! The registry stores the user's intent: which folders a backup location is
//! responsible for. It is pure bookkeeping — an explicitly passed value with
//! load/save at process boundaries, no ambient singleton. Order of addition
//! is preserved, so listings and backup runs process folders in a stable
//! order.
//!
//! Removing a folder deliberately leaves its snapshot in place. Re-adding
//! the folder later without an explicit re-`init` would diff against that
//! stale snapshot, which is why `init` always rebuilds the snapshots for the
//! folders it is given.

use crate::errors::BackupError;
use crate::utils::serialization;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Current registry format version.
const REGISTRY_VERSION: u32 = 1;

/// Ordered set of folders tracked by one backup location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registry {
    /// Format version for future compatibility
    pub version: u32,
    /// Tracked folders in the order they were added
    folders: Vec<PathBuf>,
}

impl Registry {
    /// Create a new empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            version: REGISTRY_VERSION,
            folders: Vec::new(),
        }
    }

    /// Load the registry record at `path`.
    ///
    /// Returns an empty registry if the file doesn't exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The record fails to deserialize
    /// - The format version is newer than this binary supports
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let data = std::fs::read(path)
            .with_context(|| format!("Failed to read registry: {}", path.display()))?;
        let registry: Self =
            serialization::deserialize(&data).context("Failed to deserialize registry")?;

        if registry.version > REGISTRY_VERSION {
            anyhow::bail!(
                "Registry version {} is newer than supported version {}. Please upgrade backupbuddy.",
                registry.version,
                REGISTRY_VERSION
            );
        }

        Ok(registry)
    }

    /// Save the registry record to `path`.
    ///
    /// Callers hold the location's run lock across load-modify-save, so a
    /// plain write is sufficient here.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Serialization fails
    /// - The file cannot be written
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let data = serialization::serialize(self).context("Failed to serialize registry")?;
        std::fs::write(path, data)
            .with_context(|| format!("Failed to write registry: {}", path.display()))?;

        Ok(())
    }

    /// Track additional folders.
    ///
    /// All-or-nothing: every path is validated before any is inserted.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::Registry`] if any path is already tracked or
    /// appears twice in the request.
    pub fn add_folders(&mut self, paths: &[PathBuf]) -> Result<(), BackupError> {
        for (i, path) in paths.iter().enumerate() {
            if self.folders.contains(path) || paths[..i].contains(path) {
                return Err(BackupError::Registry(format!(
                    "Folder already tracked: {}",
                    path.display()
                )));
            }
        }

        self.folders.extend_from_slice(paths);
        Ok(())
    }

    /// Stop tracking folders.
    ///
    /// All-or-nothing: every path is validated before any is removed. The
    /// folders' snapshots are not touched.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::Registry`] if any path is not tracked.
    pub fn remove_folders(&mut self, paths: &[PathBuf]) -> Result<(), BackupError> {
        for path in paths {
            if !self.folders.contains(path) {
                return Err(BackupError::Registry(format!(
                    "Folder not tracked: {}",
                    path.display()
                )));
            }
        }

        self.folders.retain(|f| !paths.contains(f));
        Ok(())
    }

    /// The tracked folders, in the order they were added.
    #[must_use]
    pub fn folders(&self) -> &[PathBuf] {
        &self.folders
    }

    /// Whether a folder is tracked.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.folders.iter().any(|f| f == path)
    }

    /// Whether no folders are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }

    /// Number of tracked folders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.folders.len()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
