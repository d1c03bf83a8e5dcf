#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]
// Allow pedantic strict lints that create false positives in this codebase
#![allow(clippy::arithmetic_side_effects)] // Simple counters and size sums cannot overflow
#![allow(clippy::indexing_slicing)] // Bounds checked by logic

//! # BackupBuddy - Snapshot-Diff Backup Staging
//!
//! BackupBuddy tracks user-chosen folders per backup location, detects what
//! changed since the last snapshot, and stages a transfer package (additions
//! plus deletion manifests) that the user copies to the destination by hand.
//!
//! ## Features
//!
//! - **Metadata Snapshots**: Folder state is captured as relative path, size
//!   and mtime records with bincode serialization
//! - **Cheap Diffs**: Added/modified/deleted classification from metadata
//!   alone, no content hashing
//! - **Atomic Commits**: Snapshots are replaced via temp-file-then-rename, so
//!   an interrupted run never corrupts stored state
//! - **Parallel Scanning**: Uses Rayon to scan independent folders
//!   concurrently
//! - **Deletion Manifests**: Plain-text per-folder lists consumed by the
//!   `apply-deletions` pass on the destination side
//!
//! ## Architecture
//!
//! The codebase is organized into several key modules:
//!
//! - [`commands`]: Command implementations (add, rm, init, backup, ...)
//! - [`registry`]: Tracked-folder bookkeeping per backup location
//! - [`scanner`]: Folder tree enumeration into file records
//! - [`snapshot`]: Snapshot data model and atomic on-disk store
//! - [`diff`]: Snapshot-vs-listing changeset computation
//! - [`transfer`]: Transfer package staging (additions + manifests)
//! - [`config`]: Configuration parsing and defaults
//! - [`utils`]: Utility functions and helpers
//!
//! ## Example Usage
//!
//! ```no_run
//! use backupbuddy::BackupContext;
//!
//! # fn main() -> anyhow::Result<()> {
//! let ctx = BackupContext::new()?;
//!
//! // Track folders under a location, seed snapshots, then stage a backup
//! backupbuddy::commands::add::execute(&ctx, "usb-drive", &["~/Documents".to_string()])?;
//! backupbuddy::commands::init::execute(&ctx, "usb-drive", &[])?;
//! backupbuddy::commands::backup::execute(&ctx, "usb-drive")?;
//! # Ok(())
//! # }
//! ```

/// Commands module containing all CLI command implementations.
pub mod commands;

/// Configuration parsing and management.
pub mod config;

/// Changeset computation between a snapshot and a current listing.
pub mod diff;

/// Categorized error types for the backup engine.
pub mod errors;

/// Run locking to prevent concurrent operations on a location.
pub mod lock;

/// Tracked-folder registry per backup location.
pub mod registry;

/// Folder tree scanning into file records.
pub mod scanner;

/// Snapshot data model and atomic persistence.
pub mod snapshot;

/// Transfer package staging (additions tree + deletion manifests).
pub mod transfer;

/// Utility functions and helpers.
pub mod utils;

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Current version of the backupbuddy binary.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default backups root directory name within the home directory.
pub const DEFAULT_BACKUPS_DIR: &str = "backups";

/// Default configuration file path relative to home directory.
pub const DEFAULT_CONFIG_PATH: &str = ".config/backupbuddy/config";

/// Name of the per-location registry file.
pub const REGISTRY_FILE: &str = "registry.bin";

/// Directory name for per-location persistent state.
pub const STATE_DIR: &str = "state";

/// Directory name for folder snapshots inside the state directory.
pub const SNAPSHOTS_DIR: &str = "snapshots";

/// Directory name for advisory lock files inside a location.
pub const LOCKS_DIR: &str = "locks";

/// Directory name for the staged payload inside a transfer package.
pub const TO_TRANSFER_DIR: &str = "to_transfer";

/// Directory name for added/modified file copies inside `to_transfer`.
pub const ADDITIONS_DIR: &str = "additions";

/// Suffix of per-folder deletion manifest files.
pub const DELETED_PATHS_SUFFIX: &str = "_deleted_paths.txt";

/// Name of the plain-text log written into each transfer package.
pub const RUN_LOG_FILE: &str = "run.log";

/// Central context for all BackupBuddy operations.
///
/// Holds the backups root and loaded configuration needed for executing
/// commands. Per-location paths (registry, snapshots, locks, packages) all
/// derive from here.
///
/// # Examples
///
/// ```no_run
/// use backupbuddy::BackupContext;
///
/// # fn main() -> anyhow::Result<()> {
/// // Create context with default paths
/// let ctx = BackupContext::new()?;
///
/// // Create context with custom paths (for testing)
/// let ctx = BackupContext::new_explicit(
///     "/tmp/test_backups".into(),
///     "/tmp/test_config".into()
/// )?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BackupContext {
    /// Root directory holding one subdirectory per backup location.
    pub backups_root: PathBuf,

    /// Path to the configuration file.
    pub config_path: PathBuf,

    /// Loaded configuration settings.
    pub config: config::Config,
}

impl BackupContext {
    /// Creates a new `BackupContext` by loading the configuration from the
    /// default path.
    ///
    /// # Errors
    /// Returns an error if the home directory cannot be determined or if the
    /// configuration file cannot be read or created.
    pub fn new() -> Result<Self> {
        // Check environment variable for config path first
        let config_path = if let Ok(path) = std::env::var("BACKUPBUDDY_CONFIG_PATH") {
            PathBuf::from(path)
        } else {
            let home = dirs::home_dir().context("Could not find home directory")?;
            home.join(DEFAULT_CONFIG_PATH)
        };

        let config = config::Config::load(&config_path)?;

        // Allow environment variable to override the configured backups root
        let backups_root = if let Ok(path) = std::env::var("BACKUPBUDDY_ROOT") {
            PathBuf::from(path)
        } else {
            config.core.backups_root.clone()
        };

        Ok(Self {
            backups_root,
            config_path,
            config,
        })
    }

    /// Creates a new `BackupContext` with explicit paths, bypassing
    /// environment lookups. Used by tests and scripting.
    ///
    /// # Errors
    /// Returns an error if the configuration cannot be loaded or created.
    pub fn new_explicit(backups_root: PathBuf, config_path: PathBuf) -> Result<Self> {
        let config = if config_path.exists() {
            config::Config::load(&config_path)?
        } else {
            let mut config = config::Config::default();
            config.core.backups_root.clone_from(&backups_root);

            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            config.save(&config_path)?;
            config
        };

        Ok(Self {
            backups_root,
            config_path,
            config,
        })
    }

    /// Directory owning all state for one backup location.
    #[must_use]
    pub fn location_dir(&self, location: &str) -> PathBuf {
        self.backups_root.join(location)
    }

    /// Path to a location's registry record.
    #[must_use]
    pub fn registry_path(&self, location: &str) -> PathBuf {
        self.location_dir(location).join(REGISTRY_FILE)
    }

    /// Directory holding a location's folder snapshots.
    #[must_use]
    pub fn snapshots_dir(&self, location: &str) -> PathBuf {
        self.location_dir(location)
            .join(STATE_DIR)
            .join(SNAPSHOTS_DIR)
    }

    /// Directory holding a location's advisory lock files.
    #[must_use]
    pub fn locks_dir(&self, location: &str) -> PathBuf {
        self.location_dir(location).join(LOCKS_DIR)
    }

    /// Checks if a location has been set up (has a registry record).
    #[must_use]
    pub fn location_exists(&self, location: &str) -> bool {
        self.registry_path(location).exists()
    }

    /// Ensures that a location's directory structure exists.
    ///
    /// # Errors
    /// Returns an error if the directories cannot be created.
    pub fn ensure_location_exists(&self, location: &str) -> Result<()> {
        let dir = self.location_dir(location);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create location directory: {}", dir.display()))?;
        std::fs::create_dir_all(self.snapshots_dir(location))
            .context("Failed to create snapshots directory")?;
        std::fs::create_dir_all(self.locks_dir(location))
            .context("Failed to create locks directory")?;
        Ok(())
    }
}

/// Validates a backup location identifier.
///
/// Location names become directory names under the backups root, so path
/// separators and traversal components are rejected.
///
/// # Errors
/// Returns an error if the name is empty or contains a path separator.
pub fn validate_location(location: &str) -> Result<()> {
    if location.is_empty() {
        anyhow::bail!("Backup location name cannot be empty");
    }
    if location.contains('/') || location.contains('\\') || location == "." || location == ".." {
        anyhow::bail!("Invalid backup location name: {location}");
    }
    Ok(())
}
