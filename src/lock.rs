//! Run locking to prevent concurrent operations on the same backup location.
//!
//! Registry edits, snapshot seeding and backup runs all mutate a location's
//! on-disk state, so only one may run at a time per location. Locks are
//! advisory file locks, automatically released when dropped.

use anyhow::{Context, Result, bail};
use fs4::fs_std::FileExt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

/// Types of operations that take the location lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
    /// Full backup run (scan, diff, stage, commit)
    Backup,
    /// Snapshot seeding
    Init,
    /// Registry mutation (add/remove folders)
    Registry,
}

impl OperationType {
    /// Get the string representation of the operation type
    const fn as_str(self) -> &'static str {
        match self {
            Self::Backup => "backup",
            Self::Init => "init",
            Self::Registry => "registry",
        }
    }
}

/// Holds an exclusive lock on a backup location.
///
/// The lock is automatically released when this struct is dropped.
pub struct RunLock {
    /// Lock file handle
    lock_file: File,
    /// Path to the lock file (for error messages)
    lock_path: PathBuf,
}

impl RunLock {
    /// Acquire the exclusive lock for an operation on a location.
    ///
    /// # Arguments
    ///
    /// * `locks_dir` - The location's lock directory
    /// * `operation` - Type of operation being performed
    /// * `location` - Name of the backup location
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Cannot create the locks directory
    /// - Another operation holds the lock past the timeout
    pub fn acquire(locks_dir: &Path, operation: OperationType, location: &str) -> Result<Self> {
        fs::create_dir_all(locks_dir).context("Failed to create locks directory")?;

        // Clean up stale locks before attempting to acquire
        Self::cleanup_stale_locks(locks_dir)?;

        // One lock per location - every mutating operation contends on it
        let lock_path = locks_dir.join(format!("{location}.lock"));
        let lock_file = Self::try_acquire_lock(&lock_path, operation, location)?;

        Ok(Self {
            lock_file,
            lock_path,
        })
    }

    /// Try to acquire the lock file
    fn try_acquire_lock(lock_path: &Path, operation: OperationType, location: &str) -> Result<File> {
        // Use shorter timeouts in test mode for faster test execution
        let lock_timeout = if cfg!(test) {
            Duration::from_millis(100)
        } else {
            Duration::from_secs(30)
        };
        let retry_interval = if cfg!(test) {
            Duration::from_millis(10)
        } else {
            Duration::from_millis(100)
        };

        let start = Instant::now();

        loop {
            let file = File::create(lock_path)
                .with_context(|| format!("Failed to create lock file: {}", lock_path.display()))?;

            match file.try_lock_exclusive() {
                Ok(true) => {
                    // Write operation info to lock file for debugging
                    use std::io::Write;
                    let mut file_ref = &file;
                    let _ = writeln!(
                        file_ref,
                        "operation={}\nlocation={}\npid={}\ntime={}",
                        operation.as_str(),
                        location,
                        std::process::id(),
                        humantime::format_rfc3339(SystemTime::now())
                    );
                    return Ok(file);
                }
                Ok(false) | Err(_) if start.elapsed() < lock_timeout => {
                    // Lock held by another process, wait and retry
                    std::thread::sleep(retry_interval);
                }
                Ok(false) | Err(_) => {
                    bail!(
                        "Another {} operation is already running for location '{}'. \
                         Please wait for it to complete or remove stale lock at: {}",
                        operation.as_str(),
                        location,
                        lock_path.display()
                    );
                }
            }
        }
    }

    /// Clean up stale lock files (older than 5 minutes)
    ///
    /// This handles cases where a process crashed without releasing its lock.
    fn cleanup_stale_locks(locks_dir: &Path) -> Result<()> {
        const STALE_THRESHOLD: Duration = Duration::from_secs(300); // 5 minutes

        if !locks_dir.exists() {
            return Ok(());
        }

        let entries = fs::read_dir(locks_dir).context("Failed to read locks directory")?;

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "lock") {
                continue;
            }

            if let Ok(metadata) = entry.metadata()
                && let Ok(modified) = metadata.modified()
                && let Ok(elapsed) = modified.elapsed()
                && elapsed > STALE_THRESHOLD
            {
                if let Err(e) = fs::remove_file(&path) {
                    eprintln!(
                        "Warning: Failed to remove stale lock {}: {}",
                        path.display(),
                        e
                    );
                }
            }
        }

        Ok(())
    }

    /// Release the lock explicitly (normally handled by Drop)
    ///
    /// # Errors
    ///
    /// Returns an error if the unlock operation fails
    pub fn release(self) -> Result<()> {
        self.lock_file.unlock()?;
        if let Err(e) = fs::remove_file(&self.lock_path) {
            eprintln!(
                "Warning: Failed to remove lock file {}: {}",
                self.lock_path.display(),
                e
            );
        }
        Ok(())
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        let _ = self.lock_file.unlock();

        if let Err(e) = fs::remove_file(&self.lock_path) {
            eprintln!(
                "Warning: Failed to remove lock file during cleanup {}: {}",
                self.lock_path.display(),
                e
            );
        }
    }
}
