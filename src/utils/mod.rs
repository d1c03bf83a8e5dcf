//! Utility functions and helpers.
//!
//! This module provides a collection of utility functions used throughout
//! backupbuddy:
//!
//! - Path manipulation (tilde expansion, parent creation)
//! - Ignore pattern matching
//! - File size formatting
//! - Timestamp utilities
//!
//! # Submodules
//!
//! - [`serialization`]: Binary serialization

/// Binary serialization utilities
pub mod serialization;

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Expands a path starting with `~` to the user's home directory.
///
/// # Errors
///
/// Returns an error if the path is empty.
pub fn expand_tilde(path: &str) -> Result<PathBuf> {
    if path.is_empty() {
        anyhow::bail!("Path cannot be empty");
    }
    if path.starts_with("~/")
        && let Some(home) = dirs::home_dir()
    {
        return Ok(home.join(&path[2..]));
    }
    Ok(PathBuf::from(path))
}

/// Resolves a user-supplied folder argument to an absolute path.
///
/// Tilde is expanded; relative paths resolve against the current working
/// directory. The path is not canonicalized, so symlinked locations keep
/// the spelling the user tracked them under.
///
/// # Errors
///
/// Returns an error if the path is empty or the current directory cannot be
/// determined.
pub fn resolve_folder_path(raw: &str) -> Result<PathBuf> {
    let expanded = expand_tilde(raw)?;
    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        Ok(std::env::current_dir()?.join(expanded))
    }
}

/// Ensures parent directories exist for a given path.
///
/// # Errors
///
/// Returns an error if the parent directories cannot be created.
pub fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Determines if a given path should be ignored based on provided patterns.
///
/// Supported pattern forms: `name/` (directory component), `*suffix`,
/// `prefix*`, `*contains*`, and exact component or full-path matches.
#[must_use]
pub fn should_ignore(path: &Path, patterns: &[String]) -> bool {
    let path_str = path.to_string_lossy();

    for pattern in patterns {
        if let Some(dir_name) = pattern.strip_suffix('/') {
            // Directory pattern: match any path component
            if path.components().any(|c| c.as_os_str() == dir_name) {
                return true;
            }
        } else if pattern.starts_with('*') && pattern.ends_with('*') && pattern.len() > 1 {
            let search = &pattern[1..pattern.len() - 1];
            if path_str.contains(search) {
                return true;
            }
        } else if let Some(suffix) = pattern.strip_prefix('*') {
            if path_str.ends_with(suffix) {
                return true;
            }
        } else if let Some(prefix) = pattern.strip_suffix('*') {
            if path_str.starts_with(prefix) {
                return true;
            }
        } else if path_str == pattern.as_str()
            || path.components().any(|c| c.as_os_str() == pattern.as_str())
        {
            return true;
        }
    }

    false
}

/// Formats a file size in bytes into a human-readable string.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn format_size(size: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = size as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", size.round() as u64, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}

/// Converts a filesystem modification time to seconds since the Unix epoch.
///
/// Timestamp resolution is whatever the platform's filesystem provides;
/// pre-epoch times clamp to zero.
#[must_use]
pub fn system_time_to_unix(time: SystemTime) -> i64 {
    time.duration_since(std::time::UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Returns the current timestamp as seconds since the Unix epoch.
#[must_use]
pub fn get_current_timestamp() -> i64 {
    system_time_to_unix(SystemTime::now())
}

/// Directory name for a new transfer package, from the current local time.
///
/// Microsecond suffix keeps names unique when runs start within one second.
#[must_use]
pub fn package_dir_name() -> String {
    chrono::Local::now()
        .format("%Y_%m_%d__%H_%M_%S__%6f")
        .to_string()
}
