//! Configuration for backupbuddy.
//!
//! Plain TOML with serde defaults. A missing config file is created with
//! defaults on first load, so a fresh install works without any setup.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Core paths
    #[serde(default)]
    pub core: CoreConfig,

    /// Scanner behavior
    #[serde(default)]
    pub scan: ScanConfig,
}

/// Core path configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Root directory under which every backup location keeps its state and
    /// transfer packages.
    #[serde(default = "default_backups_root")]
    pub backups_root: PathBuf,
}

/// Scanner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Patterns excluded from scans (and therefore from snapshots).
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,

    /// Whether to follow symbolic links while scanning. When false (the
    /// default) symlinks contribute no records at all.
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Whether to scan independent tracked folders in parallel.
    #[serde(default = "default_parallel_scan")]
    pub parallel_scan: bool,
}

/// Default backups root under the user's home directory.
fn default_backups_root() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("/tmp"));
    home.join(crate::DEFAULT_BACKUPS_DIR)
}

/// Default scanner exclusions.
fn default_ignore_patterns() -> Vec<String> {
    vec![
        ".git/".to_string(),
        "*.swp".to_string(),
        "*.tmp".to_string(),
        "node_modules/".to_string(),
        "__pycache__/".to_string(),
    ]
}

/// Parallel scanning is on by default.
const fn default_parallel_scan() -> bool {
    true
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            backups_root: default_backups_root(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            ignore_patterns: default_ignore_patterns(),
            follow_symlinks: false,
            parallel_scan: default_parallel_scan(),
        }
    }
}

impl Config {
    /// Load configuration from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Cannot create parent directories for a fresh config
    /// - Cannot read the configuration file
    /// - Configuration file contains invalid TOML
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Save configuration to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Cannot create parent directories
    /// - Cannot write to the file
    /// - TOML serialization fails
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        let mut file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create config file: {}", path.display()))?;
        file.write_all(content.as_bytes())
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_creates_default() -> Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("conf/config");

        let config = Config::load(&path)?;
        assert!(path.exists());
        assert!(!config.scan.follow_symlinks);
        assert!(config.scan.parallel_scan);
        assert!(!config.scan.ignore_patterns.is_empty());

        Ok(())
    }

    #[test]
    fn test_save_load_round_trip() -> Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("config");

        let mut config = Config::default();
        config.core.backups_root = PathBuf::from("/mnt/backups");
        config.scan.follow_symlinks = true;
        config.scan.ignore_patterns = vec!["*.iso".to_string()];
        config.save(&path)?;

        let loaded = Config::load(&path)?;
        assert_eq!(loaded.core.backups_root, PathBuf::from("/mnt/backups"));
        assert!(loaded.scan.follow_symlinks);
        assert_eq!(loaded.scan.ignore_patterns, vec!["*.iso".to_string()]);

        Ok(())
    }

    #[test]
    fn test_partial_config_gets_defaults() -> Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("config");
        std::fs::write(&path, "[core]\nbackups_root = \"/data/bk\"\n")?;

        let loaded = Config::load(&path)?;
        assert_eq!(loaded.core.backups_root, PathBuf::from("/data/bk"));
        assert!(loaded.scan.parallel_scan);

        Ok(())
    }

    #[test]
    fn test_invalid_toml_rejected() -> Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("config");
        std::fs::write(&path, "core = not valid toml [[")?;

        assert!(Config::load(&path).is_err());
        Ok(())
    }
}
