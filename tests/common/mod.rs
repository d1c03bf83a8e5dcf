use anyhow::Result;
use backupbuddy::BackupContext;
use std::path::PathBuf;
use tempfile::TempDir;

/// Test fixture providing an isolated backups root plus source folders.
pub struct TestRepo {
    pub temp_dir: TempDir,
    pub ctx: BackupContext,
}

impl TestRepo {
    /// Create a fresh context under a temporary directory.
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let backups_root = temp_dir.path().join("backups");
        let config_path = temp_dir.path().join(".config/backupbuddy/config");

        let ctx = BackupContext::new_explicit(backups_root, config_path)?;

        Ok(Self { temp_dir, ctx })
    }

    /// Create a source folder (outside the backups root) to track.
    pub fn source_dir(&self, name: &str) -> Result<PathBuf> {
        let dir = self.temp_dir.path().join("sources").join(name);
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// The single transfer package created under a location, assuming
    /// exactly one backup run has happened.
    pub fn only_package(&self, location: &str) -> Result<PathBuf> {
        let packages = self.packages(location)?;
        assert_eq!(packages.len(), 1, "expected exactly one transfer package");
        Ok(packages.into_iter().next().unwrap())
    }

    /// All transfer package roots under a location, oldest first.
    pub fn packages(&self, location: &str) -> Result<Vec<PathBuf>> {
        let location_dir = self.ctx.location_dir(location);
        let mut packages = Vec::new();
        for entry in std::fs::read_dir(&location_dir)? {
            let path = entry?.path();
            if path.is_dir() && path.join(backupbuddy::TO_TRANSFER_DIR).exists() {
                packages.push(path);
            }
        }
        packages.sort();
        Ok(packages)
    }
}
