//! Snapshot data model and atomic on-disk store.
//!
//! A snapshot records one tracked folder's state as of the last `init` or
//! successful backup: one [`FileRecord`] per regular file, keyed by path
//! relative to the folder root. Records carry no location-specific prefixes,
//! so they stay portable between the source tree and any destination.
//!
//! Snapshots are replaced whole, never patched. [`SnapshotStore::save`]
//! writes through a temporary file and renames it over the target, so a
//! crash mid-write leaves either the old snapshot or the new one on disk —
//! a half-written file can never be loaded as valid state.

use crate::utils::serialization;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use xxhash_rust::xxh3::xxh3_64;

/// Current snapshot format version.
const SNAPSHOT_VERSION: u32 = 1;

/// Metadata for one regular file inside a tracked folder.
///
/// `modified` is seconds since the Unix epoch at whatever resolution the
/// filesystem reports. Equality of `size` and `modified` is what the diff
/// engine treats as "unchanged".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Path relative to the tracked folder root
    pub relative_path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Unix timestamp of last modification
    pub modified: i64,
}

/// Captured state of one tracked folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Format version for future compatibility
    pub version: u32,
    /// Absolute path of the folder this snapshot describes
    pub root: PathBuf,
    /// File records keyed by relative path
    pub records: HashMap<PathBuf, FileRecord>,
}

impl Snapshot {
    /// Create an empty snapshot for a folder.
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            root,
            records: HashMap::new(),
        }
    }

    /// Build a snapshot from a scanned listing.
    ///
    /// Relative paths are unique within one folder's listing, so a plain
    /// map collect loses nothing.
    #[must_use]
    pub fn from_records(root: PathBuf, records: Vec<FileRecord>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            root,
            records: records
                .into_iter()
                .map(|r| (r.relative_path.clone(), r))
                .collect(),
        }
    }

    /// Number of recorded files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the snapshot records no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up the record for a relative path.
    #[must_use]
    pub fn get(&self, relative_path: &Path) -> Option<&FileRecord> {
        self.records.get(relative_path)
    }
}

/// On-disk store holding one snapshot file per tracked folder.
pub struct SnapshotStore {
    /// Directory holding the snapshot files
    dir: PathBuf,
}

impl SnapshotStore {
    /// Create a store rooted at the given directory.
    #[must_use]
    pub const fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Snapshot file path for a folder.
    ///
    /// The name combines the folder's final component with an XXH3 hash of
    /// the full path, so distinct folders sharing a basename never collide
    /// and the mapping is stable across runs.
    #[must_use]
    pub fn snapshot_path(&self, folder: &Path) -> PathBuf {
        let stem = folder
            .file_name()
            .map_or_else(|| "root".to_string(), |n| n.to_string_lossy().into_owned());
        let hash = xxh3_64(folder.as_os_str().as_encoded_bytes());
        self.dir.join(format!("{stem}-{hash:016x}.bin"))
    }

    /// Whether a snapshot exists for a folder.
    #[must_use]
    pub fn contains(&self, folder: &Path) -> bool {
        self.snapshot_path(folder).exists()
    }

    /// Load the snapshot for a folder.
    ///
    /// Returns `Ok(None)` when the folder has never been initialized.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The snapshot file cannot be read
    /// - The data fails to deserialize (corrupt or truncated file)
    /// - The format version is newer than this binary supports
    pub fn load(&self, folder: &Path) -> Result<Option<Snapshot>> {
        let path = self.snapshot_path(folder);
        if !path.exists() {
            return Ok(None);
        }

        let data = std::fs::read(&path)
            .with_context(|| format!("Failed to read snapshot file: {}", path.display()))?;
        let snapshot: Snapshot = serialization::deserialize(&data)
            .with_context(|| format!("Failed to deserialize snapshot: {}", path.display()))?;

        if snapshot.version > SNAPSHOT_VERSION {
            anyhow::bail!(
                "Snapshot version {} is newer than supported version {}. Please upgrade backupbuddy.",
                snapshot.version,
                SNAPSHOT_VERSION
            );
        }

        Ok(Some(snapshot))
    }

    /// Atomically replace the snapshot for a folder.
    ///
    /// Writes to a temporary file in the store directory, then renames over
    /// the target. This is the commit point of a backup run.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The store directory cannot be created
    /// - Serialization fails
    /// - The temporary file cannot be written or renamed into place
    pub fn save(&self, folder: &Path, snapshot: &Snapshot) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create snapshot directory: {}", self.dir.display()))?;

        let data = serialization::serialize(snapshot).context("Failed to serialize snapshot")?;

        let path = self.snapshot_path(folder);
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)
            .context("Failed to create temporary snapshot file")?;
        tmp.write_all(&data)
            .context("Failed to write temporary snapshot file")?;
        tmp.as_file()
            .sync_all()
            .context("Failed to flush temporary snapshot file")?;
        tmp.persist(&path)
            .with_context(|| format!("Failed to replace snapshot file: {}", path.display()))?;

        tracing::debug!(folder = %folder.display(), records = snapshot.len(), "snapshot committed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(path: &str, size: u64, modified: i64) -> FileRecord {
        FileRecord {
            relative_path: PathBuf::from(path),
            size,
            modified,
        }
    }

    #[test]
    fn test_save_load_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let store = SnapshotStore::new(dir.path().to_path_buf());
        let folder = PathBuf::from("/data/docs");

        let snapshot = Snapshot::from_records(
            folder.clone(),
            vec![
                record("a.txt", 10, 100),
                record("sub/b.txt", 5, 50),
            ],
        );
        store.save(&folder, &snapshot)?;

        let loaded = store.load(&folder)?.expect("snapshot should exist");
        assert_eq!(loaded.root, folder);
        assert_eq!(loaded.records, snapshot.records);

        Ok(())
    }

    #[test]
    fn test_load_missing_is_none() -> Result<()> {
        let dir = tempdir()?;
        let store = SnapshotStore::new(dir.path().to_path_buf());

        assert!(store.load(Path::new("/never/initialized"))?.is_none());
        Ok(())
    }

    #[test]
    fn test_save_replaces_whole_snapshot() -> Result<()> {
        let dir = tempdir()?;
        let store = SnapshotStore::new(dir.path().to_path_buf());
        let folder = PathBuf::from("/data/docs");

        let first = Snapshot::from_records(folder.clone(), vec![record("old.txt", 1, 1)]);
        store.save(&folder, &first)?;

        let second = Snapshot::from_records(folder.clone(), vec![record("new.txt", 2, 2)]);
        store.save(&folder, &second)?;

        let loaded = store.load(&folder)?.expect("snapshot should exist");
        assert_eq!(loaded.len(), 1);
        assert!(loaded.get(Path::new("new.txt")).is_some());
        assert!(loaded.get(Path::new("old.txt")).is_none());

        Ok(())
    }

    #[test]
    fn test_corrupt_snapshot_rejected() -> Result<()> {
        let dir = tempdir()?;
        let store = SnapshotStore::new(dir.path().to_path_buf());
        let folder = PathBuf::from("/data/docs");

        let snapshot = Snapshot::from_records(folder.clone(), vec![record("a.txt", 10, 100)]);
        store.save(&folder, &snapshot)?;

        // Truncate the stored file to simulate a torn write that bypassed
        // the rename protocol
        let path = store.snapshot_path(&folder);
        let data = std::fs::read(&path)?;
        std::fs::write(&path, &data[..data.len() / 2])?;

        assert!(store.load(&folder).is_err());
        Ok(())
    }

    #[test]
    fn test_distinct_folders_same_basename() {
        let store = SnapshotStore::new(PathBuf::from("/state"));
        let a = store.snapshot_path(Path::new("/home/alice/docs"));
        let b = store.snapshot_path(Path::new("/home/bob/docs"));
        assert_ne!(a, b);

        // Stable across calls
        assert_eq!(a, store.snapshot_path(Path::new("/home/alice/docs")));
    }

    #[test]
    fn test_no_temp_files_left_behind() -> Result<()> {
        let dir = tempdir()?;
        let store = SnapshotStore::new(dir.path().to_path_buf());
        let folder = PathBuf::from("/data/docs");

        let snapshot = Snapshot::from_records(folder.clone(), vec![record("a.txt", 10, 100)]);
        store.save(&folder, &snapshot)?;
        store.save(&folder, &snapshot)?;

        let entries = std::fs::read_dir(dir.path())?.count();
        assert_eq!(entries, 1);
        Ok(())
    }
}
