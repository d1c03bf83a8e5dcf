//! Property-based tests for the diff engine and snapshot store.

use backupbuddy::diff::diff;
use backupbuddy::snapshot::{FileRecord, Snapshot, SnapshotStore};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

/// Arbitrary listings: unique relative paths with arbitrary metadata.
fn records_strategy() -> impl Strategy<Value = Vec<FileRecord>> {
    prop::collection::hash_map(
        "[a-z]{1,8}(/[a-z]{1,8}){0,2}",
        (0u64..1_000_000u64, 0i64..2_000_000_000i64),
        0..32,
    )
    .prop_map(|m| {
        m.into_iter()
            .map(|(path, (size, modified))| FileRecord {
                relative_path: PathBuf::from(path),
                size,
                modified,
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn diff_of_identical_state_is_empty(records in records_strategy()) {
        let snapshot = Snapshot::from_records(PathBuf::from("/data"), records.clone());
        let changeset = diff(&snapshot, &records);
        prop_assert!(changeset.is_empty());
    }

    #[test]
    fn diff_partitions_paths_correctly(
        previous in records_strategy(),
        current in records_strategy(),
    ) {
        let snapshot = Snapshot::from_records(PathBuf::from("/data"), previous.clone());
        let changeset = diff(&snapshot, &current);

        let prev_paths: HashSet<PathBuf> =
            previous.iter().map(|r| r.relative_path.clone()).collect();
        let cur_paths: HashSet<PathBuf> =
            current.iter().map(|r| r.relative_path.clone()).collect();

        // Added paths are exactly those new in the current listing
        let added: HashSet<PathBuf> = changeset
            .added
            .iter()
            .map(|r| r.relative_path.clone())
            .collect();
        let expected_added: HashSet<PathBuf> =
            cur_paths.difference(&prev_paths).cloned().collect();
        prop_assert_eq!(added, expected_added);

        // Deleted paths are exactly those gone from the current listing
        let deleted: HashSet<PathBuf> = changeset.deleted.iter().cloned().collect();
        let expected_deleted: HashSet<PathBuf> =
            prev_paths.difference(&cur_paths).cloned().collect();
        prop_assert_eq!(deleted, expected_deleted);

        // Modified paths exist on both sides and differ in metadata
        let prev_map: HashMap<&PathBuf, &FileRecord> =
            previous.iter().map(|r| (&r.relative_path, r)).collect();
        for record in &changeset.modified {
            let prev = prev_map
                .get(&record.relative_path)
                .expect("modified path must exist in previous snapshot");
            prop_assert!(prev.size != record.size || prev.modified != record.modified);
        }
    }

    #[test]
    fn deleted_paths_never_come_from_nowhere(current in records_strategy()) {
        // Diffing against an empty snapshot can only yield additions
        let empty = Snapshot::new(PathBuf::from("/data"));
        let changeset = diff(&empty, &current);
        prop_assert!(changeset.deleted.is_empty());
        prop_assert!(changeset.modified.is_empty());
        prop_assert_eq!(changeset.added.len(), current.len());
    }

    #[test]
    fn snapshot_store_round_trips(records in records_strategy()) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SnapshotStore::new(dir.path().to_path_buf());
        let folder = PathBuf::from("/data/docs");

        let snapshot = Snapshot::from_records(folder.clone(), records);
        store.save(&folder, &snapshot).expect("save");

        let loaded = store
            .load(&folder)
            .expect("load")
            .expect("snapshot present");

        // Order-independent equality over the record set
        prop_assert_eq!(loaded.records, snapshot.records);
        prop_assert_eq!(loaded.root, snapshot.root);
    }
}
